// src/handlers/analyze.rs
use log::{error, info};
use std::sync::Arc;
use warp::http::header::CONTENT_TYPE;
use warp::reply::Json;
use warp::{Rejection, Reply};

use super::error::ApiError;
use crate::services::export::merged_to_csv;
use crate::services::pipeline::{AnalyzeRequest, Analyzer, Level};

pub async fn post_analyze(request: AnalyzeRequest, analyzer: Arc<Analyzer>) -> Result<Json, Rejection> {
    info!("Handling request to analyze {:?}", request.ticker);
    let report = analyzer.run(&request).await;
    Ok(warp::reply::json(&report))
}

pub async fn get_merged_csv(ticker: String, analyzer: Arc<Analyzer>) -> Result<impl Reply, Rejection> {
    info!("Handling CSV export for {}", ticker);
    let report = analyzer.run(&AnalyzeRequest::submit(ticker)).await;

    if report.merged.is_empty() {
        let message = report
            .first_message(Level::Error)
            .or_else(|| report.first_message(Level::Warning))
            .unwrap_or("Nothing to export")
            .to_string();
        return Err(warp::reject::custom(ApiError::unprocessable(message)));
    }

    let body = merged_to_csv(&report.merged).map_err(|e| {
        error!("Failed to build CSV for {}: {}", report.ticker, e);
        warp::reject::custom(ApiError::new(e.to_string()))
    })?;

    let disposition = format!("attachment; filename=\"{}_sentiment.csv\"", report.ticker);
    Ok(warp::reply::with_header(
        warp::reply::with_header(body, CONTENT_TYPE, "text/csv; charset=utf-8"),
        "content-disposition",
        disposition,
    ))
}
