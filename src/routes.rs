// src/routes.rs
use std::sync::Arc;
use warp::reject::Rejection;
use crate::handlers::{analyze::get_merged_csv, analyze::post_analyze, index::get_index};
use crate::services::pipeline::Analyzer;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

const MAX_BODY_BYTES: u64 = 16 * 1024;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found";
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = &api_error.message;
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = "Invalid request body";
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
        message = "Request body too large";
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        code = warp::http::StatusCode::LENGTH_REQUIRED;
        message = "Content-Length required";
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed";
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error";
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(analyzer: Arc<Analyzer>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let analyzer_filter = warp::any().map(move || analyzer.clone());

    let index_route = warp::path::end()
        .and(warp::get())
        .and_then(get_index);

    let analyze_route = warp::path!("api" / "v1" / "analyze")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(analyzer_filter.clone())
        .and_then(post_analyze);

    let csv_route = warp::path!("api" / "v1" / "analyze" / String / "csv")
        .and(warp::get())
        .and(analyzer_filter.clone())
        .and_then(get_merged_csv);

    info!("All routes configured successfully.");

    index_route
        .or(analyze_route)
        .or(csv_route)
        .recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRow;
    use crate::services::test_support::{fixed_scores, StubHeadlines, StubPrices};
    use chrono::NaiveDate;
    use serde_json::Value;

    fn analyzer(news: StubHeadlines, prices: Vec<PriceRow>) -> Arc<Analyzer> {
        Arc::new(Analyzer::new(
            Arc::new(news),
            Arc::new(fixed_scores(&[("Stocks rally", 0.6), ("Markets fear recession", -0.4)])),
            Arc::new(StubPrices::rows(prices)),
            chrono_tz::America::New_York,
        ))
    }

    fn jan_2() -> Vec<PriceRow> {
        vec![PriceRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 106.0,
            low: 99.0,
            close: 105.0,
            volume: 1000,
        }]
    }

    fn two_headlines() -> StubHeadlines {
        StubHeadlines::rows(&[
            ("Jan-02-24", "09:00AM", "Stocks rally"),
            ("", "10:00AM", "Markets fear recession"),
        ])
    }

    #[tokio::test]
    async fn serves_the_page() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request().method("GET").path("/").reply(&api).await;
        assert_eq!(res.status(), 200);
        assert!(String::from_utf8_lossy(res.body()).contains("news-sentiment"));
    }

    #[tokio::test]
    async fn analyze_returns_the_report() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/analyze")
            .json(&serde_json::json!({ "ticker": "AAPL" }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), 200);

        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["status"], "done");
        assert_eq!(body["merged"][0]["date"], "2024-01-02");
        assert_eq!(body["merged"][0]["volume"], 1000);
        assert_eq!(body["headlines"].as_array().unwrap().len(), 2);
        assert!(body["chart_svg"].as_str().unwrap().starts_with("<svg"));
    }

    #[tokio::test]
    async fn failures_are_reported_in_the_body() {
        let news = StubHeadlines::failing(crate::services::error::PipelineError::Parse(
            "No news table found for the ticker.".into(),
        ));
        let api = routes(analyzer(news, jan_2()));
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/analyze")
            .json(&serde_json::json!({ "ticker": "NOPE" }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), 200);

        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["status"], "failed");
        assert_eq!(body["stage"], "scraping");
        assert_eq!(body["messages"][0]["level"], "error");
        assert_eq!(body["messages"][0]["text"], "No news table found for the ticker.");
        assert!(body["chart_svg"].is_null());
    }

    #[tokio::test]
    async fn csv_export_returns_merged_rows() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request()
            .method("GET")
            .path("/api/v1/analyze/AAPL/csv")
            .reply(&api)
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["content-type"], "text/csv; charset=utf-8");
        let body = String::from_utf8_lossy(res.body()).to_string();
        assert!(body.starts_with("date,ticker,mean_sentiment"));
        assert!(body.contains("2024-01-02,AAPL,"));
    }

    #[tokio::test]
    async fn csv_export_without_data_is_unprocessable() {
        let api = routes(analyzer(StubHeadlines::rows(&[]), jan_2()));
        let res = warp::test::request()
            .method("GET")
            .path("/api/v1/analyze/AAPL/csv")
            .reply(&api)
            .await;
        assert_eq!(res.status(), 422);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "No news data found to analyze.");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_as_too_large() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/analyze")
            .header("content-type", "application/json")
            .body(vec![b' '; 20 * 1024])
            .reply(&api)
            .await;
        assert_eq!(res.status(), 413);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "Request body too large");
    }

    #[tokio::test]
    async fn body_without_length_is_rejected() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/analyze")
            .reply(&api)
            .await;
        assert_eq!(res.status(), 411);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "Content-Length required");
    }

    #[tokio::test]
    async fn wrong_method_is_not_allowed() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request().method("GET").path("/api/v1/analyze").reply(&api).await;
        assert_eq!(res.status(), 405);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/analyze")
            .header("content-type", "application/json")
            .body("{\"ticker\": ")
            .reply(&api)
            .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let api = routes(analyzer(two_headlines(), jan_2()));
        let res = warp::test::request().method("GET").path("/api/v1/missing").reply(&api).await;
        assert_eq!(res.status(), 404);
    }
}
