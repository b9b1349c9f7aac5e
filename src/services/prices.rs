// src/services/prices.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate};
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::models::{PriceRow, RawPriceRow};
use super::error::PipelineError;

/// Historical daily bars for a symbol over an inclusive date window.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceRow>, PipelineError>;
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance v8 chart API client.
pub struct YahooPrices {
    client: Client,
    base_url: String,
}

impl YahooPrices {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(YahooPrices { client, base_url: base_url.into() })
    }

    /// Both ends of the window are inclusive: the query runs up to midnight
    /// after `end`.
    pub fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let period1 = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp()).unwrap_or_default();
        let period2 = (end + ChronoDuration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc().timestamp())
            .unwrap_or_default();
        format!(
            "{}{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            urlencoding::encode(symbol),
            period1,
            period2
        )
    }
}

#[async_trait]
impl PriceSource for YahooPrices {
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceRow>, PipelineError> {
        let url = self.chart_url(symbol, start, end);
        info!("Fetching price history from URL: {}", url);

        let body = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }
        .await
        .map_err(|e| {
            error!("Failed to fetch stock price data for {}: {}", symbol, e);
            PipelineError::Transport(format!("Failed to fetch stock price data: {}", e))
        })?;

        let response: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Undecodable chart response for {}: {}", symbol, e);
            PipelineError::Transport(format!("Failed to fetch stock price data: {}", e))
        })?;

        let raw = parse_chart_response(response)?;
        let rows = normalize_prices(raw);
        info!("Fetched {} daily bars for {} ({} to {})", rows.len(), symbol, start, end);
        Ok(rows)
    }
}

/// Turns the chart payload into raw rows, one per timestamp, with the date
/// taken in the exchange's local offset.
pub fn parse_chart_response(response: ChartResponse) -> Result<Vec<RawPriceRow>, PipelineError> {
    if let Some(err) = response.chart.error {
        let detail = match err.description.filter(|d| !d.trim().is_empty()) {
            Some(description) => format!("{}: {}", err.code, description),
            None => err.code,
        };
        return Err(PipelineError::Transport(format!("Failed to fetch stock price data: {}", detail)));
    }

    let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(data) => data,
        None => return Ok(Vec::new()),
    };

    let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let rows = timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| RawPriceRow {
            date: DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()),
            open: quote.open.get(i).copied().flatten(),
            high: quote.high.get(i).copied().flatten(),
            low: quote.low.get(i).copied().flatten(),
            close: quote.close.get(i).copied().flatten(),
            volume: quote.volume.get(i).copied().flatten(),
        })
        .collect();

    Ok(rows)
}

/// Drops duplicate dates (first wins), then rows with any missing field,
/// and sorts ascending by date.
pub fn normalize_prices(raw: Vec<RawPriceRow>) -> Vec<PriceRow> {
    let total = raw.len();
    let mut seen = HashSet::new();
    let mut rows: Vec<PriceRow> = raw
        .into_iter()
        .filter(|r| match r.date {
            Some(date) => seen.insert(date),
            None => true,
        })
        .filter_map(|r| {
            let row = PriceRow {
                date: r.date?,
                open: finite(r.open?)?,
                high: finite(r.high?)?,
                low: finite(r.low?)?,
                close: finite(r.close?)?,
                volume: r.volume?,
            };
            Some(row)
        })
        .collect();

    if rows.len() < total {
        debug!("Dropped {} duplicate or incomplete price rows", total - rows.len());
    }

    rows.sort_by_key(|r| r.date);
    rows
}

fn finite(v: f64) -> Option<f64> {
    if v.is_finite() { Some(v) } else { None }
}
