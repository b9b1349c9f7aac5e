// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::NaiveDate;

/// One row of the news table, as scraped. `date` is the raw token
/// ("Today" or "Jan-02-24") and is absent when no date has been seen yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedHeadline {
    pub ticker: String,
    pub date: Option<String>,
    pub time: String,
    pub title: String,
}

impl ScrapedHeadline {
    pub fn scored(self, sentiment: f64) -> ScoredHeadline {
        ScoredHeadline { headline: self, sentiment }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHeadline {
    pub headline: ScrapedHeadline,
    pub sentiment: f64,
}

/// A headline after its date token has been resolved to a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub ticker: String,
    pub date: NaiveDate,
    pub time: String,
    pub title: String,
    pub sentiment: f64,
}

/// Provider row before normalization; any field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawPriceRow {
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub ticker: String,
    pub mean_sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub mean_sentiment: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub price_change_pct: f64,
}
