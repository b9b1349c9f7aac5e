// src/services/test_support.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::{PriceRow, ScrapedHeadline};
use super::error::PipelineError;
use super::news::HeadlineSource;
use super::prices::PriceSource;
use super::sentiment::SentimentModel;

pub struct StubHeadlines(Result<Vec<(String, String, String)>, PipelineError>);

impl StubHeadlines {
    /// (date, time, title) rows; an empty date means a time-only row.
    pub fn rows(rows: &[(&str, &str, &str)]) -> Self {
        StubHeadlines(Ok(rows
            .iter()
            .map(|(d, t, title)| (d.to_string(), t.to_string(), title.to_string()))
            .collect()))
    }

    pub fn failing(err: PipelineError) -> Self {
        StubHeadlines(Err(err))
    }
}

#[async_trait]
impl HeadlineSource for StubHeadlines {
    async fn headlines(&self, ticker: &str) -> Result<Vec<ScrapedHeadline>, PipelineError> {
        let rows = self.0.clone()?;
        Ok(rows
            .into_iter()
            .map(|(date, time, title)| ScrapedHeadline {
                ticker: ticker.to_string(),
                date: if date.is_empty() { None } else { Some(date) },
                time,
                title,
            })
            .collect())
    }
}

pub struct FixedScores(HashMap<String, f64>);

pub fn fixed_scores(scores: &[(&str, f64)]) -> FixedScores {
    FixedScores(scores.iter().map(|(t, s)| (t.to_string(), *s)).collect())
}

impl SentimentModel for FixedScores {
    fn compound(&self, text: &str) -> f64 {
        self.0.get(text).copied().unwrap_or(0.0)
    }
}

pub struct StubPrices {
    result: Result<Vec<PriceRow>, PipelineError>,
    requests: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl StubPrices {
    pub fn rows(rows: Vec<PriceRow>) -> Self {
        StubPrices { result: Ok(rows), requests: Mutex::new(Vec::new()) }
    }

    pub fn failing(err: PipelineError) -> Self {
        StubPrices { result: Err(err), requests: Mutex::new(Vec::new()) }
    }

    pub fn requested(&self) -> Vec<(String, NaiveDate, NaiveDate)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceSource for StubPrices {
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceRow>, PipelineError> {
        self.requests.lock().unwrap().push((symbol.to_string(), start, end));
        self.result.clone()
    }
}
