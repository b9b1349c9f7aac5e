// src/services/pipeline.rs
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{Headline, MergedRow, PriceRow};
use super::chart::render_chart;
use super::error::PipelineError;
use super::merge;
use super::news::{FinvizScraper, HeadlineSource};
use super::prices::{PriceSource, YahooPrices};
use super::sentiment::{SentimentModel, VaderScorer};

/// What the UI sends when the Analyze button is pressed.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub ticker: String,
    #[serde(default = "default_submitted")]
    pub submitted: bool,
}

fn default_submitted() -> bool {
    true
}

impl AnalyzeRequest {
    pub fn submit(ticker: impl Into<String>) -> Self {
        AnalyzeRequest { ticker: ticker.into(), submitted: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    AwaitingInput,
    Scraping,
    Scoring,
    FetchingPrices,
    Merging,
    Rendering,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Done,
    Warned,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

/// Everything the UI needs to render one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub status: Status,
    pub stage: Stage,
    pub messages: Vec<Message>,
    pub prices: Vec<PriceRow>,
    pub headlines: Vec<Headline>,
    pub merged: Vec<MergedRow>,
    pub chart_svg: Option<String>,
}

impl AnalysisReport {
    fn new(ticker: &str) -> Self {
        AnalysisReport {
            ticker: ticker.to_string(),
            status: Status::Idle,
            stage: Stage::Idle,
            messages: Vec::new(),
            prices: Vec::new(),
            headlines: Vec::new(),
            merged: Vec::new(),
            chart_svg: None,
        }
    }

    fn halt(&mut self, stage: Stage, err: PipelineError) {
        self.stage = stage;
        let level = if err.is_warning() {
            warn!("{} halted at {:?}: {}", self.ticker, stage, err);
            self.status = Status::Warned;
            Level::Warning
        } else {
            error!("{} failed at {:?}: {}", self.ticker, stage, err);
            self.status = Status::Failed;
            Level::Error
        };
        self.messages.push(Message { level, text: err.message().to_string() });
    }

    pub fn first_message(&self, level: Level) -> Option<&str> {
        self.messages.iter().find(|m| m.level == level).map(|m| m.text.as_str())
    }
}

/// Runs scrape → score → fetch prices → merge → render for one ticker.
pub struct Analyzer {
    news: Arc<dyn HeadlineSource>,
    scorer: Arc<dyn SentimentModel>,
    prices: Arc<dyn PriceSource>,
    market_tz: Tz,
}

impl Analyzer {
    pub fn new(
        news: Arc<dyn HeadlineSource>,
        scorer: Arc<dyn SentimentModel>,
        prices: Arc<dyn PriceSource>,
        market_tz: Tz,
    ) -> Self {
        Analyzer { news, scorer, prices, market_tz }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let news = FinvizScraper::new(&config.news_base_url, &config.news_user_agent, config.http_timeout)?;
        let prices = YahooPrices::new(&config.quotes_base_url, &config.quotes_user_agent, config.http_timeout)?;
        Ok(Analyzer::new(
            Arc::new(news),
            Arc::new(VaderScorer::new()),
            Arc::new(prices),
            config.market_tz,
        ))
    }

    pub async fn run(&self, request: &AnalyzeRequest) -> AnalysisReport {
        self.run_at(request, Utc::now()).await
    }

    /// `now` decides what "Today" means in the scraped table.
    pub async fn run_at(&self, request: &AnalyzeRequest, now: DateTime<Utc>) -> AnalysisReport {
        let ticker = request.ticker.trim().to_uppercase();
        let mut report = AnalysisReport::new(&ticker);

        if !request.submitted {
            return report;
        }
        if ticker.is_empty() {
            report.halt(
                Stage::AwaitingInput,
                PipelineError::EmptyResult("Please enter a ticker symbol.".to_string()),
            );
            return report;
        }

        info!("Starting analysis for {}", ticker);
        match self.execute(&ticker, now, &mut report).await {
            Ok(()) => {
                report.status = Status::Done;
                report.stage = Stage::Done;
                info!("Analysis for {} finished with {} merged rows", ticker, report.merged.len());
            }
            Err((stage, err)) => report.halt(stage, err),
        }
        report
    }

    async fn execute(
        &self,
        ticker: &str,
        now: DateTime<Utc>,
        report: &mut AnalysisReport,
    ) -> Result<(), (Stage, PipelineError)> {
        let at = |stage: Stage| move |err: PipelineError| (stage, err);
        let enter = |stage: Stage| debug!("{} -> {:?}", ticker, stage);

        enter(Stage::Scraping);
        let scraped = self.news.headlines(ticker).await.map_err(at(Stage::Scraping))?;
        if scraped.is_empty() {
            return Err((
                Stage::Scraping,
                PipelineError::EmptyResult("No news data found to analyze.".to_string()),
            ));
        }

        enter(Stage::Scoring);
        let scored = self.scorer.score_all(scraped);
        let today = now.with_timezone(&self.market_tz).date_naive();
        let headlines = merge::normalize_headlines(scored, today);
        let (start, end) = merge::date_window(&headlines).ok_or((
            Stage::Merging,
            PipelineError::EmptyResult("No news data found to analyze.".to_string()),
        ))?;

        enter(Stage::FetchingPrices);
        let prices = self.prices
            .history(ticker, start, end)
            .await
            .map_err(at(Stage::FetchingPrices))?;
        if prices.is_empty() {
            return Err((
                Stage::FetchingPrices,
                PipelineError::EmptyResult("No valid stock price data available.".to_string()),
            ));
        }

        enter(Stage::Merging);
        let daily = merge::daily_sentiment(&headlines);
        report.prices = prices;
        report.headlines = headlines;

        let merged = merge::merge(&daily, &report.prices);
        if merged.is_empty() {
            return Err((
                Stage::Merging,
                PipelineError::EmptyResult("No dates with both news sentiment and price data to chart.".to_string()),
            ));
        }

        enter(Stage::Rendering);
        let svg = render_chart(&merged).map_err(at(Stage::Rendering))?;
        report.messages.push(Message {
            level: Level::Info,
            text: format!(
                "Analyzed {} headlines and {} trading days from {} to {}.",
                report.headlines.len(),
                report.prices.len(),
                start,
                end
            ),
        });
        report.merged = merged;
        report.chart_svg = Some(svg);
        Ok(())
    }
}
