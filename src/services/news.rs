// src/services/news.rs
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::models::ScrapedHeadline;
use super::error::PipelineError;

const NEWS_TABLE_ID: &str = "news-table";

/// Anything that can produce the headline table for a ticker.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn headlines(&self, ticker: &str) -> Result<Vec<ScrapedHeadline>, PipelineError>;
}

/// Scrapes the news table from a finance portal quote page.
pub struct FinvizScraper {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl FinvizScraper {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(FinvizScraper {
            client,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        })
    }

    pub fn quote_url(&self, ticker: &str) -> String {
        format!("{}{}", self.base_url, urlencoding::encode(ticker))
    }

    async fn fetch_page(&self, ticker: &str) -> Result<String, PipelineError> {
        let url = self.quote_url(ticker);
        info!("Fetching news page from URL: {}", url);

        let body = self.client
            .get(&url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        debug!("Received {} bytes for {}", body.len(), ticker);
        Ok(body)
    }
}

#[async_trait]
impl HeadlineSource for FinvizScraper {
    async fn headlines(&self, ticker: &str) -> Result<Vec<ScrapedHeadline>, PipelineError> {
        let body = self.fetch_page(ticker).await.map_err(|e| {
            error!("Failed to fetch news for {}: {}", ticker, e);
            PipelineError::Transport(format!("Failed to fetch data: {}", e.message()))
        })?;
        parse_news_table(&body, ticker)
    }
}

fn selector(css: &str) -> Result<Selector, PipelineError> {
    Selector::parse(css).map_err(|e| PipelineError::Parse(format!("invalid selector {}: {:?}", css, e)))
}

/// Extracts (date, time, title) rows from the `news-table` element.
///
/// The portal prints the date only on the first headline of each day, so the
/// last explicit date is carried forward onto time-only rows.
pub fn parse_news_table(html: &str, ticker: &str) -> Result<Vec<ScrapedHeadline>, PipelineError> {
    let document = Html::parse_document(html);
    let table_selector = selector(&format!("#{}", NEWS_TABLE_ID))?;
    let row_selector = selector("tr")?;
    let link_selector = selector("a")?;
    let cell_selector = selector("td")?;

    let table = document.select(&table_selector).next().ok_or_else(|| {
        error!("No element with id {} for {}", NEWS_TABLE_ID, ticker);
        PipelineError::Parse("No news table found for the ticker.".to_string())
    })?;

    let mut rows = Vec::new();
    let mut last_date: Option<String> = None;

    for row in table.select(&row_selector) {
        let link = match row.select(&link_selector).next() {
            Some(link) => link,
            None => continue,
        };
        let title = element_text(link);

        let stamp = row.select(&cell_selector).next().map(element_text).unwrap_or_default();
        let tokens: Vec<&str> = stamp.split_whitespace().collect();

        let time = match tokens.as_slice() {
            [] => {
                debug!("Skipping row without a timestamp: {}", title);
                continue;
            }
            [time] => time.to_string(),
            [date, time, ..] => {
                last_date = Some(date.to_string());
                time.to_string()
            }
        };

        rows.push(ScrapedHeadline {
            ticker: ticker.to_string(),
            date: last_date.clone(),
            time,
            title,
        });
    }

    info!("Parsed {} headlines for {}", rows.len(), ticker);
    Ok(rows)
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
