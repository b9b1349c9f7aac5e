use stock_sentiment::config::AppConfig;
use stock_sentiment::services::news::{FinvizScraper, HeadlineSource};
use stock_sentiment::services::sentiment::{SentimentModel, VaderScorer};
use log::{info, error};
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let ticker = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());
    let config = AppConfig::from_env()?;
    let scraper = FinvizScraper::new(&config.news_base_url, &config.news_user_agent, config.http_timeout)?;

    info!("Testing headline scraping for {}...", ticker);

    let rows = match scraper.headlines(&ticker).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("ERROR: Failed to scrape headlines: {}", e);
            return Err(e.into());
        }
    };

    let scorer = VaderScorer::new();
    for row in scorer.score_all(rows) {
        let h = row.headline;
        println!("{:>10} {:>8} {:+.3}  {}", h.date.as_deref().unwrap_or("-"), h.time, row.sentiment, h.title);
    }

    Ok(())
}
