use stock_sentiment::config::AppConfig;
use stock_sentiment::services::prices::{PriceSource, YahooPrices};
use chrono::{Duration, Utc};
use log::{info, error};
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let ticker = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());
    let config = AppConfig::from_env()?;
    let prices = YahooPrices::new(&config.quotes_base_url, &config.quotes_user_agent, config.http_timeout)?;

    let end = Utc::now().date_naive();
    let start = end - Duration::days(14);
    info!("Testing price history for {} from {} to {}...", ticker, start, end);

    match prices.history(&ticker, start, end).await {
        Ok(rows) => {
            for r in rows {
                println!("{} open {:.2} high {:.2} low {:.2} close {:.2} volume {}", r.date, r.open, r.high, r.low, r.close, r.volume);
            }
        }
        Err(e) => {
            error!("ERROR: Failed to fetch price history: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
