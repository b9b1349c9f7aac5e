// src/services/merge.rs
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::models::{DailySentiment, Headline, MergedRow, PriceRow, ScoredHeadline};

const TODAY_TOKEN: &str = "Today";
const DATE_FORMAT: &str = "%b-%d-%y";

/// Resolves a scraped date token: "Today" is `today`, anything else must
/// look like "Jan-02-24".
pub fn resolve_date(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    let token = token.trim();
    if token.eq_ignore_ascii_case(TODAY_TOKEN) {
        return Some(today);
    }
    NaiveDate::parse_from_str(token, DATE_FORMAT).ok()
}

/// Resolves every headline's date and forward-fills the gaps.
///
/// A row whose date is absent or unparseable takes the previous row's date.
/// Rows ahead of the first resolvable date belong to the current day.
pub fn normalize_headlines(rows: Vec<ScoredHeadline>, today: NaiveDate) -> Vec<Headline> {
    let mut last: Option<NaiveDate> = None;
    let mut filled = 0usize;

    let headlines: Vec<Headline> = rows
        .into_iter()
        .map(|scored| {
            let h = scored.headline;
            let resolved = h.date.as_deref().and_then(|token| {
                let date = resolve_date(token, today);
                if date.is_none() {
                    warn!("Unrecognized date token {:?} on headline {:?}", token, h.title);
                }
                date
            });
            let date = match resolved {
                Some(date) => date,
                None => {
                    filled += 1;
                    last.unwrap_or(today)
                }
            };
            last = Some(date);
            Headline {
                ticker: h.ticker,
                date,
                time: h.time,
                title: h.title,
                sentiment: scored.sentiment,
            }
        })
        .collect();

    if filled > 0 {
        warn!("Forward-filled the date of {} of {} headlines", filled, headlines.len());
    }
    headlines
}

/// Inclusive (min, max) of the headline dates.
pub fn date_window(headlines: &[Headline]) -> Option<(NaiveDate, NaiveDate)> {
    let min = headlines.iter().map(|h| h.date).min()?;
    let max = headlines.iter().map(|h| h.date).max()?;
    Some((min, max))
}

/// Mean sentiment per (date, ticker), ordered by date then ticker.
pub fn daily_sentiment(headlines: &[Headline]) -> Vec<DailySentiment> {
    let mut groups: BTreeMap<(NaiveDate, &str), (f64, usize)> = BTreeMap::new();
    for h in headlines {
        let entry = groups.entry((h.date, h.ticker.as_str())).or_insert((0.0, 0));
        entry.0 += h.sentiment;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((date, ticker), (sum, count))| DailySentiment {
            date,
            ticker: ticker.to_string(),
            mean_sentiment: sum / count as f64,
        })
        .collect()
}

/// Intraday move in percent. A zero or non-finite result counts as missing.
pub fn price_change_pct(row: &PriceRow) -> Option<f64> {
    if row.open == 0.0 {
        return None;
    }
    let pct = (row.close - row.open) / row.open * 100.0;
    if pct.is_finite() { Some(pct) } else { None }
}

/// Outer join of daily sentiment and prices on date. Rows that lack a value
/// from either side are dropped, leaving matched dates in ascending order.
pub fn merge(daily: &[DailySentiment], prices: &[PriceRow]) -> Vec<MergedRow> {
    let mut by_date: BTreeMap<NaiveDate, (Vec<&DailySentiment>, Option<&PriceRow>)> = BTreeMap::new();
    for d in daily {
        by_date.entry(d.date).or_default().0.push(d);
    }
    for p in prices {
        let slot = &mut by_date.entry(p.date).or_default().1;
        if slot.is_none() {
            *slot = Some(p);
        }
    }

    let mut merged = Vec::new();
    let mut incomplete = 0usize;
    for (date, (sentiments, price)) in by_date {
        let price = match price {
            Some(price) if !sentiments.is_empty() => price,
            _ => {
                incomplete += sentiments.len().max(1);
                continue;
            }
        };
        let change = match price_change_pct(price) {
            Some(change) => change,
            None => {
                incomplete += sentiments.len();
                continue;
            }
        };
        for s in sentiments {
            if !s.mean_sentiment.is_finite() {
                incomplete += 1;
                continue;
            }
            merged.push(MergedRow {
                date,
                ticker: s.ticker.clone(),
                mean_sentiment: s.mean_sentiment,
                open: price.open,
                high: price.high,
                low: price.low,
                close: price.close,
                volume: price.volume,
                price_change_pct: change,
            });
        }
    }

    debug!("Merged {} rows, dropped {} incomplete", merged.len(), incomplete);
    merged.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScrapedHeadline;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scored(date: Option<&str>, time: &str, title: &str, sentiment: f64) -> ScoredHeadline {
        ScrapedHeadline {
            ticker: "AAPL".to_string(),
            date: date.map(str::to_string),
            time: time.to_string(),
            title: title.to_string(),
        }
        .scored(sentiment)
    }

    fn price(d: NaiveDate, open: f64, close: f64, volume: u64) -> PriceRow {
        PriceRow { date: d, open, high: open.max(close), low: open.min(close), close, volume }
    }

    #[test]
    fn resolves_today_against_the_given_date() {
        assert_eq!(resolve_date("Today", date(2024, 3, 8)), Some(date(2024, 3, 8)));
        assert_eq!(resolve_date("Today", date(2025, 12, 31)), Some(date(2025, 12, 31)));
        assert_eq!(resolve_date("Jan-02-24", date(2025, 12, 31)), Some(date(2024, 1, 2)));
        assert_eq!(resolve_date("yesterday", date(2025, 12, 31)), None);
    }

    #[test]
    fn all_time_only_rows_share_todays_date() {
        let today = date(2024, 6, 14);
        let rows = vec![
            scored(None, "11:00AM", "a", 0.1),
            scored(None, "10:00AM", "b", 0.2),
            scored(None, "09:00AM", "c", 0.3),
        ];
        let headlines = normalize_headlines(rows, today);
        assert!(headlines.iter().all(|h| h.date == today));
    }

    #[test]
    fn unparseable_dates_take_the_previous_rows_date() {
        let rows = vec![
            scored(Some("Jan-03-24"), "09:00AM", "a", 0.0),
            scored(Some("garbage"), "08:00AM", "b", 0.0),
            scored(Some("Jan-02-24"), "04:00PM", "c", 0.0),
        ];
        let dates: Vec<_> = normalize_headlines(rows, date(2024, 1, 5)).iter().map(|h| h.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 3), date(2024, 1, 2)]);
    }

    #[test]
    fn window_spans_min_to_max() {
        let rows = vec![
            scored(Some("Jan-05-24"), "09:00AM", "a", 0.0),
            scored(Some("Jan-02-24"), "09:00AM", "b", 0.0),
            scored(Some("Jan-03-24"), "09:00AM", "c", 0.0),
        ];
        let headlines = normalize_headlines(rows, date(2024, 1, 6));
        assert_eq!(date_window(&headlines), Some((date(2024, 1, 2), date(2024, 1, 5))));
        assert_eq!(date_window(&[]), None);
    }

    #[test]
    fn mean_sentiment_is_the_average_per_date() {
        let rows = vec![
            scored(Some("Jan-03-24"), "09:00AM", "a", 0.9),
            scored(None, "08:00AM", "b", 0.3),
            scored(Some("Jan-02-24"), "09:00AM", "c", 0.6),
            scored(None, "10:00AM", "d", -0.4),
        ];
        let daily = daily_sentiment(&normalize_headlines(rows, date(2024, 1, 5)));
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, date(2024, 1, 2));
        assert!((daily[0].mean_sentiment - 0.1).abs() < 1e-9);
        assert!((daily[1].mean_sentiment - 0.6).abs() < 1e-9);
    }

    #[test]
    fn merges_the_worked_example() {
        let rows = vec![
            scored(Some("Jan-02-24"), "09:00", "Stocks rally", 0.6),
            scored(Some("Jan-02-24"), "10:00", "Markets fear recession", -0.4),
        ];
        let daily = daily_sentiment(&normalize_headlines(rows, date(2024, 1, 10)));
        let merged = merge(&daily, &[price(date(2024, 1, 2), 100.0, 105.0, 1000)]);

        assert_eq!(merged.len(), 1);
        let row = &merged[0];
        assert_eq!(row.date, date(2024, 1, 2));
        assert!((row.mean_sentiment - 0.1).abs() < 1e-9);
        assert!((row.price_change_pct - 5.0).abs() < 1e-9);
        assert_eq!(row.volume, 1000);
    }

    #[test]
    fn unmatched_dates_and_zero_opens_are_dropped() {
        let daily = vec![
            DailySentiment { date: date(2024, 1, 6), ticker: "AAPL".into(), mean_sentiment: 0.2 },
            DailySentiment { date: date(2024, 1, 3), ticker: "AAPL".into(), mean_sentiment: -0.1 },
            DailySentiment { date: date(2024, 1, 2), ticker: "AAPL".into(), mean_sentiment: 0.4 },
        ];
        let prices = vec![
            price(date(2024, 1, 2), 0.0, 10.0, 5),
            price(date(2024, 1, 3), 50.0, 49.0, 7),
            price(date(2024, 1, 4), 50.0, 51.0, 9),
        ];
        let merged = merge(&daily, &prices);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].date, date(2024, 1, 3));
        assert!((merged[0].price_change_pct + 2.0).abs() < 1e-9);
    }

    #[test]
    fn merging_twice_gives_the_same_rows() {
        let daily = vec![
            DailySentiment { date: date(2024, 1, 4), ticker: "AAPL".into(), mean_sentiment: 0.2 },
            DailySentiment { date: date(2024, 1, 3), ticker: "AAPL".into(), mean_sentiment: -0.1 },
        ];
        let prices = vec![
            price(date(2024, 1, 4), 10.0, 11.0, 1),
            price(date(2024, 1, 3), 10.0, 9.0, 2),
        ];
        let first = merge(&daily, &prices);
        let second = merge(&daily, &prices);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
