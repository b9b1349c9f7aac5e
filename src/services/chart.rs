// src/services/chart.rs
use chrono::{Duration, NaiveDate};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

use crate::models::MergedRow;
use super::error::PipelineError;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 1000;
const TITLE: &str = "Market Sentiment and Stock Metrics Over Time";
const SENTIMENT_LABEL: &str = "Sentiment (Compound Score)";
const MAX_X_LABELS: usize = 12;

fn render_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Render(format!("Failed to plot data: {}", e))
}

/// Draws the sentiment/price-change and sentiment/volume panels as an SVG
/// document. The x axis is days since the first merged date.
pub fn render_chart(rows: &[MergedRow]) -> Result<String, PipelineError> {
    let first = rows
        .first()
        .map(|r| r.date)
        .ok_or_else(|| render_err("no rows to plot"))?;

    let offset = |d: NaiveDate| (d - first).num_days() as f64;
    let sentiment: Vec<(f64, f64)> = rows.iter().map(|r| (offset(r.date), r.mean_sentiment)).collect();
    let change: Vec<(f64, f64)> = rows.iter().map(|r| (offset(r.date), r.price_change_pct)).collect();
    let volume: Vec<(f64, f64)> = rows.iter().map(|r| (offset(r.date), r.volume as f64)).collect();

    let x_range = padded_range(sentiment.iter().map(|p| p.0))?;
    let last_day = sentiment.iter().map(|p| p.0 as i64).max().unwrap_or(0);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let root = root.titled(TITLE, ("sans-serif", 26)).map_err(render_err)?;
        let (upper, lower) = root.split_vertically((HEIGHT - 40) / 2);

        let panels = [
            (&upper, &change, "Price Change (%)", GREEN),
            (&lower, &volume, "Volume", RED),
        ];
        for (area, secondary, label, color) in panels {
            draw_panel(area, first, last_day, x_range.clone(), &sentiment, secondary, label, color)?;
        }

        root.present().map_err(render_err)?;
    }

    info!("Rendered chart for {} merged rows ({} bytes)", rows.len(), svg.len());
    Ok(svg)
}

#[allow(clippy::too_many_arguments)]
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    first: NaiveDate,
    last_day: i64,
    x_range: Range<f64>,
    sentiment: &[(f64, f64)],
    secondary: &[(f64, f64)],
    secondary_label: &str,
    secondary_color: RGBColor,
) -> Result<(), PipelineError> {
    let left = padded_range(sentiment.iter().map(|p| p.1))?;
    let right = padded_range(secondary.iter().map(|p| p.1))?;

    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .right_y_label_area_size(90)
        .build_cartesian_2d(x_range.clone(), left)
        .map_err(render_err)?
        .set_secondary_coord(x_range, right);

    let date_label = |x: &f64| day_label(first, last_day, *x);
    chart
        .configure_mesh()
        .x_labels((last_day as usize + 1).clamp(2, MAX_X_LABELS))
        .x_label_formatter(&date_label)
        .x_desc("Date")
        .y_desc(SENTIMENT_LABEL)
        .draw()
        .map_err(render_err)?;
    chart
        .configure_secondary_axes()
        .y_desc(secondary_label)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(sentiment.iter().copied(), &BLUE))
        .map_err(render_err)?
        .label(SENTIMENT_LABEL)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart
        .draw_series(sentiment.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))
        .map_err(render_err)?;

    chart
        .draw_secondary_series(LineSeries::new(secondary.iter().copied(), &secondary_color))
        .map_err(render_err)?
        .label(secondary_label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &secondary_color));
    chart
        .draw_secondary_series(secondary.iter().map(|&p| Circle::new(p, 3, secondary_color.filled())))
        .map_err(render_err)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    Ok(())
}

/// Date for a whole-day tick inside the plotted days; fractional ticks and
/// ticks in the padding stay blank.
fn day_label(first: NaiveDate, last_day: i64, x: f64) -> String {
    let day = x.round();
    if (x - day).abs() > 1e-6 || day < 0.0 || day as i64 > last_day {
        return String::new();
    }
    (first + Duration::days(day as i64)).format("%Y-%m-%d").to_string()
}

/// Axis range with 5% headroom. A single value gets a fixed margin so the
/// range is never empty.
fn padded_range(values: impl Iterator<Item = f64>) -> Result<Range<f64>, PipelineError> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if !v.is_finite() {
            return Err(render_err(format!("non-finite value {}", v)));
        }
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return Err(render_err("empty series"));
    }

    let span = max - min;
    let pad = if span > f64::EPSILON { span * 0.05 } else { (max.abs() * 0.05).max(0.5) };
    Ok((min - pad)..(max + pad))
}
