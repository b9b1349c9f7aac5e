// src/services/sentiment.rs
use log::info;
use std::sync::OnceLock;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::models::{ScoredHeadline, ScrapedHeadline};

static ANALYZER: OnceLock<SentimentIntensityAnalyzer<'static>> = OnceLock::new();

/// Loads the VADER lexicon. Call once at startup; later calls return the
/// same instance.
pub fn init() -> &'static SentimentIntensityAnalyzer<'static> {
    ANALYZER.get_or_init(|| {
        info!("Loading VADER sentiment lexicon");
        SentimentIntensityAnalyzer::new()
    })
}

/// Maps a text to a compound polarity score in [-1, 1].
pub trait SentimentModel: Send + Sync {
    fn compound(&self, text: &str) -> f64;

    fn score_all(&self, headlines: Vec<ScrapedHeadline>) -> Vec<ScoredHeadline> {
        headlines
            .into_iter()
            .map(|h| {
                let score = self.compound(&h.title);
                h.scored(score)
            })
            .collect()
    }
}

pub struct VaderScorer {
    analyzer: &'static SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        VaderScorer { analyzer: init() }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let score = self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0);
        if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}
