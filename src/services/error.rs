// src/services/error.rs
use std::fmt;

/// Failure classes of the analysis pipeline. Each stage returns one of these
/// instead of panicking; the controller turns them into user-facing messages.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Network, DNS, HTTP status or provider failure.
    Transport(String),
    /// An expected element was missing from a response.
    Parse(String),
    /// A stage produced zero rows.
    EmptyResult(String),
    /// The chart could not be built.
    Render(String),
}

impl PipelineError {
    /// "Nothing to show" outcomes are warnings; everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, PipelineError::EmptyResult(_))
    }

    pub fn message(&self) -> &str {
        match self {
            PipelineError::Transport(m)
            | PipelineError::Parse(m)
            | PipelineError::EmptyResult(m)
            | PipelineError::Render(m) => m,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Transport(m) => write!(f, "transport error: {}", m),
            PipelineError::Parse(m) => write!(f, "parse error: {}", m),
            PipelineError::EmptyResult(m) => write!(f, "empty result: {}", m),
            PipelineError::Render(m) => write!(f, "render error: {}", m),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::Transport(e.to_string())
    }
}
