// src/services/mod.rs
pub mod error;
pub mod news;
pub mod sentiment;
pub mod prices;
pub mod merge;
pub mod chart;
pub mod export;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;
