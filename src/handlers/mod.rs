// src/handlers/mod.rs
pub mod analyze;
pub mod error;
pub mod index;
