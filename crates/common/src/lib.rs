//! MathRAG Common Library
//!
//! Shared code for the retrieval crates including:
//! - Domain models (exercises, theorems, taxonomy, results)
//! - Corpus parsing, validation and taxonomy synchronization
//! - Error types and handling
//! - Configuration management
//! - Query cache
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod corpus;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
