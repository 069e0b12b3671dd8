//! Error types for MathRAG
//!
//! Provides:
//! - Distinct error types for each failure family (parse, init, retrieval)
//! - Machine-readable error codes
//! - Recoverability classification for callers deciding on fallbacks

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Corpus errors (1xxx)
    ParseError,
    EmptyDocument,
    CorpusUnavailable,

    // Lifecycle errors (2xxx)
    InitializationError,

    // Query-time errors (3xxx)
    RetrievalError,

    // Internal errors (9xxx)
    IoError,
    ConfigurationError,
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Corpus (1xxx)
            ErrorCode::ParseError => 1001,
            ErrorCode::EmptyDocument => 1002,
            ErrorCode::CorpusUnavailable => 1003,

            // Lifecycle (2xxx)
            ErrorCode::InitializationError => 2001,

            // Query-time (3xxx)
            ErrorCode::RetrievalError => 3001,

            // Internal (9xxx)
            ErrorCode::IoError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::InternalError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Corpus errors
    #[error("Failed to parse {corpus} corpus: {source}")]
    Parse {
        corpus: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty {corpus} document")]
    EmptyDocument { corpus: String },

    #[error("{corpus} corpus is not available")]
    CorpusUnavailable { corpus: String },

    // Lifecycle errors
    #[error("Initialization failed: {message}")]
    Initialization { message: String },

    // Query-time errors
    #[error("Retrieval failed: {message}")]
    Retrieval { message: String },

    // Internal errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Build a parse error for the named corpus
    pub fn parse(corpus: &str, source: serde_json::Error) -> Self {
        AppError::Parse {
            corpus: corpus.to_string(),
            source,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Parse { .. } => ErrorCode::ParseError,
            AppError::EmptyDocument { .. } => ErrorCode::EmptyDocument,
            AppError::CorpusUnavailable { .. } => ErrorCode::CorpusUnavailable,
            AppError::Initialization { .. } => ErrorCode::InitializationError,
            AppError::Retrieval { .. } => ErrorCode::RetrievalError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the failure is local to one corpus or query.
    ///
    /// Recoverable errors leave the rest of the system usable; callers are
    /// expected to fall back (e.g. send the prompt without context).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Parse { .. }
                | AppError::EmptyDocument { .. }
                | AppError::CorpusUnavailable { .. }
                | AppError::Retrieval { .. }
                | AppError::Io(_)
        )
    }
}
