//! Per-query result types

use super::{Exercise, Theorem};
use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What kind of content a query is asking for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    /// Solve / compute something
    Exercise,
    /// State, define or recall a result
    Theorem,
    Unknown,
}

/// Taxonomy classification of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Option<String>,
    pub subtype: Option<String>,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub matched_keywords: Vec<String>,
}

impl ClassificationResult {
    pub fn unclassified() -> Self {
        Self::default()
    }
}

/// Outcome of an exercise retrieval
#[derive(Debug, Clone)]
pub enum RagResult {
    Success {
        /// Never empty
        exercises: Vec<Exercise>,
        matched_category: Option<String>,
        matched_subtype: Option<String>,
        confidence: f32,
    },
    NoMatch {
        reason: String,
    },
    Error {
        message: String,
        cause: Option<Arc<AppError>>,
    },
}

impl RagResult {
    pub fn no_match(reason: impl Into<String>) -> Self {
        RagResult::NoMatch { reason: reason.into() }
    }

    pub fn error(err: AppError) -> Self {
        RagResult::Error {
            message: err.to_string(),
            cause: Some(Arc::new(err)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RagResult::Success { .. })
    }

    /// Retrieved exercises, empty unless `Success`
    pub fn exercises(&self) -> &[Exercise] {
        match self {
            RagResult::Success { exercises, .. } => exercises,
            _ => &[],
        }
    }

    /// Short label for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            RagResult::Success { .. } => "success",
            RagResult::NoMatch { .. } => "no_match",
            RagResult::Error { .. } => "error",
        }
    }
}

/// Outcome of a theorem lookup
#[derive(Debug, Clone, PartialEq)]
pub enum TheoremResult {
    Found(Theorem),
    NotFound { reason: String },
}

impl TheoremResult {
    pub fn not_found(reason: impl Into<String>) -> Self {
        TheoremResult::NotFound { reason: reason.into() }
    }

    pub fn theorem(&self) -> Option<&Theorem> {
        match self {
            TheoremResult::Found(theorem) => Some(theorem),
            TheoremResult::NotFound { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_keeps_cause() {
        let result = RagResult::error(AppError::CorpusUnavailable { corpus: "exercise".into() });
        match &result {
            RagResult::Error { message, cause } => {
                assert_eq!(message, "exercise corpus is not available");
                assert!(cause.is_some());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(result.exercises().is_empty());
        assert_eq!(result.outcome(), "error");
    }

    #[test]
    fn test_content_type_serialization() {
        let json = serde_json::to_string(&ContentType::Theorem).unwrap();
        assert_eq!(json, "\"THEOREM\"");
    }
}
