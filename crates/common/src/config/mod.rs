//! Configuration management for MathRAG
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Corpus locations and size caps
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Retrieval scoring and caching
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Prompt context rendering
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// Path to the exercise corpus JSON
    #[serde(default = "default_exercises_path")]
    pub exercises_path: String,

    /// Path to the theorem corpus JSON
    #[serde(default = "default_theorems_path")]
    pub theorems_path: String,

    /// Path to the taxonomy JSON; synthesized from exercises when absent
    pub taxonomy_path: Option<String>,

    /// Maximum exercises kept after decoding
    #[serde(default = "default_max_exercises")]
    pub max_exercises: usize,

    /// Maximum theorems kept after decoding
    #[serde(default = "default_max_theorems")]
    pub max_theorems: usize,

    /// Merge the taxonomy with categories found in the exercise corpus
    #[serde(default = "default_enabled")]
    pub synchronize_taxonomy: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Query cache capacity (LRU)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Exercises returned per query by the facade
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Score for an exact keyword hit in the exercise index
    #[serde(default = "default_exact_exercise_weight")]
    pub exact_exercise_weight: u32,

    /// Score for an exact keyword hit in the theorem index
    #[serde(default = "default_exact_theorem_weight")]
    pub exact_theorem_weight: u32,

    /// Score for a containment (substring) hit in either index
    #[serde(default = "default_fuzzy_weight")]
    pub fuzzy_weight: u32,

    /// Ranking bonus when an exercise is in the classified category
    #[serde(default = "default_category_bonus")]
    pub category_bonus: u32,

    /// Ranking bonus when an exercise is in the classified subtype
    #[serde(default = "default_subtype_bonus")]
    pub subtype_bonus: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    /// Hard character budget for the context block
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Problem text cap in the truncated summary
    #[serde(default = "default_summary_problem_chars")]
    pub summary_problem_chars: usize,

    /// Worked solution cap in the truncated summary
    #[serde(default = "default_summary_solution_chars")]
    pub summary_solution_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error) or a full EnvFilter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,
}

// Default value functions
fn default_exercises_path() -> String { "assets/exercises.json".to_string() }
fn default_theorems_path() -> String { "assets/theorems.json".to_string() }
fn default_max_exercises() -> usize { 100 }
fn default_max_theorems() -> usize { 50 }
fn default_enabled() -> bool { true }
fn default_cache_capacity() -> usize { 10 }
fn default_limit() -> usize { 2 }
fn default_exact_exercise_weight() -> u32 { 2 }
fn default_exact_theorem_weight() -> u32 { 3 }
fn default_fuzzy_weight() -> u32 { 1 }
fn default_category_bonus() -> u32 { 10 }
fn default_subtype_bonus() -> u32 { 5 }
fn default_max_context_chars() -> usize { 4096 }
fn default_summary_problem_chars() -> usize { 200 }
fn default_summary_solution_chars() -> usize { 500 }
fn default_log_level() -> String { "info".to_string() }

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            exercises_path: default_exercises_path(),
            theorems_path: default_theorems_path(),
            taxonomy_path: None,
            max_exercises: default_max_exercises(),
            max_theorems: default_max_theorems(),
            synchronize_taxonomy: default_enabled(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            default_limit: default_limit(),
            exact_exercise_weight: default_exact_exercise_weight(),
            exact_theorem_weight: default_exact_theorem_weight(),
            fuzzy_weight: default_fuzzy_weight(),
            category_bonus: default_category_bonus(),
            subtype_bonus: default_subtype_bonus(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_context_chars: default_max_context_chars(),
            summary_problem_chars: default_summary_problem_chars(),
            summary_solution_chars: default_summary_solution_chars(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__CACHE_CAPACITY=20
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file (format inferred from the extension)
    pub fn from_file(path: &str) -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings the retrieval pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.cache_capacity == 0 {
            return Err(AppError::Configuration {
                message: "retrieval.cache_capacity must be greater than zero".to_string(),
            });
        }
        if self.retrieval.default_limit == 0 {
            return Err(AppError::Configuration {
                message: "retrieval.default_limit must be greater than zero".to_string(),
            });
        }
        if self.prompt.max_context_chars == 0 {
            return Err(AppError::Configuration {
                message: "prompt.max_context_chars must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
