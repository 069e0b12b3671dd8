//! MathRAG Search
//!
//! In-process retrieval over a bounded corpus of worked exercises and
//! theorems:
//! - Keyword index (exact + containment matching)
//! - Content-type and taxonomy classification
//! - Classification-aware ranking
//! - `RagRepository`: lazy one-time initialization, query cache, stats

pub mod classify;
pub mod index;
pub mod ranking;
pub mod repository;

pub use classify::{classify_query_type, TaxonomyClassifier};
pub use index::{Indexed, KeywordIndex, MatchWeights, ScoreBoard};
pub use ranking::{rank_exercises, RankedExercise, RankingWeights};
pub use repository::{RagRepository, RepositoryState, Stats};
