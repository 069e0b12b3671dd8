//! Corpus loading
//!
//! Turns raw JSON byte streams into validated, size-bounded domain
//! collections:
//! - Document parsing with caps and lenient field coercion
//! - Entity validation and a streaming (NDJSON) variant that skips bad rows
//! - Taxonomy synchronization against the exercise corpus
//! - Byte sources (files, in-memory buffers)

mod loader;
mod source;
mod taxonomy_sync;
mod validate;

pub use loader::{
    parse_exercises, parse_exercises_capped, parse_taxonomy, parse_theorems,
    parse_theorems_capped, stream_exercises, stream_theorems, MAX_EXERCISES, MAX_THEOREMS,
};
pub use source::{CorpusSource, FileCorpusSource, InMemoryCorpusSource};
pub use taxonomy_sync::{synchronize_taxonomy_with_exercises, TaxonomySync, TaxonomySyncReport};
pub use validate::{validate_exercise, validate_theorem};
