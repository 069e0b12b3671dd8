//! JSON corpus parsing
//!
//! Documents are decoded leniently: unknown fields are ignored and missing
//! optional fields fall back to defaults. Only malformed JSON, an empty
//! stream or a missing entity list is a failure.

use super::validate::{validate_exercise, validate_theorem};
use crate::errors::{AppError, Result};
use crate::models::{
    CorpusMetadata, Exercise, ExerciseCollection, Taxonomy, Theorem, TheoremCollection,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read};
use tracing::{debug, warn};

/// Default cap on decoded exercises
pub const MAX_EXERCISES: usize = 100;

/// Default cap on decoded theorems
pub const MAX_THEOREMS: usize = 50;

#[derive(Deserialize)]
struct ExerciseDocument {
    #[serde(flatten)]
    metadata: CorpusMetadata,

    #[serde(default)]
    max_exercises: Option<Value>,

    exercises: Vec<Exercise>,
}

#[derive(Deserialize)]
struct TheoremDocument {
    #[serde(flatten)]
    metadata: CorpusMetadata,

    theorems: Vec<Theorem>,
}

/// Parse an exercise corpus with the default cap
pub fn parse_exercises<R: Read>(reader: R) -> Result<ExerciseCollection> {
    parse_exercises_capped(reader, MAX_EXERCISES)
}

/// Parse an exercise corpus, keeping at most `cap` entries.
///
/// A document-declared `max_exercises` is recorded when it is a positive
/// integer but never changes the cap. Entries past the cap are dropped in
/// order; this is logged, not an error.
pub fn parse_exercises_capped<R: Read>(reader: R, cap: usize) -> Result<ExerciseCollection> {
    let document: ExerciseDocument = decode("exercise", reader)?;
    let declared_max = document
        .max_exercises
        .as_ref()
        .and_then(Value::as_u64)
        .filter(|max| *max > 0)
        .and_then(|max| usize::try_from(max).ok());

    let exercises = truncate_to_cap("exercise", document.exercises, cap);
    debug!(
        count = exercises.len(),
        version = %document.metadata.version,
        "Parsed exercise corpus"
    );

    Ok(ExerciseCollection {
        metadata: document.metadata,
        declared_max,
        exercises,
    })
}

/// Parse a theorem corpus with the default cap
pub fn parse_theorems<R: Read>(reader: R) -> Result<TheoremCollection> {
    parse_theorems_capped(reader, MAX_THEOREMS)
}

/// Parse a theorem corpus, keeping at most `cap` entries
pub fn parse_theorems_capped<R: Read>(reader: R, cap: usize) -> Result<TheoremCollection> {
    let document: TheoremDocument = decode("theorem", reader)?;
    let theorems = truncate_to_cap("theorem", document.theorems, cap);
    debug!(
        count = theorems.len(),
        version = %document.metadata.version,
        "Parsed theorem corpus"
    );

    Ok(TheoremCollection {
        metadata: document.metadata,
        theorems,
    })
}

/// Parse a taxonomy document. Hand-authored, so no cap.
pub fn parse_taxonomy<R: Read>(reader: R) -> Result<Taxonomy> {
    let taxonomy: Taxonomy = decode("taxonomy", reader)?;
    debug!(
        categories = taxonomy.categories.len(),
        subtypes = taxonomy.subtype_count(),
        "Parsed taxonomy"
    );
    Ok(taxonomy)
}

/// Lazily decode newline-delimited exercises.
///
/// Undecodable lines and entries failing [`validate_exercise`] are skipped;
/// iteration stops after `cap` valid exercises or on the first read error.
pub fn stream_exercises<R: Read>(reader: R, cap: usize) -> impl Iterator<Item = Exercise> {
    stream_entities("exercise", reader, validate_exercise).take(cap)
}

/// Lazily decode newline-delimited theorems, see [`stream_exercises`]
pub fn stream_theorems<R: Read>(reader: R, cap: usize) -> impl Iterator<Item = Theorem> {
    stream_entities("theorem", reader, validate_theorem).take(cap)
}

fn stream_entities<R, T>(
    corpus: &'static str,
    reader: R,
    is_valid: fn(&T) -> bool,
) -> impl Iterator<Item = T>
where
    R: Read,
    T: DeserializeOwned,
{
    BufReader::new(reader)
        .lines()
        .map_while(|line| line.ok())
        .filter(|line| !line.trim().is_empty())
        .filter_map(move |line| match serde_json::from_str::<T>(&line) {
            Ok(entity) => Some(entity),
            Err(e) => {
                debug!(corpus, error = %e, "Skipping undecodable entry");
                None
            }
        })
        .filter(move |entity| {
            let valid = is_valid(entity);
            if !valid {
                debug!(corpus, "Skipping entry with blank required fields");
            }
            valid
        })
}

fn decode<T: DeserializeOwned, R: Read>(corpus: &str, mut reader: R) -> Result<T> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyDocument {
            corpus: corpus.to_string(),
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| AppError::parse(corpus, e))
}

fn truncate_to_cap<T>(corpus: &str, mut entities: Vec<T>, cap: usize) -> Vec<T> {
    if entities.len() > cap {
        warn!(
            corpus,
            decoded = entities.len(),
            cap,
            "Corpus exceeds cap, keeping the first entries"
        );
        entities.truncate(cap);
    }
    entities
}
