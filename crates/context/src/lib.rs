//! MathRAG Context
//!
//! Turns retrieval results into prompt-ready context:
//! - `PromptFormatter`: budgeted rendering of exercises and theorems
//! - `ContextProvider`: query text in, optional context block out

pub mod facade;
pub mod formatter;

pub use facade::ContextProvider;
pub use formatter::{ContextWithMetadata, FormatLevel, FormattedContext, PromptFormatter};
