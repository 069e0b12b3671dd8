//! Prompt Formatter - Renders retrieval results into an LLM context block
//!
//! Provides:
//! - Exercise context block with header/footer banners
//! - Character budget enforcement with two fallback levels
//! - Theorem context block
//! - Structured metadata for callers that log rather than prompt

use mathrag_common::config::PromptConfig;
use mathrag_common::metrics::record_prompt_fallback;
use mathrag_common::models::{Exercise, RagResult, Theorem};
use mathrag_common::text::truncate_chars;
use serde::{Deserialize, Serialize};
use tracing::warn;

const EXERCISE_HEADER: &str = "### Reference worked examples (same topic as the question)";
const EXERCISE_FOOTER: &str =
    "### End of reference examples. Follow the same method and notation where it applies.";
const THEOREM_HEADER: &str = "### Reference theorem";
const THEOREM_FOOTER: &str = "### End of reference theorem.";

/// How much of the retrieved content survived the budget
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormatLevel {
    /// Every exercise, full detail
    Full,
    /// Only the first exercise, full detail
    FirstOnly,
    /// First exercise with problem and solution cut short
    Summary,
}

impl FormatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatLevel::Full => "full",
            FormatLevel::FirstOnly => "first_only",
            FormatLevel::Summary => "summary",
        }
    }
}

/// Rendered context block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedContext {
    pub text: String,
    pub level: FormatLevel,
}

/// Context block plus what produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextWithMetadata {
    /// Prompt-ready text, absent when nothing relevant was retrieved
    pub context: Option<String>,
    pub category: Option<String>,
    pub subtype: Option<String>,
    pub confidence: f32,
    pub exercise_count: usize,
    pub format_level: Option<FormatLevel>,
    /// Why the context is missing or reduced
    pub fallback_reason: Option<String>,
}

impl ContextWithMetadata {
    /// Metadata for a query that produced no context
    pub fn empty(reason: impl Into<String>) -> Self {
        Self {
            context: None,
            category: None,
            subtype: None,
            confidence: 0.0,
            exercise_count: 0,
            format_level: None,
            fallback_reason: Some(reason.into()),
        }
    }
}

/// Budgeted formatter for retrieval results
#[derive(Debug, Clone)]
pub struct PromptFormatter {
    max_chars: usize,
    summary_problem_chars: usize,
    summary_solution_chars: usize,
}

impl Default for PromptFormatter {
    fn default() -> Self {
        Self::new(&PromptConfig::default())
    }
}

impl PromptFormatter {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            max_chars: config.max_context_chars,
            summary_problem_chars: config.summary_problem_chars,
            summary_solution_chars: config.summary_solution_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Context text for a `Success` result, `None` otherwise
    pub fn format_context_for_prompt(&self, result: &RagResult) -> Option<String> {
        match result {
            RagResult::Success { exercises, .. } if !exercises.is_empty() => {
                Some(self.format_exercises(exercises).text)
            }
            _ => None,
        }
    }

    /// Same content as [`Self::format_context_for_prompt`] plus metadata
    pub fn format_with_metadata(&self, result: &RagResult) -> ContextWithMetadata {
        match result {
            RagResult::Success {
                exercises,
                matched_category,
                matched_subtype,
                confidence,
            } if !exercises.is_empty() => {
                let formatted = self.format_exercises(exercises);
                let fallback_reason = match formatted.level {
                    FormatLevel::Full => None,
                    level => Some(format!("context over budget, rendered as {}", level.as_str())),
                };
                ContextWithMetadata {
                    context: Some(formatted.text),
                    category: matched_category.clone(),
                    subtype: matched_subtype.clone(),
                    confidence: *confidence,
                    exercise_count: exercises.len(),
                    format_level: Some(formatted.level),
                    fallback_reason,
                }
            }
            RagResult::Success { .. } => ContextWithMetadata::empty("no exercises retrieved"),
            RagResult::NoMatch { reason } => ContextWithMetadata::empty(reason.clone()),
            RagResult::Error { message, .. } => ContextWithMetadata::empty(message.clone()),
        }
    }

    /// Render exercises within the character budget.
    ///
    /// Tries all exercises, then the first one alone, then a truncated
    /// summary of the first one. The summary is hard-capped to the budget.
    pub fn format_exercises(&self, exercises: &[Exercise]) -> FormattedContext {
        let Some(first) = exercises.first() else {
            return FormattedContext {
                text: String::new(),
                level: FormatLevel::Full,
            };
        };

        let full = wrap(
            EXERCISE_HEADER,
            exercises.iter().map(exercise_block),
            EXERCISE_FOOTER,
        );
        if char_len(&full) <= self.max_chars {
            return FormattedContext {
                text: full,
                level: FormatLevel::Full,
            };
        }

        if exercises.len() > 1 {
            let single = wrap(EXERCISE_HEADER, std::iter::once(exercise_block(first)), EXERCISE_FOOTER);
            if char_len(&single) <= self.max_chars {
                warn!(
                    chars = char_len(&full),
                    budget = self.max_chars,
                    dropped = exercises.len() - 1,
                    "Context over budget, keeping first exercise only"
                );
                record_prompt_fallback(FormatLevel::FirstOnly.as_str());
                return FormattedContext {
                    text: single,
                    level: FormatLevel::FirstOnly,
                };
            }
        }

        warn!(
            budget = self.max_chars,
            exercise = %first.id,
            "Context over budget, using truncated summary"
        );
        record_prompt_fallback(FormatLevel::Summary.as_str());
        let summary = wrap(
            EXERCISE_HEADER,
            std::iter::once(self.exercise_summary(first)),
            EXERCISE_FOOTER,
        );
        FormattedContext {
            text: truncate_chars(&summary, self.max_chars),
            level: FormatLevel::Summary,
        }
    }

    /// Render a theorem within the character budget.
    ///
    /// Proof and notes are dropped first; the statement is cut last.
    pub fn format_theorem_for_prompt(&self, theorem: &Theorem) -> String {
        let full = wrap(THEOREM_HEADER, std::iter::once(theorem_block(theorem, true)), THEOREM_FOOTER);
        if char_len(&full) <= self.max_chars {
            return full;
        }

        warn!(
            budget = self.max_chars,
            theorem = %theorem.id,
            "Theorem context over budget, dropping proof and notes"
        );
        record_prompt_fallback("theorem_statement");
        let statement_only = wrap(THEOREM_HEADER, std::iter::once(theorem_block(theorem, false)), THEOREM_FOOTER);
        truncate_chars(&statement_only, self.max_chars)
    }

    fn exercise_summary(&self, exercise: &Exercise) -> String {
        format!(
            "{}\nProblem:\n{}\n\nSolution:\n{}",
            exercise_title(exercise),
            truncate_chars(exercise.problem_text.trim(), self.summary_problem_chars),
            truncate_chars(exercise.worked_solution.trim(), self.summary_solution_chars),
        )
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn wrap<I>(header: &str, blocks: I, footer: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut parts = vec![header.to_string()];
    parts.extend(blocks);
    parts.push(footer.to_string());
    parts.join("\n\n")
}

fn exercise_title(exercise: &Exercise) -> String {
    let subtype = exercise.subtype.trim();
    if subtype.is_empty() {
        format!("[{}] ({})", exercise.category.trim(), exercise.id)
    } else {
        format!("[{} / {}] ({})", exercise.category.trim(), subtype, exercise.id)
    }
}

fn exercise_block(exercise: &Exercise) -> String {
    format!(
        "{}\nProblem:\n{}\n\nSolution:\n{}",
        exercise_title(exercise),
        exercise.problem_text.trim(),
        exercise.worked_solution.trim(),
    )
}

fn theorem_block(theorem: &Theorem, with_details: bool) -> String {
    let kind = theorem.kind.trim();
    let mut block = if kind.is_empty() {
        format!("{} [{}]", theorem.name.trim(), theorem.category.trim())
    } else {
        format!("{} ({}) [{}]", theorem.name.trim(), kind, theorem.category.trim())
    };
    block.push_str("\nStatement:\n");
    block.push_str(theorem.statement.trim());

    if with_details {
        if let Some(proof) = theorem.proof_text() {
            block.push_str("\n\nProof:\n");
            block.push_str(proof);
        }
        if let Some(notes) = theorem.notes_text() {
            block.push_str("\n\nNotes:\n");
            block.push_str(notes);
        }
    }
    block
}
