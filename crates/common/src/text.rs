//! Text normalization shared by indexing, classification and ranking
//!
//! Every term that enters a keyword index or is compared against one passes
//! through these helpers, so index keys and query terms agree on casing and
//! token boundaries.

use std::collections::HashSet;

/// Minimum token length (in chars) is strictly greater than this
pub const MIN_TERM_LEN: usize = 2;

/// Math-markup characters dropped from queries before tokenizing
const MARKUP_CHARS: &[char] = &['$', '\\', '{', '}', '^', '_'];

/// Extract query terms: lowercase, strip math markup, split on anything
/// that is not alphanumeric, keep tokens longer than two chars.
///
/// Terms are deduplicated, first occurrence wins.
pub fn query_terms(query: &str) -> Vec<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| !MARKUP_CHARS.contains(c))
        .collect();
    unique_tokens(&cleaned)
}

/// Tokenize a label (category, subtype, theorem name) into index words
pub fn label_tokens(label: &str) -> Vec<String> {
    unique_tokens(&label.to_lowercase())
}

/// Lowercased whitespace-separated words, punctuation kept.
///
/// Used for theorem names, where a word like "l'hôpital" should survive
/// intact next to its tokenized parts.
pub fn raw_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_TERM_LEN)
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

/// Case-insensitive, whitespace-trimmed key for grouping labels
pub fn normalize_key(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Containment match in either direction
pub fn contains_either(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Truncate to at most `max_chars` chars, appending an ellipsis when cut.
///
/// The ellipsis counts toward the limit.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

fn unique_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > MIN_TERM_LEN)
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

/// Ordered set: insertion order iteration, no blanks, no duplicates
#[derive(Debug, Clone, Default)]
pub struct OrderedTermSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedTermSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a trimmed value; blank and already-present values are ignored
    pub fn insert(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.seen.contains(value) {
            return false;
        }
        self.seen.insert(value.to_string());
        self.items.push(value.to_string());
        true
    }

    pub fn extend<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.insert(value.as_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_terms_strip_markup() {
        let terms = query_terms(r"Calcola $\int_0^1 x^2 dx$ per favore");
        assert_eq!(terms, vec!["calcola", "int01", "per", "favore"]);
    }

    #[test]
    fn test_query_terms_split_apostrophes_and_dedupe() {
        let terms = query_terms("Risolvere l'equazione, l'equazione differenziale!");
        assert_eq!(terms, vec!["risolvere", "equazione", "differenziale"]);
    }

    #[test]
    fn test_label_tokens_keep_accents() {
        assert_eq!(label_tokens("Probabilità e Statistica"), vec!["probabilità", "statistica"]);
    }

    #[test]
    fn test_raw_words() {
        assert_eq!(raw_words("Teorema di De L'Hôpital"), vec!["teorema", "l'hôpital"]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        let cut = truncate_chars("abcdefgh", 5);
        assert_eq!(cut, "abcd…");
        assert_eq!(cut.chars().count(), 5);
    }

    #[test]
    fn test_ordered_term_set() {
        let mut set = OrderedTermSet::new();
        set.extend(["b", " a ", "", "b", "c"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.into_vec(), vec!["b", "a", "c"]);
    }
}
