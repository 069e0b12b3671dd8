//! Theorem / definition entity

use super::{non_blank, null_as_default, CorpusMetadata};
use crate::text::{label_tokens, raw_words, OrderedTermSet};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A theorem, definition or property from the bundled corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Theorem {
    #[validate(custom(function = "non_blank"))]
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[validate(custom(function = "non_blank"))]
    #[serde(rename = "nome", alias = "name", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "categoria", alias = "category", default, deserialize_with = "null_as_default")]
    pub category: String,

    /// "teorema", "definizione", "proprietà", ...
    #[serde(rename = "tipo", alias = "kind", default, deserialize_with = "null_as_default")]
    pub kind: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[validate(custom(function = "non_blank"))]
    #[serde(rename = "enunciato", alias = "statement", default, deserialize_with = "null_as_default")]
    pub statement: String,

    #[serde(rename = "dimostrazione", alias = "proof", default)]
    pub proof: Option<String>,

    #[serde(rename = "note", alias = "notes", default)]
    pub notes: Option<String>,
}

impl Theorem {
    /// Terms under which this theorem is indexed.
    ///
    /// Same shape as exercises, plus the name both as raw words
    /// ("l'hôpital") and as alphanumeric tokens ("hôpital").
    pub fn searchable_terms(&self) -> Vec<String> {
        let mut terms = OrderedTermSet::new();
        terms.extend(self.keywords.iter().map(|k| k.to_lowercase()));
        terms.insert(&self.category.to_lowercase());
        terms.insert(&self.name.to_lowercase());
        terms.extend(label_tokens(&self.category));
        terms.extend(raw_words(&self.name));
        terms.extend(label_tokens(&self.name));
        terms.into_vec()
    }

    /// Proof text, if present and non-blank
    pub fn proof_text(&self) -> Option<&str> {
        self.proof.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Notes text, if present and non-blank
    pub fn notes_text(&self) -> Option<&str> {
        self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Decoded theorem corpus
#[derive(Debug, Clone, Default)]
pub struct TheoremCollection {
    pub metadata: CorpusMetadata,
    pub theorems: Vec<Theorem>,
}
