//! Topic taxonomy: categories and their subtypes

use super::{null_as_default, CorpusMetadata};
use crate::text::{label_tokens, OrderedTermSet};
use serde::{Deserialize, Serialize};

/// Ordered category hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(flatten)]
    pub metadata: CorpusMetadata,

    #[serde(rename = "categorie", alias = "categories")]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "nome", alias = "name", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[serde(rename = "sottotipi", alias = "subtypes", default, deserialize_with = "null_as_default")]
    pub subtypes: Vec<Subtype>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtype {
    #[serde(rename = "nome", alias = "name", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

impl Taxonomy {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn subtype_count(&self) -> usize {
        self.categories.iter().map(|c| c.subtypes.len()).sum()
    }
}

impl Category {
    /// Name, keywords and name words, lowercased
    pub fn searchable_terms(&self) -> Vec<String> {
        node_terms(&self.name, &self.keywords)
    }

    /// Lowercased keywords only, without the label
    pub fn keyword_terms(&self) -> Vec<String> {
        lowercase_keywords(&self.keywords)
    }
}

impl Subtype {
    pub fn searchable_terms(&self) -> Vec<String> {
        node_terms(&self.name, &self.keywords)
    }
}

fn node_terms(name: &str, keywords: &[String]) -> Vec<String> {
    let mut terms = OrderedTermSet::new();
    terms.insert(&name.to_lowercase());
    terms.extend(lowercase_keywords(keywords));
    terms.extend(label_tokens(name));
    terms.into_vec()
}

fn lowercase_keywords(keywords: &[String]) -> Vec<String> {
    let mut terms = OrderedTermSet::new();
    terms.extend(keywords.iter().map(|k| k.to_lowercase()));
    terms.into_vec()
}
