//! Query classification
//!
//! Two independent, rule-based classifiers:
//! - content type (exercise vs theorem) from indicator words
//! - taxonomy category/subtype from term overlap

use mathrag_common::models::{ClassificationResult, ContentType, Taxonomy};
use mathrag_common::text::contains_either;
use tracing::debug;

/// Words that ask for a statement, definition or proof (English, Italian)
const THEOREM_INDICATORS: &[&str] = &[
    "theorem",
    "prove",
    "define",
    "corollary",
    "lemma",
    "teorema",
    "dimostra",
    "definizione",
    "enunciato",
    "corollario",
    "proprietà",
];

/// Words that ask for a computation
const EXERCISE_INDICATORS: &[&str] = &[
    "solve",
    "calculate",
    "find",
    "determine",
    "integral",
    "limit",
    "risolvi",
    "calcola",
    "trova",
    "determina",
    "integrale",
    "limite",
    "derivata",
    "equazione",
];

/// Requests for a derivation; always exercises
const DERIVATION_PHRASES: &[&str] = &["prove that", "dimostra che", "dimostrare che"];

/// Earliest byte offset of any indicator in `haystack`
fn earliest(haystack: &str, indicators: &[&str]) -> Option<usize> {
    indicators.iter().filter_map(|word| haystack.find(word)).min()
}

/// Classify what a query is asking for.
///
/// When both kinds of indicator occur, the one mentioned first wins.
pub fn classify_query_type(query: &str) -> ContentType {
    let lowered = query.to_lowercase();
    if DERIVATION_PHRASES.iter().any(|phrase| lowered.contains(phrase)) {
        return ContentType::Exercise;
    }

    let content_type = match (
        earliest(&lowered, THEOREM_INDICATORS),
        earliest(&lowered, EXERCISE_INDICATORS),
    ) {
        (Some(theorem), Some(exercise)) if theorem < exercise => ContentType::Theorem,
        (Some(_), Some(_)) => ContentType::Exercise,
        (Some(_), None) => ContentType::Theorem,
        (None, Some(_)) => ContentType::Exercise,
        (None, None) => ContentType::Unknown,
    };
    debug!(?content_type, "Classified query type");
    content_type
}

#[derive(Debug, Clone)]
struct SubtypeProfile {
    name: String,
    terms: Vec<String>,
}

#[derive(Debug, Clone)]
struct CategoryProfile {
    name: String,
    terms: Vec<String>,
    keywords: Vec<String>,
    subtypes: Vec<SubtypeProfile>,
}

/// Matches query terms against a taxonomy, terms precomputed once
#[derive(Debug, Clone, Default)]
pub struct TaxonomyClassifier {
    categories: Vec<CategoryProfile>,
}

impl TaxonomyClassifier {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let categories = taxonomy
            .categories
            .iter()
            .map(|category| CategoryProfile {
                name: category.name.clone(),
                terms: category.searchable_terms(),
                keywords: category.keyword_terms(),
                subtypes: category
                    .subtypes
                    .iter()
                    .map(|subtype| SubtypeProfile {
                        name: subtype.name.clone(),
                        terms: subtype.searchable_terms(),
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Best category, then best subtype within it.
    ///
    /// Ties go to the earlier entry in taxonomy order. Confidence depends only
    /// on how many of the category's own keywords the query hits.
    pub fn classify(&self, query_terms: &[String]) -> ClassificationResult {
        let Some(category) = best_match(&self.categories, |c| &c.terms, query_terms) else {
            return ClassificationResult::unclassified();
        };

        let subtype = best_match(&category.subtypes, |s| &s.terms, query_terms);

        let matched_keywords: Vec<String> = category
            .keywords
            .iter()
            .filter(|keyword| query_terms.iter().any(|term| contains_either(term, keyword)))
            .cloned()
            .collect();

        let confidence = match matched_keywords.len() {
            0 => 0.3,
            1 => 0.5,
            2 => 0.7,
            _ => 0.9,
        };

        debug!(
            category = %category.name,
            subtype = subtype.map(|s| s.name.as_str()),
            confidence,
            "Classified query against taxonomy"
        );

        ClassificationResult {
            category: Some(category.name.clone()),
            subtype: subtype.map(|s| s.name.clone()),
            confidence,
            matched_keywords,
        }
    }
}

/// Number of query terms with a containment match in `terms`
fn overlap(query_terms: &[String], terms: &[String]) -> usize {
    query_terms
        .iter()
        .filter(|query_term| terms.iter().any(|term| contains_either(query_term, term)))
        .count()
}

fn best_match<'a, T, F>(candidates: &'a [T], terms_of: F, query_terms: &[String]) -> Option<&'a T>
where
    F: Fn(&T) -> &Vec<String>,
{
    let mut best: Option<(&T, usize)> = None;
    for candidate in candidates {
        let count = overlap(query_terms, terms_of(candidate));
        if count > best.map_or(0, |(_, top)| top) {
            best = Some((candidate, count));
        }
    }
    best.map(|(candidate, _)| candidate)
}
