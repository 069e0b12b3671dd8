//! Worked exercise entity

use super::{non_blank, null_as_default, CorpusMetadata};
use crate::text::{label_tokens, OrderedTermSet};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A worked exercise from the bundled corpus
///
/// Field names follow the corpus documents (`categoria`, `testo`, ...);
/// English names are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Exercise {
    #[validate(custom(function = "non_blank"))]
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[validate(custom(function = "non_blank"))]
    #[serde(rename = "categoria", alias = "category", default, deserialize_with = "null_as_default")]
    pub category: String,

    #[serde(rename = "sottotipo", alias = "subtype", default, deserialize_with = "null_as_default")]
    pub subtype: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[validate(custom(function = "non_blank"))]
    #[serde(rename = "testo", alias = "problem_text", default, deserialize_with = "null_as_default")]
    pub problem_text: String,

    #[validate(custom(function = "non_blank"))]
    #[serde(rename = "svolgimento", alias = "worked_solution", default, deserialize_with = "null_as_default")]
    pub worked_solution: String,
}

impl Exercise {
    /// Terms under which this exercise is indexed.
    ///
    /// Lowercased keywords, the full category and subtype labels, and the
    /// individual words of both labels. Order is stable, no duplicates.
    pub fn searchable_terms(&self) -> Vec<String> {
        let mut terms = OrderedTermSet::new();
        terms.extend(self.keywords.iter().map(|k| k.to_lowercase()));
        terms.insert(&self.category.to_lowercase());
        terms.insert(&self.subtype.to_lowercase());
        terms.extend(label_tokens(&self.category));
        terms.extend(label_tokens(&self.subtype));
        terms.into_vec()
    }
}

/// Decoded exercise corpus
#[derive(Debug, Clone, Default)]
pub struct ExerciseCollection {
    pub metadata: CorpusMetadata,

    /// Cap declared by the document itself, if any
    pub declared_max: Option<usize>,

    pub exercises: Vec<Exercise>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_searchable_terms() {
        let exercise = Exercise {
            id: "EDO-001".into(),
            category: "Equazioni Differenziali".into(),
            subtype: "Lineari I Ordine".into(),
            keywords: vec!["Lineare".into(), "primo ordine".into(), "lineare".into()],
            problem_text: "y' + y = 0".into(),
            worked_solution: "y = Ce^{-x}".into(),
        };

        let terms = exercise.searchable_terms();
        assert_eq!(
            terms,
            vec![
                "lineare",
                "primo ordine",
                "equazioni differenziali",
                "lineari i ordine",
                "equazioni",
                "differenziali",
                "lineari",
                "ordine",
            ]
        );
    }

    #[test]
    fn test_lenient_decoding() {
        let json = r#"{"id": "A-1", "categoria": "Limiti", "keywords": null, "extra": 42}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.id, "A-1");
        assert_eq!(exercise.category, "Limiti");
        assert!(exercise.keywords.is_empty());
        assert!(exercise.subtype.is_empty());
    }

    #[test]
    fn test_english_aliases() {
        let json = r#"{"id": "A-2", "category": "Limits", "problem_text": "lim x", "worked_solution": "0"}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.category, "Limits");
        assert_eq!(exercise.worked_solution, "0");
    }
}
