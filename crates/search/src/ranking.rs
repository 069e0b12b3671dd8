//! Classification-aware re-ranking of exercise candidates

use crate::index::Indexed;
use mathrag_common::config::RetrievalConfig;
use mathrag_common::models::{ClassificationResult, Exercise};
use mathrag_common::text::{contains_either, normalize_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingWeights {
    pub category_bonus: u32,
    pub subtype_bonus: u32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for RankingWeights {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            category_bonus: config.category_bonus,
            subtype_bonus: config.subtype_bonus,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedExercise<'a> {
    pub exercise: &'a Exercise,
    pub score: u32,
}

fn same_label(label: &str, classified: Option<&str>) -> bool {
    classified.is_some_and(|name| normalize_key(label) == normalize_key(name))
}

/// Re-score candidates by classification agreement and term overlap.
///
/// Candidates are expected in candidate-score order; the sort is stable, so
/// that order breaks ties.
pub fn rank_exercises<'a>(
    candidates: &[&'a Indexed<Exercise>],
    classification: &ClassificationResult,
    query_terms: &[String],
    weights: RankingWeights,
) -> Vec<RankedExercise<'a>> {
    let mut ranked: Vec<RankedExercise<'a>> = candidates
        .iter()
        .map(|candidate| {
            let exercise = &candidate.entity;
            let mut score = 0;
            if same_label(&exercise.category, classification.category.as_deref()) {
                score += weights.category_bonus;
            }
            if same_label(&exercise.subtype, classification.subtype.as_deref()) {
                score += weights.subtype_bonus;
            }
            let term_hits = query_terms
                .iter()
                .filter(|query_term| candidate.terms.iter().any(|term| contains_either(query_term, term)))
                .count();
            score += term_hits as u32;

            RankedExercise { exercise, score }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(id: &str, category: &str, subtype: &str, keywords: &[&str]) -> Indexed<Exercise> {
        let entity = Exercise {
            id: id.into(),
            category: category.into(),
            subtype: subtype.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            problem_text: "p".into(),
            worked_solution: "s".into(),
        };
        let terms = entity.searchable_terms();
        Indexed { entity, terms }
    }

    fn classification(category: &str, subtype: Option<&str>) -> ClassificationResult {
        ClassificationResult {
            category: Some(category.into()),
            subtype: subtype.map(str::to_string),
            confidence: 0.5,
            matched_keywords: vec![],
        }
    }

    #[test]
    fn test_category_and_subtype_bonus() {
        let a = indexed("LIM-001", "Limiti", "Notevoli", &["limite"]);
        let b = indexed("INT-001", "Integrali", "Per Parti", &["integrale"]);
        let c = indexed("INT-002", "integrali", "Sostituzione", &["integrale"]);
        let terms = vec!["integrale".to_string()];

        let ranked = rank_exercises(
            &[&a, &c, &b],
            &classification("Integrali", Some("Per Parti")),
            &terms,
            RankingWeights::default(),
        );

        let ids: Vec<&str> = ranked.iter().map(|r| r.exercise.id.as_str()).collect();
        assert_eq!(ids, vec!["INT-001", "INT-002", "LIM-001"]);
        assert_eq!(ranked[0].score, 10 + 5 + 1);
        assert_eq!(ranked[1].score, 10 + 1);
        assert_eq!(ranked[2].score, 0);
    }

    #[test]
    fn test_stable_on_ties() {
        let a = indexed("EX-B", "Limiti", "Notevoli", &["limite"]);
        let b = indexed("EX-A", "Limiti", "Notevoli", &["limite"]);
        let terms = vec!["limite".to_string()];

        let ranked = rank_exercises(&[&a, &b], &ClassificationResult::unclassified(), &terms, RankingWeights::default());
        let ids: Vec<&str> = ranked.iter().map(|r| r.exercise.id.as_str()).collect();
        assert_eq!(ids, vec!["EX-B", "EX-A"]);
    }
}
