//! Taxonomy synchronization
//!
//! Derives the category hierarchy from the categories and subtypes that
//! actually occur in the exercise corpus, merged with an optional authored
//! taxonomy. The result never lacks a category the corpus uses, and never
//! loses one the authored taxonomy declared.

use crate::models::{Category, Exercise, Subtype, Taxonomy};
use crate::text::{label_tokens, normalize_key, OrderedTermSet};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Diagnostics for one synchronization run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaxonomySyncReport {
    /// Corpus categories with no authored counterpart
    pub categories_synthesized: usize,
    /// Corpus categories merged into an authored one
    pub categories_reused: usize,
    /// Authored categories no exercise uses, kept untouched
    pub categories_preserved: usize,
    pub subtypes_synthesized: usize,
    pub subtypes_reused: usize,
    pub subtypes_preserved: usize,
}

/// Synchronized taxonomy plus how it was built
#[derive(Debug, Clone)]
pub struct TaxonomySync {
    pub taxonomy: Taxonomy,
    pub report: TaxonomySyncReport,
}

/// Exercises sharing a normalized label, in corpus order
struct Group<'a> {
    label: String,
    members: Vec<&'a Exercise>,
}

/// Group by normalized label, keeping first-appearance order
fn group_by<'a, F>(exercises: &[&'a Exercise], label_of: F) -> (Vec<Group<'a>>, HashMap<String, usize>)
where
    F: Fn(&Exercise) -> &str,
{
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for &exercise in exercises {
        let label = label_of(exercise);
        let key = normalize_key(label);
        if key.is_empty() {
            continue;
        }
        match positions.get(&key) {
            Some(&pos) => groups[pos].members.push(exercise),
            None => {
                positions.insert(key, groups.len());
                groups.push(Group {
                    label: label.trim().to_string(),
                    members: vec![exercise],
                });
            }
        }
    }

    (groups, positions)
}

fn merged_keywords(name: &str, base: &[String], members: &[&Exercise]) -> Vec<String> {
    let mut keywords = OrderedTermSet::new();
    keywords.extend(base);
    for exercise in members {
        keywords.extend(&exercise.keywords);
    }
    keywords.extend(label_tokens(name));
    keywords.into_vec()
}

/// Build a taxonomy covering every category/subtype in `exercises`.
///
/// Authored entries keep their position and name and gain the keywords
/// harvested from member exercises; unused authored entries are kept as is;
/// new entries are appended in corpus order. Arguments are not modified and
/// the output depends only on them.
pub fn synchronize_taxonomy_with_exercises(
    base: Option<&Taxonomy>,
    exercises: &[Exercise],
) -> TaxonomySync {
    let refs: Vec<&Exercise> = exercises.iter().collect();
    let (groups, positions) = group_by(&refs, |e| e.category.as_str());

    let mut report = TaxonomySyncReport::default();
    let mut used = vec![false; groups.len()];
    let mut categories = Vec::new();

    for authored in base.map(|t| t.categories.as_slice()).unwrap_or_default() {
        let slot = positions
            .get(&normalize_key(&authored.name))
            .copied()
            .filter(|&pos| !used[pos]);
        match slot {
            Some(pos) => {
                used[pos] = true;
                report.categories_reused += 1;
                categories.push(merge_category(Some(authored), &groups[pos], &mut report));
            }
            None => {
                report.categories_preserved += 1;
                report.subtypes_preserved += authored.subtypes.len();
                categories.push(authored.clone());
            }
        }
    }

    for (pos, group) in groups.iter().enumerate() {
        if !used[pos] {
            report.categories_synthesized += 1;
            categories.push(merge_category(None, group, &mut report));
        }
    }

    info!(
        categories = categories.len(),
        synthesized = report.categories_synthesized,
        reused = report.categories_reused,
        preserved = report.categories_preserved,
        subtypes_synthesized = report.subtypes_synthesized,
        subtypes_reused = report.subtypes_reused,
        "Taxonomy synchronized with exercise corpus"
    );

    TaxonomySync {
        taxonomy: Taxonomy {
            metadata: base.map(|t| t.metadata.clone()).unwrap_or_default(),
            categories,
        },
        report,
    }
}

fn merge_category(
    authored: Option<&Category>,
    group: &Group<'_>,
    report: &mut TaxonomySyncReport,
) -> Category {
    let name = authored.map_or(group.label.as_str(), |c| c.name.as_str()).to_string();
    let base_keywords = authored.map(|c| c.keywords.as_slice()).unwrap_or_default();
    let keywords = merged_keywords(&name, base_keywords, &group.members);

    let (subgroups, positions) = group_by(&group.members, |e| e.subtype.as_str());
    let mut used = vec![false; subgroups.len()];
    let mut subtypes = Vec::new();

    for authored_sub in authored.map(|c| c.subtypes.as_slice()).unwrap_or_default() {
        let slot = positions
            .get(&normalize_key(&authored_sub.name))
            .copied()
            .filter(|&pos| !used[pos]);
        match slot {
            Some(pos) => {
                used[pos] = true;
                report.subtypes_reused += 1;
                subtypes.push(Subtype {
                    name: authored_sub.name.clone(),
                    keywords: merged_keywords(
                        &authored_sub.name,
                        &authored_sub.keywords,
                        &subgroups[pos].members,
                    ),
                });
            }
            None => {
                report.subtypes_preserved += 1;
                subtypes.push(authored_sub.clone());
            }
        }
    }

    for (pos, subgroup) in subgroups.iter().enumerate() {
        if !used[pos] {
            report.subtypes_synthesized += 1;
            subtypes.push(Subtype {
                name: subgroup.label.clone(),
                keywords: merged_keywords(&subgroup.label, &[], &subgroup.members),
            });
        }
    }

    Category {
        name,
        keywords,
        subtypes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: &str, category: &str, subtype: &str, keywords: &[&str]) -> Exercise {
        Exercise {
            id: id.into(),
            category: category.into(),
            subtype: subtype.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            problem_text: "p".into(),
            worked_solution: "s".into(),
        }
    }

    fn corpus() -> Vec<Exercise> {
        vec![
            exercise("EDO-001", "Equazioni Differenziali", "Lineari I Ordine", &["lineare", "primo ordine"]),
            exercise("LIM-001", "Limiti", "Notevoli", &["limite notevole"]),
            exercise("EDO-002", " equazioni differenziali ", "Separabili", &["separabile", "lineare"]),
            exercise("EDO-003", "Equazioni Differenziali", "lineari i ordine", &["fattore integrante"]),
        ]
    }

    #[test]
    fn test_synthesize_without_base() {
        let sync = synchronize_taxonomy_with_exercises(None, &corpus());
        let taxonomy = &sync.taxonomy;

        assert_eq!(taxonomy.categories.len(), 2);
        let edo = &taxonomy.categories[0];
        assert_eq!(edo.name, "Equazioni Differenziali");
        assert_eq!(
            edo.keywords,
            vec!["lineare", "primo ordine", "separabile", "fattore integrante", "equazioni", "differenziali"]
        );
        assert_eq!(edo.subtypes.len(), 2);
        assert_eq!(edo.subtypes[0].name, "Lineari I Ordine");
        assert_eq!(
            edo.subtypes[0].keywords,
            vec!["lineare", "primo ordine", "fattore integrante", "lineari", "ordine"]
        );
        assert_eq!(taxonomy.categories[1].name, "Limiti");

        assert_eq!(sync.report.categories_synthesized, 2);
        assert_eq!(sync.report.categories_reused, 0);
        assert_eq!(sync.report.subtypes_synthesized, 3);
    }

    #[test]
    fn test_merge_with_base_preserves_unused_entries() {
        let base = Taxonomy {
            metadata: Default::default(),
            categories: vec![
                Category {
                    name: "Integrali".into(),
                    keywords: vec!["integrale".into()],
                    subtypes: vec![Subtype { name: "Per Parti".into(), keywords: vec![] }],
                },
                Category {
                    name: "LIMITI".into(),
                    keywords: vec!["limite".into()],
                    subtypes: vec![
                        Subtype { name: "notevoli".into(), keywords: vec!["sin x / x".into()] },
                        Subtype { name: "Asintoti".into(), keywords: vec![] },
                    ],
                },
            ],
        };
        let before = base.clone();

        let sync = synchronize_taxonomy_with_exercises(Some(&base), &corpus());
        let names: Vec<&str> = sync.taxonomy.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Integrali", "LIMITI", "Equazioni Differenziali"]);

        let limiti = &sync.taxonomy.categories[1];
        assert_eq!(limiti.keywords, vec!["limite", "limite notevole", "limiti"]);
        assert_eq!(limiti.subtypes[0].name, "notevoli");
        assert_eq!(limiti.subtypes[0].keywords, vec!["sin x / x", "limite notevole", "notevoli"]);
        assert_eq!(limiti.subtypes[1].name, "Asintoti");

        assert_eq!(sync.report.categories_reused, 1);
        assert_eq!(sync.report.categories_synthesized, 1);
        assert_eq!(sync.report.categories_preserved, 1);
        assert_eq!(sync.report.subtypes_reused, 1);
        assert_eq!(sync.report.subtypes_preserved, 2);
        assert_eq!(base, before);
    }

    #[test]
    fn test_deterministic() {
        let a = synchronize_taxonomy_with_exercises(None, &corpus());
        let b = synchronize_taxonomy_with_exercises(None, &corpus());
        assert_eq!(a.taxonomy, b.taxonomy);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn test_blank_categories_skipped() {
        let exercises = vec![exercise("X", "  ", "", &["a"])];
        let sync = synchronize_taxonomy_with_exercises(None, &exercises);
        assert!(sync.taxonomy.is_empty());
    }
}
