//! Inverted keyword index
//!
//! Maps each searchable term to the ids of the entities carrying it. Built
//! once per corpus load and never mutated afterwards.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// An entity with its precomputed searchable terms
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    pub entity: T,
    pub terms: Vec<String>,
}

/// Points awarded per matching bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchWeights {
    /// Query term equals the index key
    pub exact: u32,
    /// One of query term / index key contains the other
    pub fuzzy: u32,
}

/// Term -> entity ids
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    buckets: BTreeMap<String, Vec<String>>,
}

impl KeywordIndex {
    /// Invert `(id, terms)` pairs. Bucket order follows entry order.
    pub fn build<'a, I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, T)>,
        T: IntoIterator<Item = &'a String>,
    {
        let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (id, terms) in entries {
            for term in terms {
                let bucket = buckets.entry(term.clone()).or_default();
                if !bucket.iter().any(|existing| existing == id) {
                    bucket.push(id.to_string());
                }
            }
        }
        Self { buckets }
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total (term, id) pairs
    pub fn posting_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Ids indexed under exactly `term`
    pub fn exact(&self, term: &str) -> &[String] {
        self.buckets.get(term).map(Vec::as_slice).unwrap_or_default()
    }

    /// Buckets whose key contains `term` or is contained in it, exact key excluded.
    ///
    /// Scans the whole key space; fine for a corpus of a few hundred entities.
    pub fn fuzzy<'a>(&'a self, term: &'a str) -> impl Iterator<Item = (&'a str, &'a [String])> + 'a {
        self.buckets
            .iter()
            .filter(move |(key, _)| key.as_str() != term && (key.contains(term) || term.contains(key.as_str())))
            .map(|(key, ids)| (key.as_str(), ids.as_slice()))
    }

    /// Accumulate exact and fuzzy scores for every query term
    pub fn score(&self, terms: &[String], weights: MatchWeights) -> ScoreBoard {
        let mut board = ScoreBoard::default();
        for term in terms {
            for id in self.exact(term) {
                board.add(id, weights.exact);
            }
            for (_, ids) in self.fuzzy(term) {
                for id in ids {
                    board.add(id, weights.fuzzy);
                }
            }
        }
        board
    }
}

/// Accumulated scores, remembering the order ids were first seen
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    scores: HashMap<String, u32>,
    discovery: Vec<String>,
}

impl ScoreBoard {
    pub fn add(&mut self, id: &str, points: u32) {
        match self.scores.get_mut(id) {
            Some(score) => *score += points,
            None => {
                self.scores.insert(id.to_string(), points);
                self.discovery.push(id.to_string());
            }
        }
    }

    pub fn score(&self, id: &str) -> u32 {
        self.scores.get(id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.positive().next().is_none()
    }

    /// Highest score; ties go to the id discovered first
    pub fn best(&self) -> Option<(&str, u32)> {
        let mut best: Option<(&str, u32)> = None;
        for (id, score) in self.positive() {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((id, score));
            }
        }
        best
    }

    /// Positive-score ids, score descending then id ascending
    pub fn ranked(&self) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .positive()
            .map(|(id, score)| (id.to_string(), score))
            .collect();
        out.sort_by(|a, b| match b.1.cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        out
    }

    fn positive(&self) -> impl Iterator<Item = (&str, u32)> {
        self.discovery
            .iter()
            .map(|id| (id.as_str(), self.score(id)))
            .filter(|(_, score)| *score > 0)
    }
}
