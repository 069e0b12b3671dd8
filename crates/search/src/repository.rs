//! RAG Repository - the query-time entry point
//!
//! Owns the loaded corpora, their keyword indexes, the taxonomy and the
//! query cache. Loading happens once, lazily or through an explicit
//! `initialize()`; afterwards the corpus snapshot is read-only and shared
//! without locking.
//!
//! Lifecycle: `Uninitialized -> Initializing -> Ready | Failed`. A failed
//! initialization is final for the instance.

use crate::classify::{classify_query_type, TaxonomyClassifier};
use crate::index::{Indexed, KeywordIndex, MatchWeights};
use crate::ranking::{rank_exercises, RankingWeights};
use mathrag_common::cache::QueryCache;
use mathrag_common::config::{AppConfig, CorpusConfig, RetrievalConfig};
use mathrag_common::corpus::{
    parse_exercises_capped, parse_taxonomy, parse_theorems_capped,
    synchronize_taxonomy_with_exercises, validate_exercise, validate_theorem, CorpusSource,
    TaxonomySyncReport,
};
use mathrag_common::errors::{AppError, Result};
use mathrag_common::metrics::{record_initialization, record_query, record_theorem_lookup};
use mathrag_common::models::{
    ClassificationResult, ContentType, CorpusMetadata, Exercise, RagResult, Taxonomy, Theorem,
    TheoremResult,
};
use mathrag_common::text::query_terms;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Diagnostic key -> value
pub type Stats = BTreeMap<String, Value>;

const QUERY_CACHE_NAME: &str = "rag_query";

/// Repository lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl RepositoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryState::Uninitialized => "uninitialized",
            RepositoryState::Initializing => "initializing",
            RepositoryState::Ready => "ready",
            RepositoryState::Failed => "failed",
        }
    }
}

/// One loaded, validated and indexed corpus
#[derive(Debug)]
struct IndexedCorpus<T> {
    metadata: CorpusMetadata,
    entries: Vec<Indexed<T>>,
    positions: HashMap<String, usize>,
    index: KeywordIndex,
    dropped: usize,
}

trait CorpusEntity {
    fn id(&self) -> &str;
    fn searchable_terms(&self) -> Vec<String>;
}

impl CorpusEntity for Exercise {
    fn id(&self) -> &str {
        &self.id
    }

    fn searchable_terms(&self) -> Vec<String> {
        Exercise::searchable_terms(self)
    }
}

impl CorpusEntity for Theorem {
    fn id(&self) -> &str {
        &self.id
    }

    fn searchable_terms(&self) -> Vec<String> {
        Theorem::searchable_terms(self)
    }
}

impl<T: CorpusEntity> IndexedCorpus<T> {
    /// Drop invalid and duplicate-id entities, then index the rest
    fn build(corpus: &'static str, metadata: CorpusMetadata, entities: Vec<T>, is_valid: fn(&T) -> bool) -> Self {
        let total = entities.len();
        let mut entries = Vec::with_capacity(total);
        let mut positions = HashMap::with_capacity(total);

        for entity in entities {
            if !is_valid(&entity) {
                continue;
            }
            if positions.contains_key(entity.id()) {
                warn!(corpus, id = entity.id(), "Duplicate id, keeping first occurrence");
                continue;
            }
            positions.insert(entity.id().to_string(), entries.len());
            let terms = entity.searchable_terms();
            entries.push(Indexed { entity, terms });
        }

        let dropped = total - entries.len();
        if dropped > 0 {
            warn!(corpus, dropped, kept = entries.len(), "Dropped invalid corpus entries");
        }

        let index = KeywordIndex::build(entries.iter().map(|e| (e.entity.id(), &e.terms)));
        if index.is_empty() {
            warn!(corpus, "Keyword index is empty, no query can match this corpus");
        }
        info!(
            corpus,
            entities = entries.len(),
            terms = index.len(),
            postings = index.posting_count(),
            "Keyword index built"
        );

        Self {
            metadata,
            entries,
            positions,
            index,
            dropped,
        }
    }

    fn get(&self, id: &str) -> Option<&Indexed<T>> {
        self.positions.get(id).and_then(|&pos| self.entries.get(pos))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Everything built by a successful initialization
#[derive(Debug)]
struct CorpusSnapshot {
    exercises: Option<IndexedCorpus<Exercise>>,
    theorems: Option<IndexedCorpus<Theorem>>,
    taxonomy: Taxonomy,
    classifier: TaxonomyClassifier,
    sync_report: Option<TaxonomySyncReport>,
    declared_max_exercises: Option<usize>,
}

#[derive(Debug, Clone)]
enum InitOutcome {
    Ready(Arc<CorpusSnapshot>),
    Failed(String),
}

/// Raw documents fetched from the source
struct CorpusDocuments {
    exercises: Result<Vec<u8>>,
    theorems: Result<Vec<u8>>,
    taxonomy: Result<Option<Vec<u8>>>,
}

/// Scoring and loading parameters, copied out of the config
#[derive(Debug, Clone)]
struct Settings {
    max_exercises: usize,
    max_theorems: usize,
    synchronize_taxonomy: bool,
    exercise_weights: MatchWeights,
    theorem_weights: MatchWeights,
    ranking: RankingWeights,
}

impl Settings {
    fn new(corpus: &CorpusConfig, retrieval: &RetrievalConfig) -> Self {
        Self {
            max_exercises: corpus.max_exercises,
            max_theorems: corpus.max_theorems,
            synchronize_taxonomy: corpus.synchronize_taxonomy,
            exercise_weights: MatchWeights {
                exact: retrieval.exact_exercise_weight,
                fuzzy: retrieval.fuzzy_weight,
            },
            theorem_weights: MatchWeights {
                exact: retrieval.exact_theorem_weight,
                fuzzy: retrieval.fuzzy_weight,
            },
            ranking: RankingWeights::from(retrieval),
        }
    }
}

/// Resets the initializing flag even if the initializing future is dropped
struct InitializingGuard<'a>(&'a AtomicBool);

impl<'a> InitializingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Retrieval repository over one corpus source
pub struct RagRepository {
    source: Arc<dyn CorpusSource>,
    settings: Arc<Settings>,
    init_lock: Mutex<()>,
    initializing: AtomicBool,
    outcome: OnceLock<InitOutcome>,
    cache: QueryCache<String, RagResult>,
    ranking_runs: AtomicU64,
}

impl RagRepository {
    /// Create an uninitialized repository; nothing is loaded until first use
    pub fn new(source: Arc<dyn CorpusSource>, config: &AppConfig) -> Self {
        let capacity = NonZeroUsize::new(config.retrieval.cache_capacity).unwrap_or_else(|| {
            warn!("Query cache capacity is zero, using 1");
            NonZeroUsize::MIN
        });

        Self {
            source,
            settings: Arc::new(Settings::new(&config.corpus, &config.retrieval)),
            init_lock: Mutex::new(()),
            initializing: AtomicBool::new(false),
            outcome: OnceLock::new(),
            cache: QueryCache::new(QUERY_CACHE_NAME, capacity),
            ranking_runs: AtomicU64::new(0),
        }
    }

    /// Repository with default configuration
    pub fn with_defaults(source: Arc<dyn CorpusSource>) -> Self {
        Self::new(source, &AppConfig::default())
    }

    pub fn state(&self) -> RepositoryState {
        match self.outcome.get() {
            Some(InitOutcome::Ready(_)) => RepositoryState::Ready,
            Some(InitOutcome::Failed(_)) => RepositoryState::Failed,
            None if self.initializing.load(Ordering::SeqCst) => RepositoryState::Initializing,
            None => RepositoryState::Uninitialized,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == RepositoryState::Ready
    }

    /// Load corpora and build indexes, once.
    ///
    /// Concurrent callers wait for the first one and observe its outcome.
    /// Fails only when neither the exercise nor the theorem corpus loads.
    pub async fn initialize(&self) -> Result<()> {
        self.snapshot().await.map(|_| ())
    }

    async fn snapshot(&self) -> Result<Arc<CorpusSnapshot>> {
        if let Some(outcome) = self.outcome.get() {
            return outcome_to_result(outcome);
        }

        let _lock = self.init_lock.lock().await;
        if let Some(outcome) = self.outcome.get() {
            return outcome_to_result(outcome);
        }

        let _initializing = InitializingGuard::enter(&self.initializing);
        let started = Instant::now();
        info!("Initializing RAG repository");

        let outcome = match self.load().await {
            Ok(snapshot) => {
                let exercises = snapshot.exercises.as_ref().map_or(0, IndexedCorpus::len);
                let theorems = snapshot.theorems.as_ref().map_or(0, IndexedCorpus::len);
                let elapsed = started.elapsed();
                record_initialization(elapsed.as_secs_f64(), exercises, theorems);
                info!(
                    exercises,
                    theorems,
                    categories = snapshot.taxonomy.categories.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "RAG repository ready"
                );
                InitOutcome::Ready(Arc::new(snapshot))
            }
            Err(e) => {
                error!(error = %e, "RAG repository initialization failed");
                InitOutcome::Failed(e.to_string())
            }
        };

        // Only the lock holder sets the outcome
        let outcome = self.outcome.get_or_init(|| outcome);
        outcome_to_result(outcome)
    }

    async fn load(&self) -> Result<CorpusSnapshot> {
        let documents = CorpusDocuments {
            exercises: self.source.exercises().await,
            theorems: self.source.theorems().await,
            taxonomy: self.source.taxonomy().await,
        };

        let settings = Arc::clone(&self.settings);
        tokio::task::spawn_blocking(move || build_snapshot(documents, &settings))
            .await
            .map_err(|e| AppError::Initialization {
                message: format!("corpus build task failed: {e}"),
            })?
    }

    /// What kind of content the query asks for; needs no corpus
    pub fn classify_query_type(&self, query: &str) -> ContentType {
        classify_query_type(query)
    }

    /// Taxonomy classification of the query, unclassified if not ready
    pub async fn classify_query(&self, query: &str) -> ClassificationResult {
        match self.snapshot().await {
            Ok(snapshot) => snapshot.classifier.classify(&query_terms(query)),
            Err(_) => ClassificationResult::unclassified(),
        }
    }

    /// Loaded (possibly synchronized) taxonomy
    pub async fn taxonomy(&self) -> Option<Taxonomy> {
        self.snapshot().await.ok().map(|snapshot| snapshot.taxonomy.clone())
    }

    /// Best-scoring theorem for the query
    pub async fn find_theorem(&self, query: &str) -> TheoremResult {
        let result = match self.snapshot().await {
            Ok(snapshot) => lookup_theorem(&snapshot, query, self.settings.theorem_weights),
            Err(e) => TheoremResult::not_found(e.to_string()),
        };
        record_theorem_lookup(result.theorem().is_some());
        result
    }

    /// Top `limit` exercises for the query, cached by exact query text
    pub async fn find_relevant_exercises(&self, query: &str, limit: usize) -> RagResult {
        let started = Instant::now();
        let key = query.to_string();

        if let Some(cached) = self.cache.get(&key).await {
            debug!(outcome = cached.outcome(), "Returning cached retrieval");
            record_query(started.elapsed().as_secs_f64(), cached.outcome());
            return cached;
        }

        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let result = RagResult::error(e);
                record_query(started.elapsed().as_secs_f64(), result.outcome());
                return result;
            }
        };

        self.ranking_runs.fetch_add(1, Ordering::Relaxed);
        let settings = Arc::clone(&self.settings);
        let owned_query = key.clone();
        let result = tokio::task::spawn_blocking(move || retrieve_exercises(&snapshot, &owned_query, limit, &settings))
            .await
            .unwrap_or_else(|e| {
                RagResult::error(AppError::Retrieval {
                    message: format!("ranking task failed: {e}"),
                })
            });

        if !matches!(result, RagResult::Error { .. }) {
            self.cache.put(key, result.clone()).await;
        }

        debug!(
            outcome = result.outcome(),
            exercises = result.exercises().len(),
            "Exercise retrieval finished"
        );
        record_query(started.elapsed().as_secs_f64(), result.outcome());
        result
    }

    /// Drop cached query results (e.g. on a low-memory signal)
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Query cache cleared");
    }

    /// Times the classify/rank path actually ran
    pub fn ranking_runs(&self) -> u64 {
        self.ranking_runs.load(Ordering::Relaxed)
    }

    /// Diagnostics; never triggers initialization
    pub async fn get_stats(&self) -> Stats {
        let mut stats = Stats::new();
        let state = self.state();
        stats.insert("state".into(), json!(state.as_str()));
        stats.insert("initialized".into(), json!(state == RepositoryState::Ready));

        let cache_stats = self.cache.stats().await;
        stats.insert("cache_size".into(), json!(self.cache.len().await));
        stats.insert("cache_capacity".into(), json!(self.cache.capacity().await));
        stats.insert("cache_hits".into(), json!(cache_stats.hits));
        stats.insert("cache_misses".into(), json!(cache_stats.misses));
        stats.insert("cache_evictions".into(), json!(cache_stats.evictions));
        stats.insert("cache_hit_rate".into(), json!(cache_stats.hit_rate()));
        stats.insert("ranking_runs".into(), json!(self.ranking_runs()));

        match self.outcome.get() {
            Some(InitOutcome::Ready(snapshot)) => {
                corpus_stats(&mut stats, "exercise", snapshot.exercises.as_ref());
                corpus_stats(&mut stats, "theorem", snapshot.theorems.as_ref());
                if let Some(declared) = snapshot.declared_max_exercises {
                    stats.insert("exercise_declared_max".into(), json!(declared));
                }
                stats.insert("taxonomy_categories".into(), json!(snapshot.taxonomy.categories.len()));
                stats.insert("taxonomy_subtypes".into(), json!(snapshot.taxonomy.subtype_count()));
                if let Some(report) = &snapshot.sync_report {
                    stats.insert("taxonomy_sync".into(), json!(report));
                }
            }
            Some(InitOutcome::Failed(message)) => {
                stats.insert("initialization_error".into(), json!(message));
            }
            None => {}
        }

        stats
    }
}

fn outcome_to_result(outcome: &InitOutcome) -> Result<Arc<CorpusSnapshot>> {
    match outcome {
        InitOutcome::Ready(snapshot) => Ok(Arc::clone(snapshot)),
        InitOutcome::Failed(message) => Err(AppError::Initialization {
            message: message.clone(),
        }),
    }
}

fn corpus_stats<T>(stats: &mut Stats, corpus: &str, loaded: Option<&IndexedCorpus<T>>) {
    stats.insert(format!("{corpus}_corpus_loaded"), json!(loaded.is_some()));
    stats.insert(format!("{corpus}s_loaded"), json!(loaded.map_or(0, |c| c.entries.len())));
    stats.insert(format!("{corpus}s_dropped"), json!(loaded.map_or(0, |c| c.dropped)));
    stats.insert(format!("{corpus}_index_terms"), json!(loaded.map_or(0, |c| c.index.len())));
    if let Some(corpus_data) = loaded {
        stats.insert(format!("{corpus}_corpus_version"), json!(corpus_data.metadata.version));
    }
}

/// Parse, validate and index the fetched documents
fn build_snapshot(documents: CorpusDocuments, settings: &Settings) -> Result<CorpusSnapshot> {
    let exercises = documents
        .exercises
        .and_then(|bytes| parse_exercises_capped(bytes.as_slice(), settings.max_exercises));
    let theorems = documents
        .theorems
        .and_then(|bytes| parse_theorems_capped(bytes.as_slice(), settings.max_theorems));

    let declared_max_exercises = exercises.as_ref().ok().and_then(|c| c.declared_max);
    let (exercises, theorems) = match (exercises, theorems) {
        (Err(exercise_err), Err(theorem_err)) => {
            return Err(AppError::Initialization {
                message: format!("no corpus could be loaded (exercises: {exercise_err}; theorems: {theorem_err})"),
            });
        }
        (exercises, theorems) => (
            exercises
                .inspect_err(|e| warn!(error = %e, "Exercise corpus unavailable"))
                .ok()
                .map(|c| IndexedCorpus::build("exercise", c.metadata, c.exercises, validate_exercise)),
            theorems
                .inspect_err(|e| warn!(error = %e, "Theorem corpus unavailable"))
                .ok()
                .map(|c| IndexedCorpus::build("theorem", c.metadata, c.theorems, validate_theorem)),
        ),
    };

    let base = match documents.taxonomy {
        Ok(Some(bytes)) => parse_taxonomy(bytes.as_slice())
            .inspect_err(|e| warn!(error = %e, "Taxonomy unavailable, deriving it from exercises"))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Taxonomy source failed, deriving it from exercises");
            None
        }
    };

    let (taxonomy, sync_report) = match (&exercises, settings.synchronize_taxonomy) {
        (Some(corpus), true) => {
            let valid: Vec<Exercise> = corpus.entries.iter().map(|e| e.entity.clone()).collect();
            let sync = synchronize_taxonomy_with_exercises(base.as_ref(), &valid);
            (sync.taxonomy, Some(sync.report))
        }
        _ => (base.unwrap_or_default(), None),
    };
    let classifier = TaxonomyClassifier::new(&taxonomy);

    Ok(CorpusSnapshot {
        exercises,
        theorems,
        taxonomy,
        classifier,
        sync_report,
        declared_max_exercises,
    })
}

fn lookup_theorem(snapshot: &CorpusSnapshot, query: &str, weights: MatchWeights) -> TheoremResult {
    let Some(corpus) = &snapshot.theorems else {
        return TheoremResult::not_found("theorem corpus is not available");
    };

    let terms = query_terms(query);
    if terms.is_empty() {
        return TheoremResult::not_found("query has no searchable terms");
    }

    let board = corpus.index.score(&terms, weights);
    let Some((id, score)) = board.best() else {
        return TheoremResult::not_found("no theorem matches the query terms");
    };

    match corpus.get(id) {
        Some(entry) => {
            debug!(id, score, "Theorem found");
            TheoremResult::Found(entry.entity.clone())
        }
        None => TheoremResult::not_found(format!("indexed theorem {id} is missing")),
    }
}

fn retrieve_exercises(snapshot: &CorpusSnapshot, query: &str, limit: usize, settings: &Settings) -> RagResult {
    let Some(corpus) = &snapshot.exercises else {
        return RagResult::error(AppError::CorpusUnavailable {
            corpus: "exercise".to_string(),
        });
    };

    let terms = query_terms(query);
    let classification = snapshot.classifier.classify(&terms);

    let board = corpus.index.score(&terms, settings.exercise_weights);
    if board.is_empty() {
        return RagResult::no_match("no exercise matches the query terms");
    }
    let candidates: Vec<&Indexed<Exercise>> = board
        .ranked()
        .iter()
        .filter_map(|(id, _)| corpus.get(id))
        .collect();
    debug!(
        terms = terms.len(),
        candidates = candidates.len(),
        category = classification.category.as_deref(),
        "Scored exercise candidates"
    );

    let ranked = rank_exercises(&candidates, &classification, &terms, settings.ranking);
    let exercises: Vec<Exercise> = ranked
        .into_iter()
        .take(limit)
        .map(|r| r.exercise.clone())
        .collect();

    if exercises.is_empty() {
        return RagResult::no_match("no exercise matches the query terms");
    }

    RagResult::Success {
        exercises,
        matched_category: classification.category,
        matched_subtype: classification.subtype,
        confidence: classification.confidence,
    }
}
