//! Metrics and observability utilities
//!
//! Metric names share the `mathrag` prefix. Without an installed recorder
//! every helper is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all MathRAG metrics
pub const METRICS_PREFIX: &str = "mathrag";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total exercise retrieval queries by outcome"
    );

    describe_histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Exercise retrieval latency in seconds"
    );

    describe_counter!(
        format!("{}_theorem_lookups_total", METRICS_PREFIX),
        Unit::Count,
        "Total theorem lookups by outcome"
    );

    describe_histogram!(
        format!("{}_initialization_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Corpus load and index build latency in seconds"
    );

    describe_gauge!(
        format!("{}_corpus_entities", METRICS_PREFIX),
        Unit::Count,
        "Entities loaded per corpus"
    );

    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    describe_counter!(
        format!("{}_prompt_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Context blocks rendered through a truncation fallback"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record an exercise retrieval
pub fn record_query(duration_secs: f64, outcome: &str) {
    counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(format!("{}_query_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record a theorem lookup
pub fn record_theorem_lookup(found: bool) {
    let outcome = if found { "found" } else { "not_found" };
    counter!(
        format!("{}_theorem_lookups_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record a completed initialization
pub fn record_initialization(duration_secs: f64, exercises: usize, theorems: usize) {
    histogram!(format!("{}_initialization_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(
        format!("{}_corpus_entities", METRICS_PREFIX),
        "corpus" => "exercise"
    )
    .set(exercises as f64);

    gauge!(
        format!("{}_corpus_entities", METRICS_PREFIX),
        "corpus" => "theorem"
    )
    .set(theorems as f64);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

/// Helper to record a prompt truncation fallback ("first_only", "summary")
pub fn record_prompt_fallback(level: &str) {
    counter!(
        format!("{}_prompt_fallbacks_total", METRICS_PREFIX),
        "level" => level.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_without_recorder() {
        // No recorder installed: helpers must be no-ops
        register_metrics();
        record_query(0.001, "success");
        record_theorem_lookup(true);
        record_initialization(0.01, 3, 2);
        record_cache(false, "rag_query");
        record_prompt_fallback("summary");
    }
}
