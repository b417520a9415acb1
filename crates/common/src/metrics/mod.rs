//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming conventions.

use crate::services::migration::MigrationReport;
use metrics::{counter, describe_counter, describe_histogram, Unit};

/// Metrics prefix for all LitKeep metrics
pub const METRICS_PREFIX: &str = "litkeep";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_article_writes_total", METRICS_PREFIX),
        Unit::Count,
        "Total article create/update/delete operations"
    );

    describe_counter!(
        format!("{}_authors_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total canonical author identities created"
    );

    describe_counter!(
        format!("{}_migrations_total", METRICS_PREFIX),
        Unit::Count,
        "Total session migrations attempted"
    );

    describe_counter!(
        format!("{}_migration_articles_total", METRICS_PREFIX),
        Unit::Count,
        "Per-article migration outcomes"
    );

    tracing::info!("Metrics registered");
}

/// Record an article write operation
pub fn record_article_write(operation: &str) {
    counter!(
        format!("{}_article_writes_total", METRICS_PREFIX),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a canonical author creation
pub fn record_author_created() {
    counter!(format!("{}_authors_created_total", METRICS_PREFIX)).increment(1);
}

/// Record a completed session migration
pub fn record_migration(report: &MigrationReport) {
    counter!(format!("{}_migrations_total", METRICS_PREFIX)).increment(1);

    counter!(
        format!("{}_migration_articles_total", METRICS_PREFIX),
        "outcome" => "migrated"
    )
    .increment(report.migrated_count);

    counter!(
        format!("{}_migration_articles_total", METRICS_PREFIX),
        "outcome" => "skipped_duplicate"
    )
    .increment(report.skipped_count);

    counter!(
        format!("{}_migration_articles_total", METRICS_PREFIX),
        "outcome" => "failed"
    )
    .increment(report.failed_count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_helpers_do_not_panic() {
        // No recorder installed in tests; calls go to the no-op recorder
        record_article_write("create");
        record_author_created();
        record_migration(&MigrationReport::default());
    }
}
