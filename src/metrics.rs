// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for search-mapper.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application chooses the exporter.
//!
//! # Metric Naming Convention
//! - `search_mapper_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `kind`: field, query, date (facets) or error kind
//! - `reference_type`: target type of a bulk load

use metrics::{counter, histogram};
use std::time::Duration;

/// Record one executed search and its transport round trip
pub fn record_search(duration: Duration, hits: usize) {
    counter!("search_mapper_searches_total").increment(1);
    histogram!("search_mapper_search_seconds").record(duration.as_secs_f64());
    histogram!("search_mapper_search_hits").record(hits as f64);
}

/// Record filter-query fragments built for one request
pub fn record_filters(count: usize) {
    counter!("search_mapper_filter_fragments_total").increment(count as u64);
}

/// Record facet rows materialized from a response
pub fn record_facet_rows(kind: &str, count: usize) {
    counter!(
        "search_mapper_facet_rows_total",
        "kind" => kind.to_string()
    )
    .increment(count as u64);
}

/// Record one bulk-load call against a data accessor
pub fn record_bulk_load(reference_type: &str, requested: usize, loaded: usize) {
    counter!(
        "search_mapper_bulk_loads_total",
        "reference_type" => reference_type.to_string()
    )
    .increment(1);
    counter!(
        "search_mapper_bulk_load_keys_total",
        "reference_type" => reference_type.to_string()
    )
    .increment(requested as u64);
    counter!(
        "search_mapper_bulk_load_instances_total",
        "reference_type" => reference_type.to_string()
    )
    .increment(loaded as u64);
}

/// Record a translation or execution error by kind
pub fn record_error(kind: &str) {
    counter!(
        "search_mapper_errors_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}
