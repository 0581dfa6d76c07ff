// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Session - query execution against one index service
//!
//! # Architecture
//!
//! ```text
//! session.new_query(types)
//!       │
//!       ├─→ Query (filters, keywords, facets)   ← all field errors surface here
//!       │
//! session.execute(query)
//!       │
//!       ├─→ Query::to_params                    ← exclusion errors surface here
//!       ├─→ Transport::select(params)           ← the only I/O
//!       └─→ SearchResults (hits + facets, instances resolved lazily)
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::adapters::Transport;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::metrics;
use crate::results::SearchResults;
use crate::schema::Registry;
use crate::search::Query;

/// Builds and executes queries against one index service.
///
/// Holds only read-only state, so one session can serve concurrent queries;
/// each execution owns its own facets and hits.
pub struct Session {
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    config: SessionConfig,
}

impl Session {
    pub fn new(registry: Arc<Registry>, transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            registry,
            transport,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a query across one or more registered types.
    pub fn new_query(&self, types: &[&str]) -> Result<Query> {
        self.registry.composite(types).map(Query::new)
    }

    /// Send the query and wrap the response.
    ///
    /// Translation errors are raised before the transport is called.
    pub async fn execute(&self, query: Query) -> Result<SearchResults> {
        let started = Instant::now();
        let types = query.setup().type_names().join(",");

        let params = query.to_params(&self.config).map_err(|e| {
            metrics::record_error(e.kind());
            warn!(types = %types, error = %e, "Query rejected before sending");
            e
        })?;
        debug!(types = %types, params = %params.to_query_string(), "Sending select request");

        let response = self.transport.select(&params).await.map_err(|e| {
            metrics::record_error(e.kind());
            warn!(types = %types, error = %e, "Select request failed");
            e
        })?;

        let filters = params.get_all("fq").len();
        let facets = query.facets().len();
        let results = SearchResults::build(query, params, response, &self.config).map_err(|e| {
            metrics::record_error(e.kind());
            e
        })?;

        let elapsed = started.elapsed();
        metrics::record_search(elapsed, results.hits().len());
        info!(
            types = %types,
            filters,
            facets,
            hits = results.hits().len(),
            total = results.total(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Search executed"
        );
        Ok(results)
    }
}
