// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search results: hits, totals and executed facets.
//!
//! ```text
//! {
//!   "response": {"numFound": 2, "start": 0, "docs": [{"id": "Post 1", ...}]},
//!   "highlighting": {"Post 1": {"body_text": ["...@@@hl@@@word@@@endhl@@@..."]}},
//!   "facet_counts": {"facet_fields": {...}, "facet_queries": {...}, "facet_dates": {...}}
//! }
//! ```

mod highlight;
mod hit;

pub use highlight::Highlight;
pub use hit::Hit;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::facet::Facet;
use crate::lazy::LazyLoader;
use crate::search::{Query, RequestParams};

/// The outcome of one executed query
#[derive(Debug)]
pub struct SearchResults {
    hits: Vec<Hit>,
    total: u64,
    start: u64,
    facets: Vec<Facet>,
    params: RequestParams,
}

impl SearchResults {
    /// Attach `response` to the query's facets and parse its hits.
    pub(crate) fn build(
        query: Query,
        params: RequestParams,
        response: Value,
        config: &SessionConfig,
    ) -> Result<Self> {
        let registry = Arc::clone(query.setup().registry());
        let response = Arc::new(response);

        let body = response.get("response").ok_or_else(|| MapperError::InvalidResponse {
            message: "missing 'response' section".to_string(),
        })?;
        let total = body.get("numFound").and_then(Value::as_u64).unwrap_or(0);
        let start = body.get("start").and_then(Value::as_u64).unwrap_or(0);
        let highlighting = response.get("highlighting");

        let mut hits = body
            .get("docs")
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .map(|doc| Hit::parse(doc, highlighting, Arc::clone(&registry), config))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        // One loader per type, shared by every hit of that type
        let mut keys_by_class: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for hit in &hits {
            keys_by_class
                .entry(hit.class_name().to_string())
                .or_default()
                .push(hit.primary_key().to_string());
        }
        let loaders: BTreeMap<String, Arc<LazyLoader>> = keys_by_class
            .into_iter()
            .map(|(class_name, keys)| {
                let accessor = registry.accessor(&class_name);
                let loader = LazyLoader::new(class_name.clone(), keys, accessor, config.max_bulk_load_keys);
                (class_name, Arc::new(loader))
            })
            .collect();
        for hit in &mut hits {
            if let Some(loader) = loaders.get(hit.class_name()) {
                hit.set_loader(Arc::clone(loader));
            }
        }

        let mut facets = query.into_facets();
        for facet in &mut facets {
            facet.attach(Arc::clone(&response), config);
        }

        Ok(Self {
            hits,
            total,
            start,
            facets,
            params,
        })
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Total matches across all pages
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Offset of the first hit
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn facet(&self, name: &str) -> Result<&Facet> {
        self.facets
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| MapperError::UnknownFacet {
                name: name.to_string(),
            })
    }

    /// Parameters the request was sent with
    pub fn params(&self) -> &RequestParams {
        &self.params
    }
}
