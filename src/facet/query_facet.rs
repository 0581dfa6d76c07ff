// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query facets: one row per registered (value, boolean phrase) pair.
//!
//! Each row is requested as its own `facet.query`, keyed `<facet>:<n>` so the
//! counts can be matched back regardless of how the phrase is echoed:
//!
//! ```text
//! facet.query={!key=rating:0}rating_i:[4 TO *]
//! facet.query={!key=rating:1 ex=f2}rating_i:[* TO 2]
//! ```

use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::schema::CompositeSetup;
use crate::search::{RequestParams, Scope};

use super::{
    apply_policy, count_of, exclusion_param, local_params, section, FacetSort, FacetStrategy,
    FacetValue, RawRow,
};

/// Options for a query facet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFacetOptions {
    pub sort: Option<FacetSort>,
    /// Truncate after sorting; implies count order when no sort is given
    pub limit: Option<usize>,
    /// Rows below this count are dropped (default 1)
    pub minimum_count: Option<u64>,
    /// Keep zero-count rows
    pub zeros: bool,
}

impl QueryFacetOptions {
    pub fn sort(mut self, sort: FacetSort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn minimum_count(mut self, minimum_count: u64) -> Self {
        self.minimum_count = Some(minimum_count);
        self
    }

    pub fn zeros(mut self) -> Self {
        self.zeros = true;
        self
    }

    fn effective_sort(&self) -> Option<FacetSort> {
        match (self.sort, self.limit) {
            (Some(sort), _) => Some(sort),
            (None, Some(_)) => Some(FacetSort::Count),
            (None, None) => None,
        }
    }

    fn effective_minimum_count(&self) -> u64 {
        self.minimum_count.unwrap_or(if self.zeros { 0 } else { 1 })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryFacetRow {
    pub(crate) value: FacetValue,
    pub(crate) phrase: String,
    /// Reference key when the row stands for one value of a reference field
    pub(crate) key: Option<String>,
}

/// Registers the rows of a query facet.
pub struct QueryFacetBuilder {
    facet: String,
    setup: CompositeSetup,
    rows: Vec<QueryFacetRow>,
}

impl QueryFacetBuilder {
    pub(crate) fn new(facet: impl Into<String>, setup: CompositeSetup) -> Self {
        Self {
            facet: facet.into(),
            setup,
            rows: Vec::new(),
        }
    }

    /// Add a row whose count is the number of matches of the scope built by `build`.
    pub fn row<F>(&mut self, value: impl Into<FacetValue>, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Scope) -> Result<()>,
    {
        let mut scope = Scope::new(self.setup.clone());
        build(&mut scope)?;
        if scope.is_empty() {
            return Err(MapperError::argument(format!(
                "query facet '{}' row needs at least one restriction",
                self.facet
            )));
        }
        if !scope.exclusions().is_empty() {
            return Err(MapperError::argument(format!(
                "query facet '{}' rows cannot exclude filters from facets",
                self.facet
            )));
        }
        let phrase = scope.to_boolean_phrase()?;
        self.push(value.into(), phrase, None)?;
        Ok(self)
    }

    pub(crate) fn push(&mut self, value: FacetValue, phrase: String, key: Option<String>) -> Result<()> {
        let label = value.to_string();
        if self.rows.iter().any(|r| r.value.to_string() == label) {
            return Err(MapperError::DuplicateFacetRow {
                facet: self.facet.clone(),
                label,
            });
        }
        self.rows.push(QueryFacetRow { value, phrase, key });
        Ok(())
    }

    pub(crate) fn into_rows(self) -> Vec<QueryFacetRow> {
        self.rows
    }
}

#[derive(Debug)]
pub(crate) struct QueryFacet {
    rows: Vec<QueryFacetRow>,
    options: QueryFacetOptions,
    reference_type: Option<String>,
}

impl QueryFacet {
    pub(crate) fn new(
        rows: Vec<QueryFacetRow>,
        options: QueryFacetOptions,
        reference_type: Option<String>,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(MapperError::argument("a query facet needs at least one row"));
        }
        Ok(Self {
            rows,
            options,
            reference_type,
        })
    }

    fn row_key(name: &str, index: usize) -> String {
        format!("{}:{}", name, index)
    }
}

impl FacetStrategy for QueryFacet {
    fn kind(&self) -> &'static str {
        "query"
    }

    fn reference_type(&self) -> Option<&str> {
        self.reference_type.as_deref()
    }

    fn append_params(
        &self,
        name: &str,
        excluded_tags: &[String],
        params: &mut RequestParams,
        _config: &SessionConfig,
    ) -> Result<()> {
        for (index, row) in self.rows.iter().enumerate() {
            let mut local = vec![("key", Self::row_key(name, index))];
            if let Some(ex) = exclusion_param(excluded_tags) {
                local.push(ex);
            }
            params.push("facet.query", format!("{}{}", local_params(&local), row.phrase));
        }
        Ok(())
    }

    fn parse_rows(&self, name: &str, response: &Value) -> Result<Vec<RawRow>> {
        let counts = section(response, "facet_queries");
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let count = match counts.and_then(|c| c.get(Self::row_key(name, index))) {
                    Some(count) => count_of(count)?,
                    None => 0,
                };
                Ok(RawRow {
                    value: row.value.clone(),
                    count,
                    key: row.key.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(apply_policy(
            rows,
            self.options.effective_minimum_count(),
            self.options.effective_sort(),
            self.options.limit,
        ))
    }
}
