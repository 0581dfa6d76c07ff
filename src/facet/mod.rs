// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Facet Result Engine
//!
//! Three strategies turn one section of the raw response into value/count rows:
//!
//! ```text
//! FieldFacet  ← facet_counts.facet_fields[indexed_name]
//! QueryFacet  ← facet_counts.facet_queries["<facet>:<n>"]
//! DateFacet   ← facet_counts.facet_dates[indexed_name][bucket start]
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Registered ──attach(response)──→ RowsPending ──rows()──→ RowsMaterialized
//! ```
//!
//! Rows are parsed once and memoized for the facet's lifetime. Rows of a facet
//! bound to a reference field share one [`LazyLoader`], so the first
//! `instance()` access loads every row's instance in one batch.

mod date_facet;
mod field_facet;
mod query_facet;

pub use date_facet::DateFacetOptions;
pub use field_facet::FieldFacetOptions;
pub use query_facet::{QueryFacetBuilder, QueryFacetOptions};

pub(crate) use date_facet::DateFacet;
pub(crate) use field_facet::FieldFacet;
pub(crate) use query_facet::QueryFacet;

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::adapters::Instance;
use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::lazy::LazyLoader;
use crate::metrics;
use crate::schema::{FieldValue, Registry};
use crate::search::RequestParams;

/// Row ordering policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetSort {
    /// Descending by count, ties in registration (or server) order
    Count,
    /// Ascending by value (index order for field facets)
    Lexical,
}

/// The value a facet row stands for
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    /// A decoded field value
    Value(FieldValue),
    /// An inclusive value range registered on a query facet
    Range(FieldValue, FieldValue),
    /// A free-form query facet label
    Label(String),
    /// One date-facet bucket, `[start, end)`
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl FacetValue {
    pub fn range(lo: impl Into<FieldValue>, hi: impl Into<FieldValue>) -> Self {
        FacetValue::Range(lo.into(), hi.into())
    }

    /// Ascending order used by [`FacetSort::Lexical`]; ranges order by their lower bound.
    pub fn lexical_cmp(&self, other: &FacetValue) -> Ordering {
        match (self.leading(), other.leading()) {
            (Some(a), Some(b)) => a.lexical_cmp(&b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }

    fn leading(&self) -> Option<FieldValue> {
        match self {
            FacetValue::Value(v) | FacetValue::Range(v, _) => Some(v.clone()),
            FacetValue::Interval { start, .. } => Some(FieldValue::Time(*start)),
            FacetValue::Label(_) => None,
        }
    }

    pub fn as_field_value(&self) -> Option<&FieldValue> {
        match self {
            FacetValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FacetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetValue::Value(v) => write!(f, "{}", v),
            FacetValue::Range(lo, hi) => write!(f, "{}..{}", lo, hi),
            FacetValue::Label(label) => f.write_str(label),
            FacetValue::Interval { start, end } => write!(
                f,
                "[{}, {})",
                start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                end.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
        }
    }
}

impl From<&str> for FacetValue {
    fn from(label: &str) -> Self {
        FacetValue::Label(label.to_string())
    }
}

impl From<String> for FacetValue {
    fn from(label: String) -> Self {
        FacetValue::Label(label)
    }
}

impl From<FieldValue> for FacetValue {
    fn from(value: FieldValue) -> Self {
        FacetValue::Value(value)
    }
}

/// A parsed row before loaders are attached
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRow {
    pub(crate) value: FacetValue,
    pub(crate) count: u64,
    /// Reference key for lazy population
    pub(crate) key: Option<String>,
}

/// Drop rows under `minimum_count`, sort (stable), then truncate.
pub(crate) fn apply_policy(
    mut rows: Vec<RawRow>,
    minimum_count: u64,
    sort: Option<FacetSort>,
    limit: Option<usize>,
) -> Vec<RawRow> {
    rows.retain(|row| row.count >= minimum_count);
    match sort {
        Some(FacetSort::Count) => rows.sort_by(|a, b| b.count.cmp(&a.count)),
        Some(FacetSort::Lexical) => rows.sort_by(|a, b| a.value.lexical_cmp(&b.value)),
        None => {}
    }
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

/// Render `{!k=v k=v}` local params, or nothing when empty.
///
/// Values that would end the parameter early are single-quoted.
pub(crate) fn local_params(pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, local_param_value(v)))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{!{}}}", body)
}

fn local_param_value(value: &str) -> String {
    let bare = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '}' | '\'' | '"' | '\\'));
    if bare {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if matches!(c, '\'' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// `ex=` local param for the given filter tags
pub(crate) fn exclusion_param(tags: &[String]) -> Option<(&'static str, String)> {
    if tags.is_empty() {
        None
    } else {
        Some(("ex", tags.join(",")))
    }
}

/// Look up a facet section, under `facet_counts` or at the top level.
pub(crate) fn section<'a>(response: &'a Value, name: &str) -> Option<&'a Value> {
    response
        .get("facet_counts")
        .and_then(|counts| counts.get(name))
        .or_else(|| response.get(name))
}

pub(crate) fn count_of(value: &Value) -> Result<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| MapperError::InvalidResponse {
            message: format!("facet count {} is not a non-negative integer", value),
        })
}

/// One facet strategy: request parameters out, rows back
pub(crate) trait FacetStrategy: Send + Sync + fmt::Debug {
    /// `field`, `query` or `date`
    fn kind(&self) -> &'static str;

    /// Type referenced by row values, if rows can resolve instances
    fn reference_type(&self) -> Option<&str>;

    fn append_params(
        &self,
        name: &str,
        excluded_tags: &[String],
        params: &mut RequestParams,
        config: &SessionConfig,
    ) -> Result<()>;

    fn parse_rows(&self, name: &str, response: &Value) -> Result<Vec<RawRow>>;
}

/// Observable lifecycle state of a facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetState {
    Registered,
    RowsPending,
    RowsMaterialized,
}

struct Attached {
    response: Arc<Value>,
    batch_limit: Option<usize>,
}

/// A requested facet and, once executed, its memoized rows
pub struct Facet {
    name: String,
    strategy: Box<dyn FacetStrategy>,
    registry: Arc<Registry>,
    attached: Option<Attached>,
    rows: OnceCell<Vec<FacetRow>>,
}

impl Facet {
    pub(crate) fn new(name: impl Into<String>, strategy: Box<dyn FacetStrategy>, registry: Arc<Registry>) -> Self {
        Self {
            name: name.into(),
            strategy,
            registry,
            attached: None,
            rows: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.strategy.kind()
    }

    pub fn state(&self) -> FacetState {
        match (&self.attached, self.rows.get()) {
            (None, _) => FacetState::Registered,
            (Some(_), None) => FacetState::RowsPending,
            (Some(_), Some(_)) => FacetState::RowsMaterialized,
        }
    }

    pub(crate) fn append_params(
        &self,
        excluded_tags: &[String],
        params: &mut RequestParams,
        config: &SessionConfig,
    ) -> Result<()> {
        self.strategy.append_params(&self.name, excluded_tags, params, config)
    }

    pub(crate) fn attach(&mut self, response: Arc<Value>, config: &SessionConfig) {
        self.attached = Some(Attached {
            response,
            batch_limit: config.max_bulk_load_keys,
        });
        self.rows = OnceCell::new();
    }

    /// Parsed rows; fails with `FacetNotYetExecuted` before the search runs.
    pub fn rows(&self) -> Result<&[FacetRow]> {
        self.rows
            .get_or_try_init(|| self.materialize())
            .map(Vec::as_slice)
    }

    fn materialize(&self) -> Result<Vec<FacetRow>> {
        let attached = self
            .attached
            .as_ref()
            .ok_or_else(|| MapperError::FacetNotYetExecuted {
                facet: self.name.clone(),
            })?;
        let raw = self.strategy.parse_rows(&self.name, &attached.response)?;
        metrics::record_facet_rows(self.strategy.kind(), raw.len());

        let loader = self.strategy.reference_type().map(|reference_type| {
            let keys = raw.iter().filter_map(|r| r.key.clone()).collect();
            Arc::new(LazyLoader::new(
                reference_type,
                keys,
                self.registry.accessor(reference_type),
                attached.batch_limit,
            ))
        });

        Ok(raw
            .into_iter()
            .map(|r| FacetRow {
                value: r.value,
                count: r.count,
                key: r.key,
                loader: loader.clone(),
            })
            .collect())
    }
}

impl fmt::Debug for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facet")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("state", &self.state())
            .finish()
    }
}

/// One value/count row of a facet
#[derive(Debug, Clone)]
pub struct FacetRow {
    value: FacetValue,
    count: u64,
    key: Option<String>,
    loader: Option<Arc<LazyLoader>>,
}

impl FacetRow {
    pub fn value(&self) -> &FacetValue {
        &self.value
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Referenced instance, loaded together with every sibling row on first access.
    pub async fn instance(&self) -> Result<Option<Instance>> {
        match (&self.loader, &self.key) {
            (Some(loader), Some(key)) => loader.instance(key).await,
            _ => Ok(None),
        }
    }

    /// [`FacetRow::instance`] downcast to a concrete type.
    pub async fn instance_as<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
        Ok(self.instance().await?.and_then(|i| i.downcast::<T>().ok()))
    }
}
