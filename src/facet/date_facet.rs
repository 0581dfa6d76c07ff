// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Date-range facets: contiguous fixed-width buckets over a time interval.
//!
//! ```text
//! facet.date=published_at_d
//! f.published_at_d.facet.date.start=2009-06-01T00:00:00Z
//! f.published_at_d.facet.date.end=2009-06-03T00:00:00Z
//! f.published_at_d.facet.date.gap=+86400SECONDS
//! f.published_at_d.facet.date.hardend=true
//! ```
//!
//! The bucket count is the span ceiling-divided by the gap; the last bucket is
//! clipped to the interval end.

use std::collections::HashMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::schema::{FieldDeclaration, FieldType};
use crate::search::RequestParams;

use super::{
    apply_policy, count_of, exclusion_param, local_params, section, FacetSort, FacetStrategy,
    FacetValue, RawRow,
};

/// Upper bound on the buckets one date facet may request
const MAX_BUCKETS: i64 = 10_000;

/// Options for a date-range facet
#[derive(Debug, Clone, PartialEq)]
pub struct DateFacetOptions {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Bucket width, whole seconds
    pub gap: Duration,
    /// Only `Count` reorders; the default is interval order
    pub sort: Option<FacetSort>,
    /// Buckets below this count are dropped (default 0: every bucket is a row)
    pub minimum_count: Option<u64>,
}

impl DateFacetOptions {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, gap: Duration) -> Self {
        Self {
            start,
            end,
            gap,
            sort: None,
            minimum_count: None,
        }
    }

    pub fn sort(mut self, sort: FacetSort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn minimum_count(mut self, minimum_count: u64) -> Self {
        self.minimum_count = Some(minimum_count);
        self
    }
}

#[derive(Debug)]
pub(crate) struct DateFacet {
    field: FieldDeclaration,
    options: DateFacetOptions,
    buckets: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl DateFacet {
    pub(crate) fn new(field: FieldDeclaration, options: DateFacetOptions) -> Result<Self> {
        if !matches!(field.field_type(), FieldType::Time | FieldType::Date) {
            return Err(MapperError::argument(format!(
                "date facet on '{}' needs a time or date field, not {}",
                field.name(),
                field.field_type()
            )));
        }
        let gap = options.gap.num_seconds();
        if gap <= 0 {
            return Err(MapperError::argument("date facet gap must be at least one second"));
        }
        let span = (options.end - options.start).num_seconds();
        if span <= 0 {
            return Err(MapperError::argument("date facet end must be after its start"));
        }

        let count = span / gap + i64::from(span % gap != 0);
        if count > MAX_BUCKETS {
            return Err(MapperError::argument(format!(
                "date facet on '{}' would produce {} buckets (at most {} allowed)",
                field.name(),
                count,
                MAX_BUCKETS
            )));
        }
        let mut buckets = Vec::with_capacity(count as usize);
        let mut start = options.start;
        while start < options.end {
            // A gap past the representable range still ends the last bucket at `end`
            let end = start
                .checked_add_signed(Duration::seconds(gap))
                .map_or(options.end, |end| end.min(options.end));
            buckets.push((start, end));
            start = end;
        }

        Ok(Self {
            field,
            options,
            buckets,
        })
    }

    fn encode(time: &DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl FacetStrategy for DateFacet {
    fn kind(&self) -> &'static str {
        "date"
    }

    fn reference_type(&self) -> Option<&str> {
        None
    }

    fn append_params(
        &self,
        _name: &str,
        excluded_tags: &[String],
        params: &mut RequestParams,
        _config: &SessionConfig,
    ) -> Result<()> {
        let indexed = self.field.indexed_name();
        let local: Vec<_> = exclusion_param(excluded_tags).into_iter().collect();
        params.push("facet.date", format!("{}{}", local_params(&local), indexed));
        let per_field = |option: &str| format!("f.{}.facet.date.{}", indexed, option);
        params.push(per_field("start"), Self::encode(&self.options.start));
        params.push(per_field("end"), Self::encode(&self.options.end));
        params.push(per_field("gap"), format!("+{}SECONDS", self.options.gap.num_seconds()));
        params.push(per_field("hardend"), "true");
        Ok(())
    }

    fn parse_rows(&self, _name: &str, response: &Value) -> Result<Vec<RawRow>> {
        let mut counts: HashMap<DateTime<Utc>, u64> = HashMap::new();
        if let Some(Value::Object(entries)) =
            section(response, "facet_dates").and_then(|s| s.get(self.field.indexed_name()))
        {
            for (key, count) in entries {
                // gap/start/end metadata keys do not parse as times
                if let Ok(start) = DateTime::parse_from_rfc3339(key) {
                    counts.insert(start.with_timezone(&Utc), count_of(count)?);
                }
            }
        }

        let rows = self
            .buckets
            .iter()
            .map(|(start, end)| RawRow {
                value: FacetValue::Interval {
                    start: *start,
                    end: *end,
                },
                count: counts.get(start).copied().unwrap_or(0),
                key: None,
            })
            .collect();
        let sort = self.options.sort.filter(|s| *s == FacetSort::Count);
        Ok(apply_policy(rows, self.options.minimum_count.unwrap_or(0), sort, None))
    }
}
