// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field facets: distinct indexed values of one field with their counts.
//!
//! ```text
//! facet.field={!ex=f1 key=cats}category_ids_im
//! f.category_ids_im.facet.sort=count
//! f.category_ids_im.facet.limit=10
//! f.category_ids_im.facet.mincount=1
//! ```
//!
//! The response table may arrive as a flat `[v1, c1, v2, c2]` array, an array
//! of `[v, c]` pairs, or a `{v: c}` object.

use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::schema::{FieldDeclaration, FieldValue};
use crate::search::{FilterHandle, RequestParams};

use super::{
    apply_policy, count_of, exclusion_param, local_params, section, FacetSort, FacetStrategy,
    FacetValue, RawRow,
};

/// Options for a field facet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFacetOptions {
    /// `Count` asks the server for count order, `Lexical` for index order
    pub sort: Option<FacetSort>,
    /// Negative means unlimited
    pub limit: Option<i64>,
    pub offset: Option<u64>,
    pub prefix: Option<String>,
    pub minimum_count: Option<u64>,
    /// Include zero-count values
    pub zeros: bool,
    /// Custom facet name (and response key)
    pub name: Option<String>,
    /// Filters whose restriction this facet's counts should ignore
    pub exclude: Vec<FilterHandle>,
    /// Only count these values; requested as one query facet row each
    pub only: Vec<FieldValue>,
}

impl FieldFacetOptions {
    pub fn sort(mut self, sort: FacetSort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
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

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn exclude(mut self, handle: FilterHandle) -> Self {
        self.exclude.push(handle);
        self
    }

    pub fn only<T: Into<FieldValue>>(mut self, values: Vec<T>) -> Self {
        self.only = values.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn effective_minimum_count(&self) -> u64 {
        self.minimum_count.unwrap_or(if self.zeros { 0 } else { 1 })
    }
}

#[derive(Debug)]
pub(crate) struct FieldFacet {
    field: FieldDeclaration,
    options: FieldFacetOptions,
}

impl FieldFacet {
    pub(crate) fn new(field: FieldDeclaration, options: FieldFacetOptions) -> Self {
        Self { field, options }
    }

    fn response_key(&self) -> &str {
        self.options
            .name
            .as_deref()
            .unwrap_or_else(|| self.field.indexed_name())
    }

    fn row(&self, raw: &Value, count: &Value) -> Result<RawRow> {
        let value = self.field.field_type().decode_json(raw)?;
        let key = match raw {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Ok(RawRow {
            value: FacetValue::Value(value),
            count: count_of(count)?,
            key: Some(key),
        })
    }
}

impl FacetStrategy for FieldFacet {
    fn kind(&self) -> &'static str {
        "field"
    }

    fn reference_type(&self) -> Option<&str> {
        self.field.reference_type()
    }

    fn append_params(
        &self,
        _name: &str,
        excluded_tags: &[String],
        params: &mut RequestParams,
        config: &SessionConfig,
    ) -> Result<()> {
        let indexed = self.field.indexed_name();
        let mut local = Vec::new();
        if let Some(ex) = exclusion_param(excluded_tags) {
            local.push(ex);
        }
        if let Some(name) = &self.options.name {
            local.push(("key", name.clone()));
        }
        params.push("facet.field", format!("{}{}", local_params(&local), indexed));

        let per_field = |option: &str| format!("f.{}.facet.{}", indexed, option);
        if let Some(sort) = self.options.sort {
            let sort = match sort {
                FacetSort::Count => "count",
                FacetSort::Lexical => "index",
            };
            params.push(per_field("sort"), sort);
        }
        if let Some(limit) = self.options.limit.or(config.default_facet_limit) {
            params.push(per_field("limit"), limit.to_string());
        }
        if let Some(offset) = self.options.offset {
            params.push(per_field("offset"), offset.to_string());
        }
        if let Some(prefix) = &self.options.prefix {
            params.push(per_field("prefix"), prefix.clone());
        }
        params.push(
            per_field("mincount"),
            self.options.effective_minimum_count().to_string(),
        );
        Ok(())
    }

    fn parse_rows(&self, _name: &str, response: &Value) -> Result<Vec<RawRow>> {
        let table = match section(response, "facet_fields").and_then(|s| s.get(self.response_key())) {
            Some(table) => table,
            None => return Ok(Vec::new()),
        };

        let rows = match table {
            Value::Array(items) if items.iter().all(Value::is_array) => items
                .iter()
                .map(|pair| match pair.as_array().map(Vec::as_slice) {
                    Some([value, count]) => self.row(value, count),
                    _ => Err(MapperError::InvalidResponse {
                        message: format!("facet pair {} is not [value, count]", pair),
                    }),
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Array(items) => {
                if items.len() % 2 != 0 {
                    return Err(MapperError::InvalidResponse {
                        message: format!(
                            "facet table for '{}' has an odd number of entries",
                            self.response_key()
                        ),
                    });
                }
                items
                    .chunks(2)
                    .map(|pair| self.row(&pair[0], &pair[1]))
                    .collect::<Result<Vec<_>>>()?
            }
            Value::Object(entries) => entries
                .iter()
                .map(|(value, count)| self.row(&Value::String(value.clone()), count))
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(MapperError::InvalidResponse {
                    message: format!("unexpected facet table {}", other),
                })
            }
        };

        let limit = self
            .options
            .limit
            .and_then(|limit| usize::try_from(limit).ok());
        Ok(apply_policy(
            rows,
            self.options.effective_minimum_count(),
            self.options.sort,
            limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldOptions, FieldType};
    use serde_json::json;

    fn category_facet(options: FieldFacetOptions) -> FieldFacet {
        FieldFacet::new(
            FieldDeclaration::new(
                "category_ids",
                FieldType::Integer,
                FieldOptions::new().multiple().references("Category"),
            ),
            options,
        )
    }

    #[test]
    fn test_params_with_options() {
        let facet = category_facet(
            FieldFacetOptions::default()
                .sort(FacetSort::Lexical)
                .limit(5)
                .prefix("1")
                .name("cats"),
        );
        let mut params = RequestParams::new();
        facet
            .append_params("cats", &["f1".to_string()], &mut params, &SessionConfig::default())
            .unwrap();
        assert_eq!(params.get("facet.field"), Some("{!ex=f1 key=cats}category_ids_im"));
        assert_eq!(params.get("f.category_ids_im.facet.sort"), Some("index"));
        assert_eq!(params.get("f.category_ids_im.facet.limit"), Some("5"));
        assert_eq!(params.get("f.category_ids_im.facet.prefix"), Some("1"));
        assert_eq!(params.get("f.category_ids_im.facet.mincount"), Some("1"));
    }

    #[test]
    fn test_default_limit_from_config() {
        let facet = category_facet(FieldFacetOptions::default().zeros());
        let config = SessionConfig {
            default_facet_limit: Some(20),
            ..SessionConfig::default()
        };
        let mut params = RequestParams::new();
        facet.append_params("category_ids", &[], &mut params, &config).unwrap();
        assert_eq!(params.get("facet.field"), Some("category_ids_im"));
        assert_eq!(params.get("f.category_ids_im.facet.limit"), Some("20"));
        assert_eq!(params.get("f.category_ids_im.facet.mincount"), Some("0"));
    }

    #[test]
    fn test_parse_flat_array() {
        let facet = category_facet(FieldFacetOptions::default());
        let response = json!({"facet_counts": {"facet_fields": {"category_ids_im": ["3", 7, "1", 2]}}});
        let rows = facet.parse_rows("category_ids", &response).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, FacetValue::Value(FieldValue::Int(3)));
        assert_eq!(rows[0].count, 7);
        assert_eq!(rows[0].key.as_deref(), Some("3"));
        assert_eq!(rows[1].count, 2);
    }

    #[test]
    fn test_parse_pairs_and_object() {
        let facet = category_facet(FieldFacetOptions::default());
        let pairs = json!({"facet_fields": {"category_ids_im": [["4", 1]]}});
        assert_eq!(facet.parse_rows("category_ids", &pairs).unwrap()[0].count, 1);

        let object = json!({"facet_fields": {"category_ids_im": {"5": 9}}});
        let rows = facet.parse_rows("category_ids", &object).unwrap();
        assert_eq!(rows[0].value, FacetValue::Value(FieldValue::Int(5)));
    }

    #[test]
    fn test_object_table_follows_sort_and_limit() {
        let response = json!({"facet_fields": {"category_ids_im": {"1": 1, "2": 5, "3": 3}}});
        let counts = |options| {
            category_facet(options)
                .parse_rows("category_ids", &response)
                .unwrap()
                .iter()
                .map(|r| r.count)
                .collect::<Vec<_>>()
        };
        assert_eq!(counts(FieldFacetOptions::default().sort(FacetSort::Count)), vec![5, 3, 1]);
        assert_eq!(
            counts(FieldFacetOptions::default().sort(FacetSort::Count).limit(2)),
            vec![5, 3]
        );
        assert_eq!(
            counts(FieldFacetOptions::default().sort(FacetSort::Lexical).limit(-1)),
            vec![1, 5, 3]
        );
    }

    #[test]
    fn test_count_sort_keeps_server_order_for_ties() {
        let facet = category_facet(FieldFacetOptions::default().sort(FacetSort::Count));
        let response = json!({"facet_fields": {"category_ids_im": ["9", 2, "4", 2, "6", 3]}});
        let keys: Vec<_> = facet
            .parse_rows("category_ids", &response)
            .unwrap()
            .into_iter()
            .map(|r| r.key.unwrap_or_default())
            .collect();
        assert_eq!(keys, vec!["6", "9", "4"]);
    }

    #[test]
    fn test_parse_odd_table_is_invalid() {
        let facet = category_facet(FieldFacetOptions::default());
        let response = json!({"facet_fields": {"category_ids_im": ["3", 7, "1"]}});
        assert!(matches!(
            facet.parse_rows("category_ids", &response).unwrap_err(),
            MapperError::InvalidResponse { .. }
        ));
    }

    #[test]
    fn test_missing_table_is_empty() {
        let facet = category_facet(FieldFacetOptions::default());
        assert!(facet.parse_rows("category_ids", &json!({})).unwrap().is_empty());
    }
}
