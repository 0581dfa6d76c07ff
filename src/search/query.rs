// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query - one search request under construction
//!
//! Collects filters, keywords, facets, ordering and paging, then renders the
//! complete parameter set. Every field reference is resolved while building,
//! and `to_params` validates facet exclusions, so an invalid query never
//! reaches the transport.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use search_mapper::config::SessionConfig;
//! use search_mapper::facet::FieldFacetOptions;
//! use search_mapper::schema::{FieldOptions, FieldType, RegistryBuilder};
//! use search_mapper::search::{Direction, Query, RestrictionArg, RestrictionOptions};
//!
//! let mut builder = RegistryBuilder::new();
//! builder.setup("Post")
//!     .field("category_ids", FieldType::Integer, FieldOptions::new().multiple())
//!     .field("blog_id", FieldType::Integer, FieldOptions::new());
//! let registry = Arc::new(builder.build().unwrap());
//!
//! let mut query = Query::new(registry.composite(&["Post"]).unwrap());
//! query.with_args("category_ids", vec![
//!     RestrictionArg::Value(2.into()),
//!     RestrictionArg::Options(RestrictionOptions::default().exclude_from("category_ids")),
//! ]).unwrap();
//! query.with("blog_id", 1).unwrap();
//! query.add_field_facet("category_ids", FieldFacetOptions::default()).unwrap();
//! query.order_by("blog_id", Direction::Descending).unwrap();
//!
//! let params = query.to_params(&SessionConfig::default()).unwrap();
//! assert_eq!(
//!     params.get_all("fq"),
//!     vec!["type:Post", "{!tag=f1}category_ids_im:2", "blog_id_i:1"]
//! );
//! assert_eq!(params.get("facet.field"), Some("{!ex=f1}category_ids_im"));
//! assert_eq!(params.get("sort"), Some("blog_id_i desc"));
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::facet::{
    DateFacet, DateFacetOptions, Facet, FacetStrategy, FacetValue, FieldFacet, FieldFacetOptions,
    QueryFacet, QueryFacetBuilder, QueryFacetOptions,
};
use crate::metrics;
use crate::schema::{CompositeSetup, FieldValue, Registry};

use super::escape::escape;
use super::keywords::{KeywordOptions, Keywords};
use super::params::RequestParams;
use super::restriction::{Operator, Restriction, RestrictionArg, RestrictionValue};
use super::scope::{FieldScope, FilterHandle, Scope};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// A search request under construction
#[derive(Debug)]
pub struct Query {
    scope: Scope,
    keywords: Option<Keywords>,
    facets: Vec<Facet>,
    /// (facet name, filter) pairs from facet options
    facet_exclusions: Vec<(String, FilterHandle)>,
    order: Vec<(String, Direction)>,
    page: Option<(u32, Option<u32>)>,
}

impl Query {
    pub fn new(setup: CompositeSetup) -> Self {
        Self {
            scope: Scope::new(setup),
            keywords: None,
            facets: Vec::new(),
            facet_exclusions: Vec::new(),
            order: Vec::new(),
            page: None,
        }
    }

    pub fn setup(&self) -> &CompositeSetup {
        self.scope.setup()
    }

    fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.scope.setup().registry())
    }

    /// Top-level filters
    pub fn scope(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn with(&mut self, field: &str, value: impl Into<RestrictionValue>) -> Result<FilterHandle> {
        self.scope.with(field, value)
    }

    pub fn without(&mut self, field: &str, value: impl Into<RestrictionValue>) -> Result<FilterHandle> {
        self.scope.without(field, value)
    }

    pub fn with_args(&mut self, field: &str, args: Vec<RestrictionArg>) -> Result<FilterHandle> {
        self.scope.with_args(field, args)
    }

    pub fn restrict(
        &mut self,
        field: &str,
        operator: Operator,
        values: Vec<FieldValue>,
        negated: bool,
    ) -> Result<FilterHandle> {
        self.scope.restrict(field, operator, values, negated)
    }

    pub fn field(&mut self, name: &str) -> Result<FieldScope<'_>> {
        self.scope.field(name)
    }

    pub fn field_not(&mut self, name: &str) -> Result<FieldScope<'_>> {
        self.scope.field_not(name)
    }

    pub fn any_of<F>(&mut self, build: F) -> Result<FilterHandle>
    where
        F: FnOnce(&mut Scope) -> Result<()>,
    {
        self.scope.any_of(build)
    }

    pub fn all_of<F>(&mut self, build: F) -> Result<FilterHandle>
    where
        F: FnOnce(&mut Scope) -> Result<()>,
    {
        self.scope.all_of(build)
    }

    /// Full-text search over declared text fields.
    pub fn keywords(&mut self, text: &str, options: KeywordOptions) -> Result<&mut Self> {
        self.keywords = Some(Keywords::resolve(self.scope.setup(), text, options)?);
        Ok(self)
    }

    fn ensure_unique(&self, name: &str) -> Result<()> {
        if self.facets.iter().any(|f| f.name() == name) {
            return Err(MapperError::argument(format!("facet '{}' is already requested", name)));
        }
        Ok(())
    }

    /// Request a field facet; its name is the custom `name` option or the field name.
    pub fn add_field_facet(&mut self, field: &str, options: FieldFacetOptions) -> Result<&mut Self> {
        let declaration = self.scope.setup().field(field)?;
        let name = options.name.clone().unwrap_or_else(|| field.to_string());
        self.ensure_unique(&name)?;
        let exclusions: Vec<(String, FilterHandle)> =
            options.exclude.iter().map(|handle| (name.clone(), *handle)).collect();

        let strategy: Box<dyn FacetStrategy> = if options.only.is_empty() {
            Box::new(FieldFacet::new(declaration, options))
        } else {
            // Restricted values are counted with one facet query each
            let mut rows = QueryFacetBuilder::new(&name, self.scope.setup().clone());
            for value in &options.only {
                let restriction =
                    Restriction::new(declaration.clone(), Operator::Equal, vec![value.clone()], false)?;
                let key = declaration.field_type().encode(value)?;
                rows.push(
                    FacetValue::Value(value.clone()),
                    restriction.to_boolean_phrase()?,
                    Some(key),
                )?;
            }
            let query_options = QueryFacetOptions {
                sort: options.sort,
                limit: options.limit.and_then(|l| usize::try_from(l).ok()),
                minimum_count: Some(options.effective_minimum_count()),
                zeros: options.zeros,
            };
            Box::new(QueryFacet::new(
                rows.into_rows(),
                query_options,
                declaration.reference_type().map(str::to_string),
            )?)
        };
        let facet = Facet::new(name, strategy, self.registry());
        self.facets.push(facet);
        self.facet_exclusions.extend(exclusions);
        Ok(self)
    }

    /// Request a query facet whose rows are registered by `build`.
    pub fn add_query_facet<F>(&mut self, name: &str, options: QueryFacetOptions, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryFacetBuilder) -> Result<()>,
    {
        self.ensure_unique(name)?;
        let mut rows = QueryFacetBuilder::new(name, self.scope.setup().clone());
        build(&mut rows)?;
        let strategy = QueryFacet::new(rows.into_rows(), options, None)?;
        let facet = Facet::new(name, Box::new(strategy), self.registry());
        self.facets.push(facet);
        Ok(self)
    }

    /// Request a date-range facet on a time or date field.
    pub fn add_date_facet(&mut self, field: &str, options: DateFacetOptions) -> Result<&mut Self> {
        let declaration = self.scope.setup().field(field)?;
        self.ensure_unique(field)?;
        let strategy = DateFacet::new(declaration, options)?;
        let facet = Facet::new(field, Box::new(strategy), self.registry());
        self.facets.push(facet);
        Ok(self)
    }

    /// Requested facet by name.
    pub fn facet(&self, name: &str) -> Result<&Facet> {
        self.facets
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| MapperError::UnknownFacet {
                name: name.to_string(),
            })
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub(crate) fn into_facets(self) -> Vec<Facet> {
        self.facets
    }

    /// Order by a single-valued attribute field, or `"score"`.
    pub fn order_by(&mut self, field: &str, direction: Direction) -> Result<&mut Self> {
        let sort_field = if field == "score" {
            "score".to_string()
        } else {
            let declaration = self.scope.setup().field(field)?;
            if declaration.is_multiple() {
                return Err(MapperError::argument(format!(
                    "cannot order by multi-valued field '{}'",
                    field
                )));
            }
            declaration.indexed_name().to_string()
        };
        self.order.push((sort_field, direction));
        Ok(self)
    }

    /// 1-based page; `per_page` defaults to the session's page size.
    pub fn paginate(&mut self, page: u32, per_page: Option<u32>) -> Result<&mut Self> {
        if page == 0 || per_page == Some(0) {
            return Err(MapperError::argument("pages and page sizes start at 1"));
        }
        self.page = Some((page, per_page));
        Ok(self)
    }

    /// Filter tag for `handle`, e.g. `f1`
    fn tag(handle: FilterHandle) -> String {
        format!("f{}", handle.0 + 1)
    }

    fn exclusions(&self) -> impl Iterator<Item = (&str, FilterHandle)> {
        self.scope
            .exclusions()
            .iter()
            .map(|(handle, facet)| (facet.as_str(), *handle))
            .chain(self.facet_exclusions.iter().map(|(facet, handle)| (facet.as_str(), *handle)))
    }

    /// Render the complete request.
    pub fn to_params(&self, config: &SessionConfig) -> Result<RequestParams> {
        for (facet, handle) in self.exclusions() {
            self.facet(facet)?;
            if handle.0 >= self.scope.nodes().len() {
                return Err(MapperError::argument(format!(
                    "facet '{}' excludes an unknown filter",
                    facet
                )));
            }
        }
        let tagged: BTreeSet<FilterHandle> = self.exclusions().map(|(_, handle)| handle).collect();

        let mut params = RequestParams::new();
        match &self.keywords {
            Some(keywords) => keywords.append_params(&mut params, config),
            None => params.push("q", "*:*"),
        }

        params.push("fq", self.type_filter(config));
        let phrases = self.scope.to_phrases()?;
        metrics::record_filters(phrases.len());
        for (index, phrase) in phrases.into_iter().enumerate() {
            let handle = FilterHandle(index);
            if tagged.contains(&handle) {
                params.push("fq", format!("{{!tag={}}}{}", Self::tag(handle), phrase));
            } else {
                params.push("fq", phrase);
            }
        }

        if !self.facets.is_empty() {
            params.push("facet", "true");
            for facet in &self.facets {
                let tags: BTreeSet<String> = self
                    .exclusions()
                    .filter(|(name, _)| *name == facet.name())
                    .map(|(_, handle)| Self::tag(handle))
                    .collect();
                let tags: Vec<String> = tags.into_iter().collect();
                facet.append_params(&tags, &mut params, config)?;
            }
        }

        params.push("fl", "* score");
        let (page, per_page) = self.page.unwrap_or((1, None));
        let per_page = per_page.unwrap_or(config.default_per_page);
        params.push("start", (u64::from(page - 1) * u64::from(per_page)).to_string());
        params.push("rows", per_page.to_string());

        if !self.order.is_empty() {
            let sort = self
                .order
                .iter()
                .map(|(field, direction)| format!("{} {}", field, direction.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            params.push("sort", sort);
        }
        Ok(params)
    }

    /// `type:Post` or `type:(Post OR Comment)`
    fn type_filter(&self, config: &SessionConfig) -> String {
        let names: Vec<String> = self
            .scope
            .setup()
            .type_names()
            .iter()
            .map(|t| escape(t))
            .collect();
        if names.len() == 1 {
            format!("{}:{}", config.type_field, names[0])
        } else {
            format!("{}:({})", config.type_field, names.join(" OR "))
        }
    }
}
