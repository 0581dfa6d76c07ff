// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Scope - restriction tree for filter queries
//!
//! A scope resolves field names against the searched types and collects
//! restrictions, optionally grouped by boolean connectives.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use search_mapper::schema::{FieldOptions, FieldType, RegistryBuilder};
//! use search_mapper::search::Scope;
//!
//! let mut builder = RegistryBuilder::new();
//! builder.setup("Post")
//!     .field("rating", FieldType::Integer, FieldOptions::new())
//!     .field("blog_id", FieldType::Integer, FieldOptions::new());
//! let registry = Arc::new(builder.build().unwrap());
//!
//! let mut scope = Scope::new(registry.composite(&["Post"]).unwrap());
//! scope.with("blog_id", 2).unwrap();
//! scope.any_of(|any| {
//!     any.field("rating")?.greater_than(4)?;
//!     any.with("rating", Option::<i32>::None)?;
//!     Ok(())
//! }).unwrap();
//!
//! let phrases = scope.to_phrases().unwrap();
//! assert_eq!(phrases, vec!["blog_id_i:2", "(rating_i:[4 TO *] OR -rating_i:[* TO *])"]);
//! ```

use crate::error::{MapperError, Result};
use crate::schema::{CompositeSetup, FieldValue};

use super::restriction::{split_args, Operator, Restriction, RestrictionArg, RestrictionValue};

/// Restriction tree node
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeNode {
    /// Single restriction: field:value
    Restriction(Restriction),
    /// Boolean AND: (a AND b)
    All(Vec<ScopeNode>),
    /// Boolean OR: (a OR b)
    Any(Vec<ScopeNode>),
}

impl ScopeNode {
    /// Render this node as a boolean phrase.
    pub fn to_boolean_phrase(&self) -> Result<String> {
        match self {
            ScopeNode::Restriction(r) => r.to_boolean_phrase(),
            ScopeNode::All(nodes) => Self::join(nodes, " AND "),
            ScopeNode::Any(nodes) => Self::join(nodes, " OR "),
        }
    }

    fn join(nodes: &[ScopeNode], separator: &str) -> Result<String> {
        let parts = nodes
            .iter()
            .map(ScopeNode::to_boolean_phrase)
            .collect::<Result<Vec<_>>>()?;
        Ok(match parts.len() {
            0 => "*:*".to_string(),
            1 => parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", parts.join(separator)),
        })
    }
}

/// Handle to a restriction added to a scope, used to exclude it from facets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterHandle(pub(crate) usize);

/// A list of restrictions resolved against the searched types
#[derive(Debug, Clone)]
pub struct Scope {
    setup: CompositeSetup,
    nodes: Vec<ScopeNode>,
    exclusions: Vec<(FilterHandle, String)>,
}

impl Scope {
    pub fn new(setup: CompositeSetup) -> Self {
        Self {
            setup,
            nodes: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    pub fn setup(&self) -> &CompositeSetup {
        &self.setup
    }

    pub fn nodes(&self) -> &[ScopeNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Facet names each handle was asked to be excluded from
    pub(crate) fn exclusions(&self) -> &[(FilterHandle, String)] {
        &self.exclusions
    }

    /// Restrict `field` with a short-form value (scalar, range, list or null).
    pub fn with(&mut self, field: &str, value: impl Into<RestrictionValue>) -> Result<FilterHandle> {
        let (operator, values) = value.into().normalize();
        self.restrict(field, operator, values, false)
    }

    /// Negated form of [`Scope::with`].
    pub fn without(&mut self, field: &str, value: impl Into<RestrictionValue>) -> Result<FilterHandle> {
        let (operator, values) = value.into().normalize();
        self.restrict(field, operator, values, true)
    }

    /// Restrict with raw positional arguments: exactly one value, then options.
    pub fn with_args(&mut self, field: &str, args: Vec<RestrictionArg>) -> Result<FilterHandle> {
        let (value, options) = split_args(field, args)?;
        let handle = self.with(field, value)?;
        self.exclude(handle, options.exclude_from);
        Ok(handle)
    }

    /// Add an explicit operator restriction.
    pub fn restrict(
        &mut self,
        field: &str,
        operator: Operator,
        values: Vec<FieldValue>,
        negated: bool,
    ) -> Result<FilterHandle> {
        let declaration = self.setup.field(field)?;
        let restriction = Restriction::new(declaration, operator, values, negated)?;
        Ok(self.push(ScopeNode::Restriction(restriction)))
    }

    /// Operator-style builder: `scope.field("rating")?.between(1, 5)?`
    pub fn field(&mut self, name: &str) -> Result<FieldScope<'_>> {
        self.setup.field(name)?;
        Ok(FieldScope {
            scope: self,
            name: name.to_string(),
            negated: false,
        })
    }

    /// Negated operator-style builder.
    pub fn field_not(&mut self, name: &str) -> Result<FieldScope<'_>> {
        let mut field = self.field(name)?;
        field.negated = true;
        Ok(field)
    }

    /// Group restrictions so that any of them may match.
    ///
    /// Facet exclusions requested inside the group apply to the whole group.
    pub fn any_of<F>(&mut self, build: F) -> Result<FilterHandle>
    where
        F: FnOnce(&mut Scope) -> Result<()>,
    {
        let (nodes, excluded_from) = self.nested(build)?;
        let handle = self.push(ScopeNode::Any(nodes));
        self.exclude(handle, excluded_from);
        Ok(handle)
    }

    /// Group restrictions so that all of them must match.
    ///
    /// Facet exclusions requested inside the group apply to the whole group.
    pub fn all_of<F>(&mut self, build: F) -> Result<FilterHandle>
    where
        F: FnOnce(&mut Scope) -> Result<()>,
    {
        let (nodes, excluded_from) = self.nested(build)?;
        let handle = self.push(ScopeNode::All(nodes));
        self.exclude(handle, excluded_from);
        Ok(handle)
    }

    fn nested<F>(&self, build: F) -> Result<(Vec<ScopeNode>, Vec<String>)>
    where
        F: FnOnce(&mut Scope) -> Result<()>,
    {
        let mut inner = Scope::new(self.setup.clone());
        build(&mut inner)?;
        if inner.nodes.is_empty() {
            return Err(MapperError::argument("a connective needs at least one restriction"));
        }
        let excluded_from = inner.exclusions.into_iter().map(|(_, facet)| facet).collect();
        Ok((inner.nodes, excluded_from))
    }

    fn exclude(&mut self, handle: FilterHandle, facets: impl IntoIterator<Item = String>) {
        for facet in facets {
            if !self.exclusions.iter().any(|(h, f)| *h == handle && *f == facet) {
                self.exclusions.push((handle, facet));
            }
        }
    }

    fn push(&mut self, node: ScopeNode) -> FilterHandle {
        self.nodes.push(node);
        FilterHandle(self.nodes.len() - 1)
    }

    /// One boolean phrase per top-level node.
    pub fn to_phrases(&self) -> Result<Vec<String>> {
        self.nodes.iter().map(ScopeNode::to_boolean_phrase).collect()
    }

    /// All top-level nodes joined with AND, as one phrase.
    pub fn to_boolean_phrase(&self) -> Result<String> {
        ScopeNode::All(self.nodes.clone()).to_boolean_phrase()
    }
}

/// Operator builder for one field of a scope
pub struct FieldScope<'a> {
    scope: &'a mut Scope,
    name: String,
    negated: bool,
}

impl FieldScope<'_> {
    fn add(self, operator: Operator, values: Vec<FieldValue>) -> Result<FilterHandle> {
        self.scope.restrict(&self.name, operator, values, self.negated)
    }

    pub fn equal_to(self, value: impl Into<FieldValue>) -> Result<FilterHandle> {
        self.add(Operator::Equal, vec![value.into()])
    }

    pub fn less_than(self, value: impl Into<FieldValue>) -> Result<FilterHandle> {
        self.add(Operator::LessThan, vec![value.into()])
    }

    pub fn greater_than(self, value: impl Into<FieldValue>) -> Result<FilterHandle> {
        self.add(Operator::GreaterThan, vec![value.into()])
    }

    pub fn between(self, lo: impl Into<FieldValue>, hi: impl Into<FieldValue>) -> Result<FilterHandle> {
        self.add(Operator::Between, vec![lo.into(), hi.into()])
    }

    pub fn any_of<T: Into<FieldValue>>(self, values: Vec<T>) -> Result<FilterHandle> {
        self.add(Operator::AnyOf, values.into_iter().map(Into::into).collect())
    }

    pub fn all_of<T: Into<FieldValue>>(self, values: Vec<T>) -> Result<FilterHandle> {
        self.add(Operator::AllOf, values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(self) -> Result<FilterHandle> {
        self.add(Operator::IsNull, Vec::new())
    }

    pub fn is_not_null(self) -> Result<FilterHandle> {
        self.add(Operator::IsNotNull, Vec::new())
    }
}
