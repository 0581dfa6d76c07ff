// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Registry of domain types: field declaration sets plus data accessors.
//!
//! Built once at process start, then shared read-only behind an `Arc`.
//!
//! ```rust
//! use search_mapper::schema::{FieldOptions, FieldType, RegistryBuilder};
//!
//! let mut builder = RegistryBuilder::new();
//! builder.setup("Content").field("published_at", FieldType::Time, FieldOptions::new());
//! builder.setup("Post").family(["Content"]);
//! builder.declare("Post", "rating", "integer", FieldOptions::new()).unwrap();
//!
//! let registry = builder.build().unwrap();
//! let post = registry.setup("Post").unwrap();
//! assert_eq!(post.type_tags(), &["Post".to_string(), "Content".to_string()]);
//! assert!(post.field_declaration("published_at").is_some());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::adapters::DataAccessor;
use crate::error::{MapperError, Result};

use super::field::{FieldDeclaration, FieldOptions};
use super::field_type::FieldType;
use super::setup::Setup;

/// Collects declarations and accessors before freezing them into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    setups: BTreeMap<String, Setup>,
    accessors: HashMap<String, Arc<dyn DataAccessor>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the declaration set for a domain type.
    pub fn setup(&mut self, type_name: &str) -> &mut Setup {
        self.setups
            .entry(type_name.to_string())
            .or_insert_with(|| Setup::new(type_name))
    }

    /// Declare a field by type tag, e.g. `declare("Post", "rating", "integer", ..)`.
    pub fn declare(
        &mut self,
        domain_type: &str,
        field_name: &str,
        type_tag: &str,
        options: FieldOptions,
    ) -> Result<&mut Self> {
        let field_type = FieldType::from_tag(type_tag)?;
        self.setup(domain_type)
            .insert(FieldDeclaration::new(field_name, field_type, options));
        Ok(self)
    }

    /// Bind the data accessor that loads instances of `type_name`.
    pub fn accessor(&mut self, type_name: &str, accessor: Arc<dyn DataAccessor>) -> &mut Self {
        self.accessors.insert(type_name.to_string(), accessor);
        self
    }

    /// Resolve type families and inherited declarations, then freeze.
    pub fn build(self) -> Result<Registry> {
        let mut resolved = BTreeMap::new();
        for (name, setup) in &self.setups {
            let tags = self.resolve_family(name);
            let mut flat = setup.clone();
            for ancestor in tags.iter().skip(1) {
                if let Some(parent) = self.setups.get(ancestor) {
                    flat.inherit_from(parent);
                }
            }
            flat.set_type_tags(tags);
            resolved.insert(name.clone(), flat);
        }
        Ok(Registry {
            setups: resolved,
            accessors: self.accessors,
        })
    }

    /// Depth-first, nearest-first flattening of declared ancestors.
    fn resolve_family(&self, type_name: &str) -> Vec<String> {
        let mut tags = vec![type_name.to_string()];
        let mut stack: Vec<String> = self
            .setups
            .get(type_name)
            .map(|s| s.declared_family().iter().rev().cloned().collect())
            .unwrap_or_default();
        while let Some(tag) = stack.pop() {
            if tags.contains(&tag) {
                continue;
            }
            if let Some(parent) = self.setups.get(&tag) {
                stack.extend(parent.declared_family().iter().rev().cloned());
            }
            tags.push(tag);
        }
        tags
    }
}

/// Read-only declaration sets and accessors for every registered type
pub struct Registry {
    setups: BTreeMap<String, Setup>,
    accessors: HashMap<String, Arc<dyn DataAccessor>>,
}

impl Registry {
    pub fn setup(&self, type_name: &str) -> Result<&Setup> {
        self.setups
            .get(type_name)
            .ok_or_else(|| MapperError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// Accessor bound to `type_name`, else to its nearest ancestor.
    pub fn accessor(&self, type_name: &str) -> Option<Arc<dyn DataAccessor>> {
        if let Some(accessor) = self.accessors.get(type_name) {
            return Some(Arc::clone(accessor));
        }
        self.setups
            .get(type_name)?
            .type_tags()
            .iter()
            .find_map(|tag| self.accessors.get(tag))
            .cloned()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.setups.keys().map(String::as_str)
    }

    /// Combine the setups of every type a query spans.
    pub fn composite(self: &Arc<Self>, types: &[&str]) -> Result<CompositeSetup> {
        if types.is_empty() {
            return Err(MapperError::argument("a search needs at least one type"));
        }
        let mut names: Vec<String> = Vec::with_capacity(types.len());
        for t in types {
            self.setup(t)?;
            if !names.iter().any(|n| n == t) {
                names.push(t.to_string());
            }
        }
        Ok(CompositeSetup {
            registry: Arc::clone(self),
            types: names,
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("setups", &self.setups.keys().collect::<Vec<_>>())
            .field("accessors", &self.accessors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Field resolution across every type a query searches.
///
/// A field resolves only if every searched type declares it identically.
#[derive(Clone)]
pub struct CompositeSetup {
    registry: Arc<Registry>,
    types: Vec<String>,
}

impl CompositeSetup {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn type_names(&self) -> &[String] {
        &self.types
    }

    fn setups(&self) -> impl Iterator<Item = &Setup> {
        self.types.iter().filter_map(|t| self.registry.setups.get(t))
    }

    /// Resolve an attribute field on every searched type.
    pub fn field(&self, name: &str) -> Result<FieldDeclaration> {
        self.resolve(name, |setup| setup.field_declaration(name))
    }

    /// Resolve a text (full-text) field on every searched type.
    pub fn text_field(&self, name: &str) -> Result<FieldDeclaration> {
        self.resolve(name, |setup| setup.text_field(name).cloned())
    }

    /// Union of text fields across searched types, deduplicated by indexed name.
    pub fn all_text_fields(&self) -> Vec<FieldDeclaration> {
        let mut fields: Vec<FieldDeclaration> = Vec::new();
        for setup in self.setups() {
            for field in setup.text_fields() {
                if !fields.iter().any(|f| f.indexed_name() == field.indexed_name()) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }

    fn resolve<F>(&self, name: &str, lookup: F) -> Result<FieldDeclaration>
    where
        F: Fn(&Setup) -> Option<FieldDeclaration>,
    {
        let found: Vec<(&str, Option<FieldDeclaration>)> = self
            .setups()
            .map(|setup| (setup.type_name(), lookup(setup)))
            .collect();

        let missing: Vec<String> = found
            .iter()
            .filter(|(_, decl)| decl.is_none())
            .map(|(t, _)| t.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MapperError::unrecognized(name, missing));
        }

        let mut declarations = found.into_iter().filter_map(|(t, d)| d.map(|d| (t, d)));
        let (_, first) = declarations
            .next()
            .ok_or_else(|| MapperError::unrecognized(name, self.types.clone()))?;
        let incompatible: Vec<String> = declarations
            .filter(|(_, d)| !d.is_compatible_with(&first))
            .map(|(t, _)| t.to_string())
            .collect();
        if !incompatible.is_empty() {
            return Err(MapperError::unrecognized(name, incompatible));
        }
        Ok(first)
    }
}

impl fmt::Debug for CompositeSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSetup")
            .field("types", &self.types)
            .finish()
    }
}
