// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-type field declaration sets.
//!
//! A [`Setup`] is built once per domain type and reused by every query:
//!
//! ```rust
//! use search_mapper::schema::{FieldOptions, FieldType, Setup};
//!
//! let mut post = Setup::new("Post");
//! post.field("title", FieldType::String, FieldOptions::new().stored())
//!     .field("body", FieldType::Text, FieldOptions::new())
//!     .field("category_ids", FieldType::Integer, FieldOptions::new().multiple().references("Category"))
//!     .dynamic_field("custom", FieldType::String, FieldOptions::new())
//!     .family(["Content"]);
//!
//! assert_eq!(post.field_declaration("title").unwrap().indexed_name(), "title_ss");
//! assert_eq!(post.field_declaration("custom:color").unwrap().indexed_name(), "custom_s:color");
//! ```

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::field::{DynamicFieldDeclaration, FieldDeclaration, FieldOptions};
use super::field_type::FieldType;

/// Field declaration set for one domain type
#[derive(Debug, Clone)]
pub struct Setup {
    type_name: String,
    /// Declared direct ancestors
    family: Vec<String>,
    /// Flattened type tags (self first), filled in by the registry build
    type_tags: Vec<String>,
    fields: BTreeMap<String, FieldDeclaration>,
    text_fields: BTreeMap<String, FieldDeclaration>,
    dynamic_fields: BTreeMap<String, DynamicFieldDeclaration>,
}

impl Setup {
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            type_tags: vec![type_name.clone()],
            type_name,
            family: Vec::new(),
            fields: BTreeMap::new(),
            text_fields: BTreeMap::new(),
            dynamic_fields: BTreeMap::new(),
        }
    }

    /// Declare a field. Re-declaring the same name replaces the earlier declaration.
    pub fn field(
        &mut self,
        name: impl Into<String>,
        field_type: FieldType,
        options: FieldOptions,
    ) -> &mut Self {
        let declaration = FieldDeclaration::new(name, field_type, options);
        self.insert(declaration);
        self
    }

    /// Shorthand for a full-text field.
    pub fn text(&mut self, name: impl Into<String>, options: FieldOptions) -> &mut Self {
        self.field(name, FieldType::Text, options)
    }

    /// Declare a dynamic field family addressed as `base:key`.
    pub fn dynamic_field(
        &mut self,
        base: impl Into<String>,
        field_type: FieldType,
        options: FieldOptions,
    ) -> &mut Self {
        let declaration = DynamicFieldDeclaration::new(base, field_type, options);
        debug!(type_name = %self.type_name, base = %declaration.base(), "Declared dynamic field");
        self.dynamic_fields
            .insert(declaration.base().to_string(), declaration);
        self
    }

    /// Ancestor type tags this type should also match under.
    pub fn family<I, S>(&mut self, ancestors: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for ancestor in ancestors {
            let ancestor = ancestor.into();
            if ancestor != self.type_name && !self.family.contains(&ancestor) {
                self.family.push(ancestor);
            }
        }
        self
    }

    pub(crate) fn insert(&mut self, declaration: FieldDeclaration) {
        let target = if declaration.is_text() {
            &mut self.text_fields
        } else {
            &mut self.fields
        };
        match target.get(declaration.name()) {
            Some(existing) if *existing == declaration => return,
            Some(existing) => warn!(
                type_name = %self.type_name,
                field = %declaration.name(),
                previous = %existing.indexed_name(),
                replacement = %declaration.indexed_name(),
                "Field re-declared, replacing earlier declaration"
            ),
            None => debug!(
                type_name = %self.type_name,
                field = %declaration.name(),
                indexed_name = %declaration.indexed_name(),
                "Declared field"
            ),
        }
        target.insert(declaration.name().to_string(), declaration);
    }

    /// Copy an ancestor's declarations that this type does not override.
    pub(crate) fn inherit_from(&mut self, ancestor: &Setup) {
        for (name, decl) in &ancestor.fields {
            self.fields.entry(name.clone()).or_insert_with(|| decl.clone());
        }
        for (name, decl) in &ancestor.text_fields {
            self.text_fields.entry(name.clone()).or_insert_with(|| decl.clone());
        }
        for (base, decl) in &ancestor.dynamic_fields {
            self.dynamic_fields.entry(base.clone()).or_insert_with(|| decl.clone());
        }
    }

    pub(crate) fn set_type_tags(&mut self, tags: Vec<String>) {
        self.type_tags = tags;
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn declared_family(&self) -> &[String] {
        &self.family
    }

    /// This type plus every ancestor tag, nearest first
    pub fn type_tags(&self) -> &[String] {
        &self.type_tags
    }

    /// Resolve an attribute (non-text) field, including `base:key` dynamic fields.
    pub fn field_declaration(&self, name: &str) -> Option<FieldDeclaration> {
        if let Some(decl) = self.fields.get(name) {
            return Some(decl.clone());
        }
        let (base, key) = name.split_once(':')?;
        self.dynamic_fields.get(base).map(|d| d.resolve(key))
    }

    pub fn text_field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.text_fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDeclaration> {
        self.fields.values()
    }

    pub fn text_fields(&self) -> impl Iterator<Item = &FieldDeclaration> {
        self.text_fields.values()
    }

    pub fn dynamic_fields(&self) -> impl Iterator<Item = &DynamicFieldDeclaration> {
        self.dynamic_fields.values()
    }

    /// Find the declaration (attribute or text) bound to a wire-level name.
    pub fn by_indexed_name(&self, indexed_name: &str) -> Option<&FieldDeclaration> {
        self.fields
            .values()
            .chain(self.text_fields.values())
            .find(|f| f.indexed_name() == indexed_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_attribute_namespaces() {
        let mut setup = Setup::new("Post");
        setup
            .field("title", FieldType::String, FieldOptions::new())
            .field("title", FieldType::Text, FieldOptions::new());

        assert_eq!(setup.field_declaration("title").unwrap().indexed_name(), "title_s");
        assert_eq!(setup.text_field("title").unwrap().indexed_name(), "title_text");
    }

    #[test]
    fn test_redeclaration_is_idempotent() {
        let mut setup = Setup::new("Post");
        setup
            .field("rating", FieldType::Integer, FieldOptions::new())
            .field("rating", FieldType::Integer, FieldOptions::new());
        assert_eq!(setup.fields().count(), 1);
    }

    #[test]
    fn test_unknown_dynamic_base() {
        let setup = Setup::new("Post");
        assert!(setup.field_declaration("custom:color").is_none());
        assert!(setup.field_declaration("missing").is_none());
    }

    #[test]
    fn test_family_ignores_self_and_duplicates() {
        let mut setup = Setup::new("Post");
        setup.family(["Post", "Content", "Content"]);
        assert_eq!(setup.declared_family(), &["Content".to_string()]);
    }

    #[test]
    fn test_by_indexed_name() {
        let mut setup = Setup::new("Post");
        setup.field("title", FieldType::String, FieldOptions::new().stored());
        assert_eq!(setup.by_indexed_name("title_ss").unwrap().name(), "title");
        assert!(setup.by_indexed_name("title_s").is_none());
    }
}
