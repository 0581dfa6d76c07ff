// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Field declarations: attribute → indexed-field bindings.
//!
//! ```text
//! logical name   type      options              indexed name
//! title          string    stored               title_ss
//! category_ids   integer   multiple             category_ids_im
//! body           text      boost 2.0            body_text
//! custom:color   string    dynamic, multiple    custom_sm:color
//! ```

use super::field_type::FieldType;

/// Declaration options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// Multi-valued field
    pub multiple: bool,
    /// Value is stored and returned with hits
    pub stored: bool,
    /// Query-time boost (text fields)
    pub boost: Option<f32>,
    /// Domain type whose identities this field holds
    pub reference_type: Option<String>,
    /// Source attribute read when building documents (defaults to the field name)
    pub using: Option<String>,
    /// Use the range-optimized field variant
    pub trie: bool,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    pub fn references(mut self, reference_type: impl Into<String>) -> Self {
        self.reference_type = Some(reference_type.into());
        self
    }

    pub fn using(mut self, source: impl Into<String>) -> Self {
        self.using = Some(source.into());
        self
    }

    pub fn trie(mut self) -> Self {
        self.trie = true;
        self
    }
}

/// An immutable binding of one logical field to its indexed field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    name: String,
    field_type: FieldType,
    options: FieldOptions,
    indexed_name: String,
    dynamic: bool,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, field_type: FieldType, options: FieldOptions) -> Self {
        let name = name.into();
        let indexed_name = format!("{}{}", name, type_marker(field_type, &options));
        Self {
            name,
            field_type,
            options,
            indexed_name,
            dynamic: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Wire-level field identifier
    pub fn indexed_name(&self) -> &str {
        &self.indexed_name
    }

    pub fn is_multiple(&self) -> bool {
        self.options.multiple
    }

    pub fn is_stored(&self) -> bool {
        self.options.stored
    }

    pub fn is_text(&self) -> bool {
        self.field_type == FieldType::Text
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn reference_type(&self) -> Option<&str> {
        self.options.reference_type.as_deref()
    }

    /// Attribute the document builder reads for this field
    pub fn source(&self) -> &str {
        self.options.using.as_deref().unwrap_or(&self.name)
    }

    /// Two declarations can be searched together only when they resolve to
    /// the same indexed field with the same type and multiplicity.
    pub fn is_compatible_with(&self, other: &FieldDeclaration) -> bool {
        self.field_type == other.field_type
            && self.options.multiple == other.options.multiple
            && self.indexed_name == other.indexed_name
    }
}

/// A dynamic field family: `base:key` resolves to one declaration per key
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFieldDeclaration {
    base: String,
    field_type: FieldType,
    options: FieldOptions,
}

impl DynamicFieldDeclaration {
    pub fn new(base: impl Into<String>, field_type: FieldType, options: FieldOptions) -> Self {
        Self {
            base: base.into(),
            field_type,
            options,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn source(&self) -> &str {
        self.options.using.as_deref().unwrap_or(&self.base)
    }

    /// Build the concrete declaration for `base:key`.
    pub fn resolve(&self, key: &str) -> FieldDeclaration {
        FieldDeclaration {
            name: format!("{}:{}", self.base, key),
            field_type: self.field_type,
            options: self.options.clone(),
            indexed_name: format!(
                "{}{}:{}",
                self.base,
                type_marker(self.field_type, &self.options),
                key
            ),
            dynamic: true,
        }
    }
}

fn type_marker(field_type: FieldType, options: &FieldOptions) -> String {
    let mut marker = field_type.suffix(options.trie).to_string();
    if options.multiple && field_type != FieldType::Text {
        marker.push('m');
    }
    if options.stored {
        marker.push('s');
    }
    marker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_names() {
        let title = FieldDeclaration::new("title", FieldType::String, FieldOptions::new().stored());
        assert_eq!(title.indexed_name(), "title_ss");

        let ids = FieldDeclaration::new("category_ids", FieldType::Integer, FieldOptions::new().multiple());
        assert_eq!(ids.indexed_name(), "category_ids_im");

        let body = FieldDeclaration::new("body", FieldType::Text, FieldOptions::new().multiple());
        assert_eq!(body.indexed_name(), "body_text");

        let at = FieldDeclaration::new("published_at", FieldType::Time, FieldOptions::new().trie());
        assert_eq!(at.indexed_name(), "published_at_dt");
    }

    #[test]
    fn test_dynamic_resolution() {
        let custom = DynamicFieldDeclaration::new("custom", FieldType::String, FieldOptions::new().multiple());
        let color = custom.resolve("color");
        assert_eq!(color.name(), "custom:color");
        assert_eq!(color.indexed_name(), "custom_sm:color");
        assert!(color.is_dynamic());
    }

    #[test]
    fn test_compatibility() {
        let a = FieldDeclaration::new("rating", FieldType::Integer, FieldOptions::new());
        let b = FieldDeclaration::new("rating", FieldType::Integer, FieldOptions::new().boost(2.0));
        let c = FieldDeclaration::new("rating", FieldType::Float, FieldOptions::new());
        let d = FieldDeclaration::new("rating", FieldType::Integer, FieldOptions::new().multiple());
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
        assert!(!a.is_compatible_with(&d));
    }

    #[test]
    fn test_source_defaults_to_name() {
        let plain = FieldDeclaration::new("title", FieldType::String, FieldOptions::new());
        assert_eq!(plain.source(), "title");
        let using = FieldDeclaration::new("sort_title", FieldType::String, FieldOptions::new().using("title"));
        assert_eq!(using.source(), "title");
    }
}
