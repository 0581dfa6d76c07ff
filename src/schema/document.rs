// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index document building.
//!
//! Turns a domain object into the JSON document the index service stores:
//!
//! ```text
//! {
//!   "id": "Post 1",
//!   "type": ["Post", "Content"],
//!   "class_name": "Post",
//!   "title_ss": "Hello",
//!   "category_ids_im": [1, 2],
//!   "body_text": "..."
//! }
//! ```

use serde_json::{Map, Value};

use crate::config::SessionConfig;
use crate::error::{MapperError, Result};

use super::field::FieldDeclaration;
use super::field_type::{FieldType, FieldValue};
use super::registry::Registry;

/// A domain object that can be indexed.
pub trait Indexable {
    /// Primary key, unique within the object's type
    fn primary_key(&self) -> String;

    /// Values of one source attribute (a field name or its `using` source).
    fn field_values(&self, source: &str) -> Vec<FieldValue>;

    /// `(key, values)` pairs for a dynamic field family.
    fn dynamic_values(&self, _base: &str) -> Vec<(String, Vec<FieldValue>)> {
        Vec::new()
    }
}

/// Builds index documents from registered declarations
pub struct DocumentBuilder<'a> {
    registry: &'a Registry,
    config: &'a SessionConfig,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(registry: &'a Registry, config: &'a SessionConfig) -> Self {
        Self { registry, config }
    }

    /// Build the document for `object`, declared as `type_name`.
    pub fn build(&self, type_name: &str, object: &dyn Indexable) -> Result<Map<String, Value>> {
        let setup = self.registry.setup(type_name)?;
        let mut doc = Map::new();
        doc.insert(
            self.config.id_field.clone(),
            Value::String(format!("{} {}", type_name, object.primary_key())),
        );
        doc.insert(
            self.config.type_field.clone(),
            Value::Array(setup.type_tags().iter().cloned().map(Value::String).collect()),
        );
        doc.insert(
            self.config.class_name_field.clone(),
            Value::String(type_name.to_string()),
        );

        for field in setup.fields().chain(setup.text_fields()) {
            let values = object.field_values(field.source());
            add_field(&mut doc, field, &values)?;
        }
        for dynamic in setup.dynamic_fields() {
            for (key, values) in object.dynamic_values(dynamic.source()) {
                add_field(&mut doc, &dynamic.resolve(&key), &values)?;
            }
        }
        Ok(doc)
    }
}

fn add_field(doc: &mut Map<String, Value>, field: &FieldDeclaration, values: &[FieldValue]) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    if values.len() > 1 && !field.is_multiple() && !field.is_text() {
        return Err(MapperError::argument(format!(
            "field '{}' is single-valued but {} values were supplied",
            field.name(),
            values.len()
        )));
    }
    let encoded = values
        .iter()
        .map(|v| encode_json(field.field_type(), v))
        .collect::<Result<Vec<_>>>()?;
    let value = if field.is_multiple() || encoded.len() > 1 {
        Value::Array(encoded)
    } else {
        encoded.into_iter().next().unwrap_or(Value::Null)
    };
    doc.insert(field.indexed_name().to_string(), value);
    Ok(())
}

fn encode_json(field_type: FieldType, value: &FieldValue) -> Result<Value> {
    let wire = field_type.encode(value)?;
    Ok(match value {
        FieldValue::Int(v) => Value::from(*v),
        FieldValue::Bool(b) => Value::Bool(*b),
        _ => Value::String(wire),
    })
}
