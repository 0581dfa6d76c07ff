// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::adapters::Instance;
use crate::config::SessionConfig;
use crate::error::{MapperError, Result};
use crate::lazy::LazyLoader;
use crate::schema::{FieldValue, Registry};

use super::highlight::Highlight;

/// One search result
pub struct Hit {
    id: String,
    class_name: String,
    primary_key: String,
    score: Option<f64>,
    doc: Map<String, Value>,
    highlights: Vec<Highlight>,
    registry: Arc<Registry>,
    loader: Option<Arc<LazyLoader>>,
}

impl Hit {
    /// Parse one entry of `response.docs`; `highlighting` is the response's
    /// highlighting section, keyed by document id.
    pub(crate) fn parse(
        doc: &Value,
        highlighting: Option<&Value>,
        registry: Arc<Registry>,
        config: &SessionConfig,
    ) -> Result<Self> {
        let doc = doc.as_object().ok_or_else(|| MapperError::InvalidResponse {
            message: format!("document {} is not an object", doc),
        })?;
        let id = doc
            .get(&config.id_field)
            .and_then(Value::as_str)
            .ok_or_else(|| MapperError::InvalidResponse {
                message: format!("document has no string '{}' field", config.id_field),
            })?
            .to_string();

        let (id_class, primary_key) = match id.split_once(' ') {
            Some((class, key)) => (Some(class), key.to_string()),
            None => (None, id.clone()),
        };
        let class_name = doc
            .get(&config.class_name_field)
            .and_then(Value::as_str)
            .or(id_class)
            .ok_or_else(|| MapperError::InvalidResponse {
                message: format!("cannot tell the type of document '{}'", id),
            })?
            .to_string();

        let score = doc.get("score").and_then(Value::as_f64);

        let mut highlights = Vec::new();
        if let Some(Value::Object(fields)) = highlighting.and_then(|h| h.get(&id)) {
            let setup = registry.setup(&class_name).ok();
            for (indexed_name, snippets) in fields {
                let field_name = setup
                    .and_then(|s| s.by_indexed_name(indexed_name))
                    .map(|f| f.name().to_string())
                    .unwrap_or_else(|| indexed_name.clone());
                for snippet in snippets.as_array().into_iter().flatten().filter_map(Value::as_str) {
                    highlights.push(Highlight::new(
                        field_name.clone(),
                        snippet,
                        config.highlight_pre.clone(),
                        config.highlight_post.clone(),
                    ));
                }
            }
        }

        Ok(Self {
            id,
            class_name,
            primary_key,
            score,
            doc: doc.clone(),
            highlights,
            registry,
            loader: None,
        })
    }

    pub(crate) fn set_loader(&mut self, loader: Arc<LazyLoader>) {
        self.loader = Some(loader);
    }

    /// Index document id, `"{Type} {primary key}"`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Relevance score, when requested
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Stored values of `field`, decoded with the hit's type declarations.
    pub fn stored(&self, field: &str) -> Result<Vec<FieldValue>> {
        let setup = self.registry.setup(&self.class_name)?;
        let declaration = setup
            .field_declaration(field)
            .or_else(|| setup.text_field(field).cloned())
            .ok_or_else(|| MapperError::unrecognized(field, vec![self.class_name.clone()]))?;
        let field_type = declaration.field_type();
        match self.doc.get(declaration.indexed_name()) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().map(|v| field_type.decode_json(v)).collect(),
            Some(value) => Ok(vec![field_type.decode_json(value)?]),
        }
    }

    /// First stored value of `field`
    pub fn stored_value(&self, field: &str) -> Result<Option<FieldValue>> {
        Ok(self.stored(field)?.into_iter().next())
    }

    pub fn highlights(&self, field: &str) -> Vec<&Highlight> {
        self.highlights
            .iter()
            .filter(|h| h.field_name() == field)
            .collect()
    }

    pub fn all_highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Domain instance; every hit of the same type in this search is loaded in one batch.
    pub async fn instance(&self) -> Result<Option<Instance>> {
        match &self.loader {
            Some(loader) => loader.instance(&self.primary_key).await,
            None => Ok(None),
        }
    }

    pub async fn instance_as<T: Any + Send + Sync>(&self) -> Result<Option<Arc<T>>> {
        Ok(self.instance().await?.and_then(|i| i.downcast::<T>().ok()))
    }
}

impl fmt::Debug for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hit")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("score", &self.score)
            .field("highlights", &self.highlights.len())
            .finish()
    }
}
