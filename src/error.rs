// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error taxonomy for declaration, translation, execution and lazy population.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    /// A declaration named a type tag the field type registry does not know.
    #[error("unknown field type '{tag}'")]
    UnknownFieldType { tag: String },

    /// A restriction, facet, ordering or keyword field is absent on (or declared
    /// differently across) the searched types.
    #[error("no field configured for '{field}' on type(s) {}", .types.join(", "))]
    UnrecognizedField { field: String, types: Vec<String> },

    /// Malformed arity, value shape or option combination.
    #[error("argument error: {message}")]
    Argument { message: String },

    /// Facet rows were read before the owning query was executed.
    #[error("facet '{facet}' has not been executed yet")]
    FacetNotYetExecuted { facet: String },

    #[error("no facet named '{name}' was requested")]
    UnknownFacet { name: String },

    #[error("type '{type_name}' is not registered")]
    UnknownType { type_name: String },

    #[error("facet '{facet}' already has a row labelled {label}")]
    DuplicateFacetRow { facet: String, label: String },

    #[error("cannot decode '{value}' as {field_type}")]
    Decode { field_type: String, value: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("data accessor for '{reference_type}' failed: {message}")]
    Accessor { reference_type: String, message: String },
}

impl MapperError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        MapperError::Argument {
            message: message.into(),
        }
    }

    pub(crate) fn unrecognized(field: impl Into<String>, types: Vec<String>) -> Self {
        MapperError::UnrecognizedField {
            field: field.into(),
            types,
        }
    }

    /// Short label used for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MapperError::UnknownFieldType { .. } => "unknown_field_type",
            MapperError::UnrecognizedField { .. } => "unrecognized_field",
            MapperError::Argument { .. } => "argument",
            MapperError::FacetNotYetExecuted { .. } => "facet_not_executed",
            MapperError::UnknownFacet { .. } => "unknown_facet",
            MapperError::UnknownType { .. } => "unknown_type",
            MapperError::DuplicateFacetRow { .. } => "duplicate_facet_row",
            MapperError::Decode { .. } => "decode",
            MapperError::InvalidResponse { .. } => "invalid_response",
            MapperError::Transport { .. } => "transport",
            MapperError::Accessor { .. } => "accessor",
        }
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_field_names_types() {
        let err = MapperError::unrecognized("title", vec!["Post".into(), "Comment".into()]);
        let msg = err.to_string();
        assert!(msg.contains("title"));
        assert!(msg.contains("Post, Comment"));
        assert_eq!(err.kind(), "unrecognized_field");
    }

    #[test]
    fn test_facet_not_executed_message() {
        let err = MapperError::FacetNotYetExecuted {
            facet: "category_ids".into(),
        };
        assert_eq!(err.to_string(), "facet 'category_ids' has not been executed yet");
    }
}
