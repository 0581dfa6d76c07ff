// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Searchable attribute declarations for domain types.
//!
//! # Architecture
//!
//! ```text
//! FieldType (codec + suffix)
//!     ↓
//! FieldDeclaration (logical name → indexed name)
//!     ↓
//! Setup (one per domain type, type family)
//!     ↓
//! Registry (all setups + data accessors, read-only)
//!     ↓
//! CompositeSetup (field resolution across searched types)
//! ```
//!
//! # Design
//!
//! - **Write once**: the registry is built at startup and shared behind `Arc`
//! - **Explicit families**: each type lists the ancestor tags it also matches under
//! - **Strict compatibility**: a field used across types must be declared identically

mod document;
mod field;
mod field_type;
mod registry;
mod setup;

pub use document::{DocumentBuilder, Indexable};
pub use field::{DynamicFieldDeclaration, FieldDeclaration, FieldOptions};
pub use field_type::{FieldType, FieldValue};
pub use registry::{CompositeSetup, Registry, RegistryBuilder};
pub use setup::Setup;
