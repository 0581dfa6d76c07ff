// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for a search session.
//!
//! # Example
//!
//! ```
//! use search_mapper::SessionConfig;
//!
//! // Minimal config (uses defaults)
//! let config = SessionConfig::default();
//! assert_eq!(config.default_per_page, 30);
//!
//! // Overrides
//! let config = SessionConfig {
//!     url: Some("http://localhost:8983/solr/default".into()),
//!     default_per_page: 50,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Marker inserted before each highlighted term by the index service.
pub const HIGHLIGHT_PRE: &str = "@@@hl@@@";
/// Marker inserted after each highlighted term by the index service.
pub const HIGHLIGHT_POST: &str = "@@@endhl@@@";

/// Session-level settings shared by every query the session builds.
///
/// All fields have defaults; `url` is only carried through for the transport.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Index service URL (e.g., "http://localhost:8983/solr/default")
    #[serde(default)]
    pub url: Option<String>,

    /// Page size when a query does not paginate explicitly
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Document field holding "{Type} {primary key}"
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Document field holding the flattened type family
    #[serde(default = "default_type_field")]
    pub type_field: String,

    /// Document field holding the concrete type name
    #[serde(default = "default_class_name_field")]
    pub class_name_field: String,

    /// facet.limit applied to field facets that set no limit (None = server default)
    #[serde(default)]
    pub default_facet_limit: Option<i64>,

    /// Highlight markers requested from the service
    #[serde(default = "default_highlight_pre")]
    pub highlight_pre: String,
    #[serde(default = "default_highlight_post")]
    pub highlight_post: String,

    /// Upper bound on keys per bulk-load call (None = one call per trigger)
    #[serde(default)]
    pub max_bulk_load_keys: Option<usize>,
}

fn default_per_page() -> u32 { 30 }
fn default_id_field() -> String { "id".to_string() }
fn default_type_field() -> String { "type".to_string() }
fn default_class_name_field() -> String { "class_name".to_string() }
fn default_highlight_pre() -> String { HIGHLIGHT_PRE.to_string() }
fn default_highlight_post() -> String { HIGHLIGHT_POST.to_string() }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: None,
            default_per_page: default_per_page(),
            id_field: default_id_field(),
            type_field: default_type_field(),
            class_name_field: default_class_name_field(),
            default_facet_limit: None,
            highlight_pre: default_highlight_pre(),
            highlight_post: default_highlight_post(),
            max_bulk_load_keys: None,
        }
    }
}
