//! # Search Mapper
//!
//! A client-side mapping layer between typed domain objects and a remote
//! full-text, faceted search index.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Declaration (startup)                   │
//! │  • FieldType: suffix + wire codec                          │
//! │  • Setup per domain type, explicit type families           │
//! │  • Registry: read-only, shared behind Arc                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Query Translation                        │
//! │  • Restrictions → escaped filter queries                   │
//! │  • Multiselect tagging ({!tag} / {!ex})                    │
//! │  • Keywords, highlighting, ordering, paging                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   (one Transport::select call)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Result Processing                        │
//! │  • Hits with stored fields and highlights                  │
//! │  • Field / query / date-range facet rows                   │
//! │  • Lazy instances: one bulk load per facet or hit type     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use search_mapper::{
//!     FacetSort, FieldFacetOptions, FieldOptions, FieldType, KeywordOptions, RegistryBuilder,
//!     Session, SessionConfig, Transport,
//! };
//!
//! async fn search(transport: Arc<dyn Transport>) -> search_mapper::Result<()> {
//!     let mut builder = RegistryBuilder::new();
//!     builder
//!         .setup("Post")
//!         .field("blog_id", FieldType::Integer, FieldOptions::new().references("Blog"))
//!         .field("rating", FieldType::Integer, FieldOptions::new())
//!         .text("body", FieldOptions::new());
//!     let session = Session::new(Arc::new(builder.build()?), transport, SessionConfig::default());
//!
//!     let mut query = session.new_query(&["Post"])?;
//!     query.keywords("pizza", KeywordOptions::default())?;
//!     query.field("rating")?.greater_than(3)?;
//!     query.add_field_facet("blog_id", FieldFacetOptions::default().sort(FacetSort::Count))?;
//!
//!     let results = session.execute(query).await?;
//!     for row in results.facet("blog_id")?.rows()? {
//!         // the first instance() loads every blog in the facet at once
//!         let blog = row.instance().await?;
//!         println!("{} ({}) loaded={}", row.value(), row.count(), blog.is_some());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`SessionConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`schema`]: Field types, declarations, registry, document building
//! - [`search`]: Restrictions, scopes, keywords, request parameters
//! - [`facet`]: Field, query and date-range facets
//! - [`results`]: Hits and highlights
//! - [`session`]: Query execution against a [`Transport`]
//! - [`adapters`]: Transport and data accessor seams

pub mod adapters;
pub mod config;
pub mod error;
pub mod facet;
mod lazy;
pub mod metrics;
pub mod results;
pub mod schema;
pub mod search;
pub mod session;

pub use adapters::{DataAccessor, Instance, Transport};
pub use config::SessionConfig;
pub use error::{MapperError, Result};
pub use facet::{
    DateFacetOptions, Facet, FacetRow, FacetSort, FacetState, FacetValue, FieldFacetOptions,
    QueryFacetBuilder, QueryFacetOptions,
};
pub use results::{Highlight, Hit, SearchResults};
pub use schema::{
    CompositeSetup, DocumentBuilder, FieldDeclaration, FieldOptions, FieldType, FieldValue,
    Indexable, Registry, RegistryBuilder, Setup,
};
pub use search::{
    Direction, FilterHandle, KeywordOptions, Operator, Query, RequestParams, RestrictionArg,
    RestrictionOptions, Scope,
};
pub use session::Session;
