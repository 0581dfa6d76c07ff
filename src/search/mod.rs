// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Translation
//!
//! Turns typed restrictions, keywords and facet requests into the key/value
//! parameters of the index service's select protocol.
//!
//! # Architecture
//!
//! ```text
//! Query
//!   ├─→ Scope (ScopeNode tree of Restrictions) → fq=...
//!   ├─→ Keywords → q / qf / pf / mm / hl.*
//!   └─→ Facets → facet.field / facet.query / facet.date
//!         ↓
//!   RequestParams → Transport
//! ```
//!
//! # Query Language
//!
//! ```text
//! title_s:Pizza\ Party          - equal (reserved characters escaped)
//! -title_s:Draft                - negated
//! rating_i:[* TO 3]             - less than
//! rating_i:[4 TO *]             - greater than
//! rating_i:[1 TO 5]             - between
//! category_ids_im:(1 OR 2)      - any of
//! category_ids_im:(1 AND 2)     - all of
//! -blog_id_i:[* TO *]           - is null
//! {!tag=f1}category_ids_im:2    - tagged for multiselect faceting
//! ```

mod escape;
mod keywords;
mod params;
mod query;
mod restriction;
mod scope;

pub use escape::{escape, is_reserved};
pub use keywords::{HighlightOptions, KeywordOptions};
pub use params::RequestParams;
pub use query::{Direction, Query};
pub use restriction::{
    split_args, Operator, Restriction, RestrictionArg, RestrictionOptions, RestrictionValue,
};
pub use scope::{FieldScope, FilterHandle, Scope, ScopeNode};
