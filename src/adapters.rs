// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collaborator seams: the transport that talks to the index service and the
//! data accessors that bulk-load domain instances.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::search::RequestParams;

/// A loaded domain instance, type-erased so one registry can hold accessors
/// for many domain types.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Sends a fully built request to the index service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a select request and return the raw response document.
    async fn select(&self, params: &RequestParams) -> Result<serde_json::Value>;
}

/// Resolves reference keys to domain instances.
#[async_trait]
pub trait DataAccessor: Send + Sync {
    /// Load every instance whose identity is in `keys`, in any order.
    /// Missing keys are simply absent from the result.
    async fn load_all(&self, reference_type: &str, keys: &[String]) -> Result<Vec<Instance>>;

    /// Identity used to match a loaded instance back to its row or hit.
    fn identity_of(&self, instance: &Instance) -> Option<String>;
}
