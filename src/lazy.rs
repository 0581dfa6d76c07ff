// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Lazy instance population.
//!
//! A loader is shared by every row of one facet (or every hit of one class in
//! one search). The first `instance` access on any of them runs the bulk load;
//! later accesses read the memoized map.
//!
//! ```text
//! row.instance() ──→ LazyLoader::instance(key)
//!                        │
//!                        ├─→ loaded? map lookup (no I/O)
//!                        │
//!                        └─→ load_all(reference_type, keys) once
//!                                 └─→ identity_of(instance) → key
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::adapters::{DataAccessor, Instance};
use crate::error::{MapperError, Result};
use crate::metrics;

pub(crate) struct LazyLoader {
    reference_type: String,
    keys: Vec<String>,
    accessor: Option<Arc<dyn DataAccessor>>,
    /// Maximum keys per `load_all` call (None = all at once)
    batch_limit: Option<usize>,
    loaded: OnceCell<HashMap<String, Instance>>,
}

impl LazyLoader {
    pub(crate) fn new(
        reference_type: impl Into<String>,
        keys: Vec<String>,
        accessor: Option<Arc<dyn DataAccessor>>,
        batch_limit: Option<usize>,
    ) -> Self {
        let mut seen = HashSet::new();
        let keys = keys.into_iter().filter(|k| seen.insert(k.clone())).collect();
        Self {
            reference_type: reference_type.into(),
            keys,
            accessor,
            batch_limit,
            loaded: OnceCell::new(),
        }
    }

    /// Whether the bulk load has already run.
    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Instance for `key`, running the bulk load on first use.
    ///
    /// Keys with no returned instance resolve to `None`.
    pub(crate) async fn instance(&self, key: &str) -> Result<Option<Instance>> {
        let loaded = self.loaded.get_or_try_init(|| self.load()).await?;
        Ok(loaded.get(key).cloned())
    }

    async fn load(&self) -> Result<HashMap<String, Instance>> {
        let accessor = self.accessor.as_ref().ok_or_else(|| MapperError::Accessor {
            reference_type: self.reference_type.clone(),
            message: "no data accessor registered".to_string(),
        })?;

        let mut loaded = HashMap::with_capacity(self.keys.len());
        if self.keys.is_empty() {
            return Ok(loaded);
        }

        let chunk_size = self
            .batch_limit
            .filter(|limit| *limit > 0)
            .unwrap_or(self.keys.len());
        for chunk in self.keys.chunks(chunk_size) {
            let instances = accessor.load_all(&self.reference_type, chunk).await?;
            for instance in instances {
                if let Some(identity) = accessor.identity_of(&instance) {
                    loaded.insert(identity, instance);
                }
            }
        }

        metrics::record_bulk_load(&self.reference_type, self.keys.len(), loaded.len());
        debug!(
            reference_type = %self.reference_type,
            requested = self.keys.len(),
            loaded = loaded.len(),
            "Bulk loaded instances"
        );
        let missing = self.keys.iter().filter(|k| !loaded.contains_key(*k)).count();
        if missing > 0 {
            debug!(
                reference_type = %self.reference_type,
                missing,
                "Keys without a matching instance"
            );
        }
        Ok(loaded)
    }
}

impl fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyLoader")
            .field("reference_type", &self.reference_type)
            .field("keys", &self.keys)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Blogs {
        calls: AtomicUsize,
        batches: parking_lot::Mutex<Vec<Vec<String>>>,
    }

    impl Blogs {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                batches: parking_lot::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DataAccessor for Blogs {
        async fn load_all(&self, _reference_type: &str, keys: &[String]) -> Result<Vec<Instance>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().push(keys.to_vec());
            // "404" was deleted
            Ok(keys
                .iter()
                .filter(|k| k.as_str() != "404")
                .rev()
                .map(|k| Arc::new(k.clone()) as Instance)
                .collect())
        }

        fn identity_of(&self, instance: &Instance) -> Option<String> {
            instance.downcast_ref::<String>().cloned()
        }
    }

    #[tokio::test]
    async fn test_single_load_for_all_keys() {
        let blogs = Blogs::new();
        let loader = LazyLoader::new(
            "Blog",
            vec!["1".into(), "2".into(), "1".into()],
            Some(blogs.clone() as Arc<dyn DataAccessor>),
            None,
        );
        assert!(!loader.is_loaded());

        let first = loader.instance("2").await.unwrap().unwrap();
        assert_eq!(first.downcast_ref::<String>().unwrap(), "2");
        assert!(loader.instance("1").await.unwrap().is_some());

        assert_eq!(blogs.calls.load(Ordering::SeqCst), 1);
        assert_eq!(blogs.batches.lock()[0], vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_instance_is_none() {
        let blogs = Blogs::new();
        let loader = LazyLoader::new(
            "Blog",
            vec!["1".into(), "404".into()],
            Some(blogs.clone() as Arc<dyn DataAccessor>),
            None,
        );
        assert!(loader.instance("404").await.unwrap().is_none());
        assert!(loader.instance("1").await.unwrap().is_some());
        assert_eq!(blogs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_limit_chunks_keys() {
        let blogs = Blogs::new();
        let keys = (1..=5).map(|i| i.to_string()).collect();
        let loader = LazyLoader::new("Blog", keys, Some(blogs.clone() as Arc<dyn DataAccessor>), Some(2));
        loader.instance("5").await.unwrap();
        loader.instance("3").await.unwrap();
        assert_eq!(blogs.calls.load(Ordering::SeqCst), 3);
        assert_eq!(blogs.batches.lock()[2], vec!["5".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_accessor_errors_at_access() {
        let loader = LazyLoader::new("Blog", vec!["1".into()], None, None);
        let err = loader.instance("1").await.unwrap_err();
        assert!(matches!(err, MapperError::Accessor { .. }));
    }
}
