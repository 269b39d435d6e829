//! Shared seen-traces store backed by moka
//!
//! Bounded by entry count with TinyLFU eviction and an optional time-to-live,
//! so a long-lived collector connection does not grow the set without limit.
//! Clones share the same underlying cache.

use std::time::Duration;

use moka::sync::Cache;

use super::backend::SeenTraces;
use crate::core::config::SeenTracesConfig;

#[derive(Clone)]
pub struct SharedSeenTraces {
    cache: Cache<String, ()>,
}

impl std::fmt::Debug for SharedSeenTraces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSeenTraces")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl SharedSeenTraces {
    pub fn new(config: &SeenTracesConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_entries);
        if config.ttl_secs > 0 {
            builder = builder.time_to_live(Duration::from_secs(config.ttl_secs));
        }
        tracing::debug!(
            max_entries = config.max_entries,
            ttl_secs = config.ttl_secs,
            "Initializing shared seen-traces cache"
        );
        Self {
            cache: builder.build(),
        }
    }
}

impl Default for SharedSeenTraces {
    fn default() -> Self {
        Self::new(&SeenTracesConfig::default())
    }
}

impl SeenTraces for SharedSeenTraces {
    fn contains(&self, trace_id: &str) -> bool {
        self.cache.contains_key(trace_id)
    }

    fn insert(&mut self, trace_id: &str) -> bool {
        self.cache.entry_by_ref(trace_id).or_insert(()).is_fresh()
    }
}
