//! Seen-traces capability

use std::collections::HashSet;
use std::hash::BuildHasher;

/// Set-like membership test + insert over trace IDs
///
/// Implementations backed by shared state must tolerate concurrent callers;
/// a check followed by an insert is not required to be atomic. Two workers
/// racing on the same trace ID may both emit a full trace, which downstream
/// treats as an upsert.
pub trait SeenTraces {
    /// Whether a trace-create was already emitted for this trace ID
    fn contains(&self, trace_id: &str) -> bool;

    /// Record the trace ID. Returns `true` if it was not present before.
    fn insert(&mut self, trace_id: &str) -> bool;
}

impl<S: BuildHasher> SeenTraces for HashSet<String, S> {
    fn contains(&self, trace_id: &str) -> bool {
        HashSet::contains(self, trace_id)
    }

    fn insert(&mut self, trace_id: &str) -> bool {
        if HashSet::contains(self, trace_id) {
            false
        } else {
            HashSet::insert(self, trace_id.to_string())
        }
    }
}
