//! Seen-traces store
//!
//! The trace dedup decision needs a set of trace IDs that already had a
//! trace-create emitted. The set is owned by the caller and threaded through
//! every processing call:
//! - `HashSet` / `FxHashSet` - one set per request or per connection
//! - `SharedSeenTraces` - bounded moka cache with TTL, shared by clones

mod backend;
mod memory;

pub use backend::SeenTraces;
pub use memory::SharedSeenTraces;
