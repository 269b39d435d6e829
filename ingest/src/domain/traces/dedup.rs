//! Trace emission decisions
//!
//! A trace record is emitted in full by roots and by spans that update trace
//! fields, shallow by the first span seen for a trace, and not at all
//! otherwise. Within one batch a full trace supersedes any shallow one.

use rustc_hash::FxHashSet;

use crate::data::cache::SeenTraces;
use crate::data::types::{EventType, IngestionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEmission {
    /// All resolved trace-level fields
    Full,
    /// id, timestamp and environment only
    Shallow,
    Skip,
}

/// Decide whether a span emits a trace record, marking the trace as seen.
pub fn decide(
    trace_id: &str,
    is_root: bool,
    has_trace_updates: bool,
    seen: &mut dyn SeenTraces,
) -> TraceEmission {
    let emission = if is_root || has_trace_updates {
        TraceEmission::Full
    } else if !seen.contains(trace_id) {
        TraceEmission::Shallow
    } else {
        TraceEmission::Skip
    };

    if emission != TraceEmission::Skip {
        seen.insert(trace_id);
    }
    emission
}

fn shallow_trace_id(event: &IngestionEvent) -> Option<&str> {
    event
        .trace_body()
        .filter(|body| body.is_shallow())
        .map(|body| body.id.as_str())
}

/// Drop shallow trace-creates made redundant by a full one for the same trace.
///
/// Keeps at most one shallow trace per ID when no full trace exists and
/// preserves the relative order of all retained events.
pub fn retain_full_traces(events: Vec<IngestionEvent>) -> Vec<IngestionEvent> {
    let full_ids: FxHashSet<String> = events
        .iter()
        .filter(|e| e.event_type == EventType::TraceCreate)
        .filter_map(|e| e.trace_body())
        .filter(|body| !body.is_shallow())
        .map(|body| body.id.clone())
        .collect();

    let before = events.len();
    let mut shallow_kept: FxHashSet<String> = FxHashSet::default();
    let retained: Vec<IngestionEvent> = events
        .into_iter()
        .filter(|event| match shallow_trace_id(event) {
            Some(id) => !full_ids.contains(id) && shallow_kept.insert(id.to_string()),
            None => true,
        })
        .collect();

    let dropped = before - retained.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped redundant shallow traces");
    }
    retained
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::data::types::TraceBody;

    fn shallow(id: &str) -> IngestionEvent {
        IngestionEvent::trace(
            "t".to_string(),
            TraceBody {
                id: id.to_string(),
                timestamp: "t".to_string(),
                environment: "default".to_string(),
                ..Default::default()
            },
        )
    }

    fn full(id: &str, name: &str) -> IngestionEvent {
        IngestionEvent::trace(
            "t".to_string(),
            TraceBody {
                id: id.to_string(),
                timestamp: "t".to_string(),
                environment: "default".to_string(),
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_decide_rule_table() {
        let mut seen: HashSet<String> = HashSet::new();

        assert_eq!(decide("t1", false, false, &mut seen), TraceEmission::Shallow);
        assert!(seen.contains("t1"));
        assert_eq!(decide("t1", false, false, &mut seen), TraceEmission::Skip);
        assert_eq!(decide("t1", true, false, &mut seen), TraceEmission::Full);
        assert_eq!(decide("t1", false, true, &mut seen), TraceEmission::Full);
    }

    #[test]
    fn test_decide_full_on_unseen_root_marks_seen() {
        let mut seen: HashSet<String> = HashSet::new();
        assert_eq!(decide("t2", true, false, &mut seen), TraceEmission::Full);
        assert_eq!(decide("t2", false, false, &mut seen), TraceEmission::Skip);
    }

    #[test]
    fn test_full_supersedes_earlier_shallow() {
        let events = vec![shallow("t1"), full("t1", "root")];
        let retained = retain_full_traces(events);
        assert_eq!(retained.len(), 1);
        assert_eq!(
            retained[0].trace_body().and_then(|b| b.name.as_deref()),
            Some("root")
        );
    }

    #[test]
    fn test_full_supersedes_later_shallow() {
        let events = vec![full("t1", "root"), shallow("t1"), shallow("t2")];
        let retained = retain_full_traces(events);
        let ids: Vec<&str> = retained
            .iter()
            .filter_map(|e| e.trace_body())
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_duplicate_shallow_kept_once() {
        let retained = retain_full_traces(vec![shallow("t1"), shallow("t1")]);
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn test_multiple_full_traces_are_all_kept() {
        let retained = retain_full_traces(vec![full("t1", "a"), full("t1", "b")]);
        assert_eq!(retained.len(), 2);
    }
}
