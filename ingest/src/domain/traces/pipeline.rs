//! Span Ingestion Pipeline
//!
//! Converts a batch of OTel resource spans into Langfuse ingestion events:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                        SPAN INGESTION PIPELINE                           │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐   ┌─────────┐  │
//! │  │0. SCOPES │──▶│1. RESOLVE│──▶│2.CLASSIFY│──▶│3. DEDUP │──▶│4.ASSEMBL│  │
//! │  │          │   │          │   │          │   │         │   │         │  │
//! │  │ SDK key  │   │ Layered  │   │ Span /   │   │ Full /  │   │ Trace + │  │
//! │  │ check    │   │ passes   │   │ Gen /    │   │ Shallow │   │ Observ. │  │
//! │  │          │   │          │   │ Event    │   │ / Skip  │   │ events  │  │
//! │  └──────────┘   └──────────┘   └──────────┘   └─────────┘   └─────────┘  │
//! │                                                                          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stage Details
//!
//! | Stage       | Input                                 | Output                    | Module        |
//! |-------------|---------------------------------------|---------------------------|---------------|
//! | 0. Scopes   | `&[ResourceSpan]`, `IngestConfig`     | `Result<(), IngestError>` | `pipeline.rs` |
//! | 1. Resolve  | `ResolveContext`                      | `EntityUpdate` x2         | `extract/`    |
//! | 2. Classify | `&AttributeMap`, resolved observation | `ObservationKind`         | `classify.rs` |
//! | 3. Dedup    | trace id, root flag, `SeenTraces`     | `TraceEmission`           | `dedup.rs`    |
//! | 4. Assemble | `SpanFacts`, `ResolvedSpan`           | `Vec<IngestionEvent>`     | `assemble.rs` |
//!
//! After every span is assembled, shallow traces made redundant by a full
//! trace in the same batch are dropped.

use serde_json::Value as JsonValue;

use super::assemble::{ResolvedSpan, SpanFacts, assemble, metadata_seed};
use super::classify::{classify, has_trace_updates, is_root, resolve_span_name};
use super::dedup::{decide, retain_full_traces};
use super::error::IngestError;
use super::extract::{DecodedEvent, ResolveContext, Target, layer_attributes, resolve};
use crate::core::config::IngestConfig;
use crate::core::constants::{LANGFUSE_SDK_SCOPE_PREFIX, SCOPE_PUBLIC_KEY_ATTR};
use crate::data::cache::SeenTraces;
use crate::data::types::{IngestionEvent, InstrumentationScope, OtelSpan, ResourceSpan};
use crate::utils::json::value_to_string;
use crate::utils::otlp::{AttributeMap, decode_attributes};

// ============================================================================
// PROCESSOR
// ============================================================================

/// Batch converter from OTel resource spans to ingestion events.
///
/// Holds only the ingesting project's identity; the seen-traces set is
/// supplied per call.
#[derive(Debug, Clone, Default)]
pub struct OtelIngestProcessor {
    config: IngestConfig,
}

impl OtelIngestProcessor {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Convert a batch.
    ///
    /// Fails without emitting anything (and without touching `seen`) when a
    /// native SDK scope declares a foreign public key.
    pub fn process(
        &self,
        resource_spans: &[ResourceSpan],
        seen: &mut dyn SeenTraces,
    ) -> Result<Vec<IngestionEvent>, IngestError> {
        self.validate_scopes(resource_spans)?;

        let mut events = Vec::new();
        for resource_span in resource_spans {
            let resource_attrs = decode_attributes(&resource_span.resource.attributes);
            for scope_span in &resource_span.scope_spans {
                let scope = &scope_span.scope;
                let sdk_scope = is_langfuse_sdk_scope(scope);
                for span in &scope_span.spans {
                    events.extend(self.process_span(span, &resource_attrs, scope, sdk_scope, seen));
                }
            }
        }

        let events = retain_full_traces(events);
        tracing::debug!(
            resource_spans = resource_spans.len(),
            events = events.len(),
            "Converted span batch"
        );
        Ok(events)
    }

    fn process_span(
        &self,
        span: &OtelSpan,
        resource_attrs: &AttributeMap,
        scope: &InstrumentationScope,
        sdk_scope: bool,
        seen: &mut dyn SeenTraces,
    ) -> Vec<IngestionEvent> {
        let Some(facts) = SpanFacts::from_span(span) else {
            return Vec::new();
        };

        let span_attrs = decode_attributes(&span.attributes);
        let attributes = layer_attributes(resource_attrs, &span_attrs);
        let span_events: Vec<DecodedEvent> = span.events.iter().map(DecodedEvent::from).collect();
        let display_name = resolve_span_name(&span.name, &attributes);

        let ctx = ResolveContext {
            attributes: &attributes,
            events: &span_events,
            span_name: &display_name,
        };
        let trace = resolve(&ctx, Target::Trace);
        let observation = resolve(&ctx, Target::Observation);

        let kind = classify(&attributes, &observation);
        let root = is_root(facts.parent_id.as_deref(), &attributes);
        let emission = decide(&facts.trace_id, root, has_trace_updates(&span_attrs), seen);

        tracing::trace!(
            trace_id = %facts.trace_id,
            span_id = %facts.span_id,
            kind = kind.as_str(),
            ?emission,
            "Classified span"
        );

        let metadata_seed = metadata_seed(resource_attrs, scope, (!sdk_scope).then_some(&span_attrs));
        assemble(
            &facts,
            ResolvedSpan {
                display_name,
                kind,
                emission,
                is_root: root,
                trace,
                observation,
                metadata_seed,
            },
        )
    }

    /// Every native SDK scope must carry the ingesting project's public key,
    /// or none when the project has none.
    fn validate_scopes(&self, resource_spans: &[ResourceSpan]) -> Result<(), IngestError> {
        let scopes = resource_spans
            .iter()
            .flat_map(|rs| &rs.scope_spans)
            .map(|ss| &ss.scope)
            .filter(|scope| is_langfuse_sdk_scope(scope));

        for scope in scopes {
            let received = decode_attributes(&scope.attributes)
                .get(SCOPE_PUBLIC_KEY_ATTR)
                .and_then(value_to_string);
            let expected = self.config.public_key.as_deref();

            if received.as_deref() != expected {
                let project_id = self.config.project_id.clone().unwrap_or_default();
                tracing::warn!(
                    scope = %scope.name,
                    project_id = %project_id,
                    "Rejecting batch: Langfuse SDK public key mismatch"
                );
                return Err(IngestError::PublicKeyMismatch {
                    project_id,
                    expected: expected.unwrap_or("<unset>").to_string(),
                    received: received.unwrap_or_else(|| "<missing>".to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Whether a scope was produced by a native Langfuse SDK
pub fn is_langfuse_sdk_scope(scope: &InstrumentationScope) -> bool {
    scope.name.starts_with(LANGFUSE_SDK_SCOPE_PREFIX)
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Count spans in a raw JSON payload (`{resourceSpans: [...]}` or a bare array).
///
/// Null or missing lists count as zero. Returns -1 when the tree has a shape
/// that cannot hold spans, e.g. a string where a list is expected.
pub fn count_spans(payload: &JsonValue) -> i64 {
    let counted = match payload {
        JsonValue::Null => return 0,
        JsonValue::Array(_) => try_count_spans(Some(payload)),
        JsonValue::Object(map) => try_count_spans(map.get("resourceSpans")),
        _ => None,
    };
    counted.unwrap_or_else(|| {
        tracing::debug!("Malformed span payload, cannot count spans");
        -1
    })
}

fn try_count_spans(resource_spans: Option<&JsonValue>) -> Option<i64> {
    let mut total = 0_i64;
    for resource_span in list(resource_spans)?.iter().filter(|v| !v.is_null()) {
        let resource_span = resource_span.as_object()?;
        for scope_span in list(resource_span.get("scopeSpans"))?
            .iter()
            .filter(|v| !v.is_null())
        {
            let spans = list(scope_span.as_object()?.get("spans"))?;
            total += spans.iter().filter(|v| !v.is_null()).count() as i64;
        }
    }
    Some(total)
}

/// Missing or null is an empty list; any other non-array is malformed.
fn list(value: Option<&JsonValue>) -> Option<&[JsonValue]> {
    match value {
        None | Some(JsonValue::Null) => Some(&[]),
        Some(JsonValue::Array(items)) => Some(items),
        Some(_) => None,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
