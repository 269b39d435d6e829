//! Span classification
//!
//! Decides which ingestion entity a span becomes, its display name, whether
//! it carries trace-level updates and whether it acts as a trace root.

use super::extract::{EntityUpdate, keys};
use crate::data::types::{ObservationKind, ObservationType};
use crate::utils::json::{value_is_true_literal, value_to_string};
use crate::utils::otlp::AttributeMap;

/// Attribute keys whose presence marks a span as a model call
const GENERATION_MARKER_KEYS: &[&str] = &[
    keys::GEN_AI_REQUEST_MODEL,
    keys::GEN_AI_RESPONSE_MODEL,
    keys::LLM_MODEL_NAME,
    keys::AI_MODEL_ID,
    keys::MODEL,
];

/// Attribute key prefixes whose presence marks a span as a model call
const GENERATION_MARKER_PREFIXES: &[&str] =
    &[keys::GEN_AI_USAGE_PREFIX, keys::LLM_TOKEN_COUNT_PREFIX];

/// Span attributes (besides `langfuse.trace.*`) that update the trace record
const TRACE_UPDATE_KEYS: &[&str] = &[
    keys::LANGFUSE_USER_ID,
    keys::USER_ID,
    keys::LANGFUSE_SESSION_ID,
    keys::SESSION_ID,
    keys::LANGFUSE_TAGS,
    keys::LANGFUSE_PUBLIC,
    keys::LANGFUSE_RELEASE,
    keys::LANGFUSE_VERSION,
];

/// Classify a span from its attributes and its resolved observation.
///
/// Priority: explicit `langfuse.observation.type`, OpenInference `LLM` kind,
/// GenAI model/usage attributes, a resolved model or usage, then span.
pub fn classify(attrs: &AttributeMap, resolved: &EntityUpdate) -> ObservationKind {
    if let Some(declared) = attrs
        .get(keys::LANGFUSE_OBSERVATION_TYPE)
        .and_then(value_to_string)
    {
        match ObservationType::parse(&declared) {
            Some(ty) => return ty.kind(),
            None => tracing::debug!(
                declared = %declared,
                "Unknown observation type, classifying by attributes"
            ),
        }
    }

    if attrs
        .get(keys::OPENINFERENCE_SPAN_KIND)
        .and_then(|v| v.as_str())
        .is_some_and(|kind| kind.eq_ignore_ascii_case("llm"))
    {
        return ObservationKind::Generation;
    }

    let has_marker = attrs.iter().any(|(key, value)| {
        !value.is_null()
            && (GENERATION_MARKER_KEYS.contains(&key.as_str())
                || GENERATION_MARKER_PREFIXES
                    .iter()
                    .any(|prefix| key.starts_with(prefix)))
    });
    if has_marker {
        return ObservationKind::Generation;
    }

    // Usage may come from span events alone
    if resolved.model.as_deref().is_some_and(|m| !m.is_empty())
        || resolved.usage_details.is_some()
    {
        return ObservationKind::Generation;
    }

    ObservationKind::Span
}

/// Display name: `logfire.msg` overrides the OTel span name.
pub fn resolve_span_name(span_name: &str, attrs: &AttributeMap) -> String {
    attrs
        .get(keys::LOGFIRE_MSG)
        .and_then(value_to_string)
        .filter(|msg| !msg.is_empty())
        .unwrap_or_else(|| span_name.to_string())
}

/// Whether the span's own attributes update trace-level fields.
///
/// Resource attributes are not considered; they repeat on every span.
pub fn has_trace_updates(span_attrs: &AttributeMap) -> bool {
    span_attrs.keys().any(|key| {
        key.starts_with(keys::LANGFUSE_TRACE_PREFIX) || TRACE_UPDATE_KEYS.contains(&key.as_str())
    })
}

/// A span is a root if it has no parent or is flagged `langfuse.internal.as_root`.
pub fn is_root(parent_id: Option<&str>, attrs: &AttributeMap) -> bool {
    parent_id.is_none()
        || attrs
            .get(keys::LANGFUSE_AS_ROOT)
            .is_some_and(value_is_true_literal)
}
