//! Ingestion event assembly
//!
//! Turns one span's resolved trace and observation updates into the ordered
//! events it contributes: an optional `trace-create`, then exactly one
//! observation event.

use serde_json::{Map, Value as JsonValue, json};

use super::dedup::TraceEmission;
use super::extract::EntityUpdate;
use crate::core::constants::{DEFAULT_ENVIRONMENT, STATUS_CODE_ERROR};
use crate::data::types::{
    IngestionEvent, InstrumentationScope, ObservationBody, ObservationKind, ObservationLevel,
    OtelSpan, TraceBody,
};
use crate::utils::otlp::{AttributeMap, decode_id};
use crate::utils::time::{decode_nano_timestamp, nano_timestamp_to_u64};

const SPAN_ATTRIBUTES_KEY: &str = "attributes";

/// Identity and timing decoded from the raw span
#[derive(Debug, Clone, PartialEq)]
pub struct SpanFacts {
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status_code: i32,
    pub status_message: Option<String>,
}

impl SpanFacts {
    /// Decode ids and timestamps. Spans without a trace or span id yield `None`.
    pub fn from_span(span: &OtelSpan) -> Option<Self> {
        let Some(trace_id) = decode_id(&span.trace_id) else {
            tracing::warn!(span_name = %span.name, "Skipping span without trace id");
            return None;
        };
        let Some(span_id) = decode_id(&span.span_id) else {
            tracing::warn!(span_name = %span.name, trace_id = %trace_id, "Skipping span without span id");
            return None;
        };

        let end_time = (nano_timestamp_to_u64(&span.end_time_unix_nano) > 0)
            .then(|| decode_nano_timestamp(&span.end_time_unix_nano));

        Some(Self {
            trace_id,
            span_id,
            parent_id: decode_id(&span.parent_span_id),
            start_time: decode_nano_timestamp(&span.start_time_unix_nano),
            end_time,
            status_code: span.status.code,
            status_message: span.status.message.clone().filter(|m| !m.is_empty()),
        })
    }
}

/// Everything resolved for one span before assembly
#[derive(Debug, Clone)]
pub struct ResolvedSpan {
    pub display_name: String,
    pub kind: ObservationKind,
    pub emission: TraceEmission,
    pub is_root: bool,
    pub trace: EntityUpdate,
    pub observation: EntityUpdate,
    pub metadata_seed: Map<String, JsonValue>,
}

/// Base metadata shared by the trace and observation of a span.
///
/// `span_attributes` is recorded for scopes that are not the native SDK,
/// whose attributes are otherwise only visible through mapped fields.
pub fn metadata_seed(
    resource_attributes: &AttributeMap,
    scope: &InstrumentationScope,
    span_attributes: Option<&AttributeMap>,
) -> Map<String, JsonValue> {
    let version = (!scope.version.is_empty()).then(|| scope.version.clone());
    let mut seed = Map::new();
    seed.insert(
        "resourceAttributes".to_string(),
        JsonValue::Object(resource_attributes.clone()),
    );
    seed.insert(
        "scope".to_string(),
        json!({ "name": scope.name, "version": version }),
    );
    if let Some(attrs) = span_attributes {
        seed.insert(SPAN_ATTRIBUTES_KEY.to_string(), JsonValue::Object(attrs.clone()));
    }
    seed
}

/// Assemble the events one span contributes, trace first.
pub fn assemble(facts: &SpanFacts, resolved: ResolvedSpan) -> Vec<IngestionEvent> {
    let mut events = Vec::with_capacity(2);
    if let Some(trace) = trace_event(facts, &resolved) {
        events.push(trace);
    }
    events.push(observation_event(facts, resolved));
    events
}

fn environment(update: &EntityUpdate) -> String {
    update
        .environment
        .clone()
        .filter(|env| !env.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Seed metadata overlaid with resolved metadata. Non-object metadata is kept
/// under a `metadata` key.
fn seeded_metadata(seed: &Map<String, JsonValue>, resolved: Option<&JsonValue>) -> JsonValue {
    let mut merged = seed.clone();
    match resolved {
        Some(JsonValue::Object(map)) => {
            for (key, value) in map {
                merged.insert(key.clone(), value.clone());
            }
        }
        Some(other) => {
            merged.insert("metadata".to_string(), other.clone());
        }
        None => {}
    }
    JsonValue::Object(merged)
}

fn trace_event(facts: &SpanFacts, resolved: &ResolvedSpan) -> Option<IngestionEvent> {
    let update = &resolved.trace;
    let body = match resolved.emission {
        TraceEmission::Skip => return None,
        TraceEmission::Shallow => TraceBody {
            id: facts.trace_id.clone(),
            timestamp: facts.start_time.clone(),
            environment: environment(update),
            ..Default::default()
        },
        TraceEmission::Full => {
            // Roots stand in for the trace's name and I/O unless set explicitly
            let fallback = resolved.is_root.then_some(&resolved.observation);
            let mut seed = resolved.metadata_seed.clone();
            if !resolved.is_root {
                seed.remove(SPAN_ATTRIBUTES_KEY);
            }
            TraceBody {
                id: facts.trace_id.clone(),
                timestamp: facts.start_time.clone(),
                environment: environment(update),
                name: update.name.clone().or_else(|| {
                    Some(resolved.display_name.clone())
                        .filter(|n| resolved.is_root && !n.is_empty())
                }),
                user_id: update.user_id.clone(),
                session_id: update.session_id.clone(),
                release: update.release.clone(),
                version: update.version.clone(),
                tags: update.tags.clone(),
                public: update.public,
                metadata: Some(seeded_metadata(&seed, update.metadata.as_ref())),
                input: update
                    .input
                    .clone()
                    .or_else(|| fallback.and_then(|obs| obs.input.clone())),
                output: update
                    .output
                    .clone()
                    .or_else(|| fallback.and_then(|obs| obs.output.clone())),
            }
        }
    };
    Some(IngestionEvent::trace(facts.start_time.clone(), body))
}

fn observation_event(facts: &SpanFacts, resolved: ResolvedSpan) -> IngestionEvent {
    let environment = environment(&resolved.observation);
    let metadata = seeded_metadata(&resolved.metadata_seed, resolved.observation.metadata.as_ref());
    let update = resolved.observation;

    let level = update.level.unwrap_or(if facts.status_code == STATUS_CODE_ERROR {
        ObservationLevel::Error
    } else {
        ObservationLevel::Default
    });

    let body = ObservationBody {
        id: facts.span_id.clone(),
        trace_id: facts.trace_id.clone(),
        parent_observation_id: facts.parent_id.clone(),
        name: Some(resolved.display_name).filter(|n| !n.is_empty()),
        start_time: facts.start_time.clone(),
        end_time: facts.end_time.clone(),
        environment,
        metadata,
        level,
        status_message: update.status_message.or_else(|| facts.status_message.clone()),
        version: update.version,
        model: update.model,
        model_parameters: update.model_parameters,
        usage_details: update.usage_details,
        cost_details: update.cost_details,
        prompt_name: update.prompt_name,
        prompt_version: update.prompt_version,
        completion_start_time: update.completion_start_time,
        input: update.input,
        output: update.output,
    };
    IngestionEvent::observation(resolved.kind, facts.start_time.clone(), body)
}
