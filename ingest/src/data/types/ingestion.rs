//! Ingestion event output model
//!
//! One `IngestionEvent` per emitted entity: `{id, timestamp, type, body}`.
//! Bodies serialize with camelCase keys and omit absent optional fields.

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::{EventType, ObservationKind, ObservationLevel};

// ============================================================================
// EVENT ENVELOPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionEvent {
    /// Fresh UUID v4 per event
    pub id: String,
    /// Span start time (ISO 8601, millisecond precision)
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub body: EventBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    Trace(TraceBody),
    Observation(ObservationBody),
}

impl IngestionEvent {
    pub fn trace(timestamp: String, body: TraceBody) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            event_type: EventType::TraceCreate,
            body: EventBody::Trace(body),
        }
    }

    pub fn observation(kind: ObservationKind, timestamp: String, body: ObservationBody) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            event_type: kind.event_type(),
            body: EventBody::Observation(body),
        }
    }

    pub fn trace_body(&self) -> Option<&TraceBody> {
        match &self.body {
            EventBody::Trace(body) => Some(body),
            EventBody::Observation(_) => None,
        }
    }

    pub fn observation_body(&self) -> Option<&ObservationBody> {
        match &self.body {
            EventBody::Observation(body) => Some(body),
            EventBody::Trace(_) => None,
        }
    }
}

// ============================================================================
// BODIES
// ============================================================================

/// `trace-create` body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBody {
    pub id: String,
    pub timestamp: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
}

impl TraceBody {
    /// Shallow traces carry only id, timestamp and environment.
    pub fn is_shallow(&self) -> bool {
        self.name.is_none()
            && self.user_id.is_none()
            && self.session_id.is_none()
            && self.release.is_none()
            && self.version.is_none()
            && self.tags.is_none()
            && self.public.is_none()
            && self.metadata.is_none()
            && self.input.is_none()
            && self.output.is_none()
    }
}

/// `span-create` / `generation-create` / `event-create` body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody {
    pub id: String,
    pub trace_id: String,
    /// `null` for root observations
    pub parent_observation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub environment: String,
    pub metadata: JsonValue,
    pub level: ObservationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_details: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
}
