//! OTLP utility functions
//!
//! Provides reusable functions for working with OTLP payloads:
//! - ID and attribute value decoding
//! - Payload loading from JSON
//! - Conversion from prost-decoded protobuf types into the input model

use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1 as proto_common;
use opentelemetry_proto::tonic::trace::v1 as proto_trace;
use serde_json::{Map, Value as JsonValue};

use crate::data::types::{
    AnyValue, ByteBuffer, ExportTracePayload, InstrumentationScope, IntValue, KeyValue,
    NanoTimestamp, OtelSpan, Resource, ResourceSpan, ScopeSpan, SpanEvent, Status,
};

/// Decoded attributes, in insertion order.
pub type AttributeMap = Map<String, JsonValue>;

// ============================================================================
// DECODERS
// ============================================================================

/// Decode a trace/span ID to lowercase hex. An empty buffer is "absent".
pub fn decode_id(id: &ByteBuffer) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(hex::encode(id.as_slice()))
    }
}

/// Decode an `intValue` to a JSON number.
pub fn decode_int_value(value: &IntValue) -> JsonValue {
    match value {
        IntValue::Split(bits) => match bits.to_i64() {
            Ok(i) => JsonValue::from(i),
            Err(u) => JsonValue::from(u),
        },
        IntValue::Signed(i) => JsonValue::from(*i),
        IntValue::Unsigned(u) => JsonValue::from(*u),
        IntValue::Decimal(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                JsonValue::from(i)
            } else if let Ok(u) = s.parse::<u64>() {
                JsonValue::from(u)
            } else {
                tracing::debug!(value = %s, "Non-numeric intValue, keeping string");
                JsonValue::String(s.to_string())
            }
        }
    }
}

/// Convert an OTel attribute value to its native JSON representation.
///
/// Non-finite doubles become `null`, bytes become hex, kvlists become objects.
pub fn decode_attribute_value(value: &AnyValue) -> JsonValue {
    match value {
        AnyValue::String(s) => JsonValue::String(s.clone()),
        AnyValue::Int(i) => decode_int_value(i),
        AnyValue::Double(d) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AnyValue::Bool(b) => JsonValue::Bool(*b),
        AnyValue::Array(values) => {
            JsonValue::Array(values.iter().map(decode_attribute_value).collect())
        }
        AnyValue::KvList(values) => JsonValue::Object(decode_attributes(values)),
        AnyValue::Bytes(bytes) => JsonValue::String(hex::encode(bytes.as_slice())),
        AnyValue::Empty => JsonValue::Null,
    }
}

/// Decode a key/value list into an ordered map.
///
/// Keys without a value are skipped; on duplicate keys the last one wins.
pub fn decode_attributes(attrs: &[KeyValue]) -> AttributeMap {
    attrs
        .iter()
        .filter(|kv| !matches!(kv.value, AnyValue::Empty))
        .map(|kv| (kv.key.clone(), decode_attribute_value(&kv.value)))
        .collect()
}

// ============================================================================
// PAYLOAD LOADING
// ============================================================================

/// Load resource spans from an `{"resourceSpans": [...]}` object or a bare array.
pub fn resource_spans_from_json(payload: JsonValue) -> Result<Vec<ResourceSpan>, serde_json::Error> {
    match payload {
        JsonValue::Array(_) => serde_json::from_value(payload),
        other => serde_json::from_value::<ExportTracePayload>(other).map(|p| p.resource_spans),
    }
}

/// Convert a prost-decoded export request into the input model.
pub fn resource_spans_from_proto(request: &ExportTraceServiceRequest) -> Vec<ResourceSpan> {
    request.resource_spans.iter().map(ResourceSpan::from).collect()
}

// ============================================================================
// PROTOBUF CONVERSION
// ============================================================================

impl From<&proto_trace::ResourceSpans> for ResourceSpan {
    fn from(rs: &proto_trace::ResourceSpans) -> Self {
        Self {
            resource: Resource {
                attributes: rs
                    .resource
                    .as_ref()
                    .map(|r| convert_key_values(&r.attributes))
                    .unwrap_or_default(),
            },
            scope_spans: rs.scope_spans.iter().map(ScopeSpan::from).collect(),
        }
    }
}

impl From<&proto_trace::ScopeSpans> for ScopeSpan {
    fn from(ss: &proto_trace::ScopeSpans) -> Self {
        let scope = ss
            .scope
            .as_ref()
            .map(|s| InstrumentationScope {
                name: s.name.clone(),
                version: s.version.clone(),
                attributes: convert_key_values(&s.attributes),
            })
            .unwrap_or_default();
        Self {
            scope,
            spans: ss.spans.iter().map(OtelSpan::from).collect(),
        }
    }
}

impl From<&proto_trace::Span> for OtelSpan {
    fn from(span: &proto_trace::Span) -> Self {
        let status = span
            .status
            .as_ref()
            .map(|s| Status {
                code: s.code,
                message: (!s.message.is_empty()).then(|| s.message.clone()),
            })
            .unwrap_or_default();
        Self {
            trace_id: ByteBuffer(span.trace_id.clone()),
            span_id: ByteBuffer(span.span_id.clone()),
            parent_span_id: ByteBuffer(span.parent_span_id.clone()),
            name: span.name.clone(),
            kind: span.kind,
            start_time_unix_nano: NanoTimestamp::Nanos(span.start_time_unix_nano),
            end_time_unix_nano: NanoTimestamp::Nanos(span.end_time_unix_nano),
            attributes: convert_key_values(&span.attributes),
            events: span
                .events
                .iter()
                .map(|e| SpanEvent {
                    time_unix_nano: NanoTimestamp::Nanos(e.time_unix_nano),
                    name: e.name.clone(),
                    attributes: convert_key_values(&e.attributes),
                })
                .collect(),
            status,
        }
    }
}

impl From<&proto_common::AnyValue> for AnyValue {
    fn from(value: &proto_common::AnyValue) -> Self {
        use proto_common::any_value::Value;

        match &value.value {
            Some(Value::StringValue(s)) => Self::String(s.clone()),
            Some(Value::BoolValue(b)) => Self::Bool(*b),
            Some(Value::IntValue(i)) => Self::Int(IntValue::Signed(*i)),
            Some(Value::DoubleValue(d)) => Self::Double(*d),
            Some(Value::ArrayValue(arr)) => Self::Array(arr.values.iter().map(Self::from).collect()),
            Some(Value::KvlistValue(kv)) => Self::KvList(convert_key_values(&kv.values)),
            Some(Value::BytesValue(b)) => Self::Bytes(ByteBuffer(b.clone())),
            None => Self::Empty,
        }
    }
}

fn convert_key_values(attrs: &[proto_common::KeyValue]) -> Vec<KeyValue> {
    attrs
        .iter()
        .map(|kv| KeyValue {
            key: kv.key.clone(),
            value: kv.value.as_ref().map(AnyValue::from).unwrap_or_default(),
        })
        .collect()
}
