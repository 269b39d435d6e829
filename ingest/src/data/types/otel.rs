//! OTLP input model
//!
//! Mirrors the JS-shaped OTLP representation (protobufjs `toObject` output):
//! camelCase keys, 64-bit integers split into `{low, high, unsigned}`, IDs
//! wrapped as `{type: "Buffer", data: [...]}` or passed as raw byte arrays.
//! Every nested structure is nullable: `null`, a missing key and an empty
//! list all deserialize to "nothing".

use serde::Deserialize;

use crate::utils::json::{
    deserialize_nullable as nullable, deserialize_nullable_seq as nullable_seq,
};

// ============================================================================
// TOP-LEVEL STRUCTURE
// ============================================================================

/// `ExportTraceServiceRequest` envelope (`{"resourceSpans": [...]}`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTracePayload {
    #[serde(default, deserialize_with = "nullable_seq")]
    pub resource_spans: Vec<ResourceSpan>,
}

/// Spans produced by one resource, grouped by instrumentation scope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpan {
    #[serde(default, deserialize_with = "nullable")]
    pub resource: Resource,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub scope_spans: Vec<ScopeSpan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "nullable_seq")]
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeSpan {
    #[serde(default, deserialize_with = "nullable")]
    pub scope: InstrumentationScope,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub spans: Vec<OtelSpan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstrumentationScope {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub version: String,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub attributes: Vec<KeyValue>,
}

/// A single OTel span.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtelSpan {
    #[serde(default, deserialize_with = "nullable")]
    pub trace_id: ByteBuffer,
    #[serde(default, deserialize_with = "nullable")]
    pub span_id: ByteBuffer,
    /// Empty buffer means "no parent" (root span).
    #[serde(default, deserialize_with = "nullable")]
    pub parent_span_id: ByteBuffer,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub kind: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time_unix_nano: NanoTimestamp,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time_unix_nano: NanoTimestamp,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub attributes: Vec<KeyValue>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub events: Vec<SpanEvent>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Status,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEvent {
    #[serde(default, deserialize_with = "nullable")]
    pub time_unix_nano: NanoTimestamp,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub attributes: Vec<KeyValue>,
}

/// Span status. Code 2 is `STATUS_CODE_ERROR`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default, deserialize_with = "nullable")]
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// SCALARS
// ============================================================================

/// A 64-bit integer split into two 32-bit words (protobufjs `Long`).
///
/// `low` is frequently serialized as a negative signed 32-bit integer; only
/// its bit pattern matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LongBits {
    #[serde(default)]
    pub low: i64,
    #[serde(default)]
    pub high: i64,
    #[serde(default)]
    pub unsigned: bool,
}

impl LongBits {
    /// Reassemble as an unsigned value: `high * 2^32 + (low as u32)`.
    pub fn to_u64(self) -> u64 {
        ((self.high as u32 as u64) << 32) | (self.low as u32 as u64)
    }

    /// Reassemble honouring the `unsigned` flag. Unsigned values above
    /// `i64::MAX` are returned as `Err(u64)`.
    pub fn to_i64(self) -> Result<i64, u64> {
        if self.unsigned {
            let value = self.to_u64();
            i64::try_from(value).map_err(|_| value)
        } else {
            Ok(((self.high as i32 as i64) << 32) | (self.low as u32 as i64))
        }
    }
}

/// Nanoseconds since the Unix epoch in any of the encodings seen on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NanoTimestamp {
    Split(LongBits),
    Nanos(u64),
    Decimal(String),
    /// JS numbers above 2^53 lose precision; accepted as-is.
    Approximate(f64),
}

impl Default for NanoTimestamp {
    fn default() -> Self {
        Self::Nanos(0)
    }
}

/// `intValue` of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntValue {
    Split(LongBits),
    Signed(i64),
    Unsigned(u64),
    Decimal(String),
}

/// Raw bytes (trace/span IDs, `bytesValue`).
///
/// Accepts `{type: "Buffer", data: [...]}`, a raw byte array, or a string
/// (hex per OTLP/JSON, base64 per the proto3 JSON mapping).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawBytes")]
pub struct ByteBuffer(pub Vec<u8>);

impl ByteBuffer {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytes {
    Buffer { data: Vec<u8> },
    Bytes(Vec<u8>),
    Encoded(String),
}

impl From<RawBytes> for ByteBuffer {
    fn from(raw: RawBytes) -> Self {
        match raw {
            RawBytes::Buffer { data } | RawBytes::Bytes(data) => Self(data),
            RawBytes::Encoded(s) => Self(decode_encoded_bytes(&s)),
        }
    }
}

fn decode_encoded_bytes(s: &str) -> Vec<u8> {
    use base64::Engine;

    if s.is_empty() {
        return Vec::new();
    }
    if let Ok(bytes) = hex::decode(s) {
        return bytes;
    }
    match base64::engine::general_purpose::STANDARD.decode(s) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(value = %s, error = %e, "Undecodable byte string, treating as empty");
            Vec::new()
        }
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KeyValue {
    #[serde(default, deserialize_with = "nullable")]
    pub key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub value: AnyValue,
}

/// OTel `AnyValue`: exactly one of the typed slots is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawAnyValue")]
pub enum AnyValue {
    String(String),
    Int(IntValue),
    Double(f64),
    Bool(bool),
    Array(Vec<AnyValue>),
    KvList(Vec<KeyValue>),
    Bytes(ByteBuffer),
    #[default]
    Empty,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnyValue {
    #[serde(default)]
    string_value: Option<String>,
    #[serde(default)]
    int_value: Option<IntValue>,
    #[serde(default)]
    double_value: Option<f64>,
    #[serde(default)]
    bool_value: Option<bool>,
    #[serde(default)]
    array_value: Option<ValueList>,
    #[serde(default)]
    kvlist_value: Option<KeyValueList>,
    #[serde(default)]
    bytes_value: Option<ByteBuffer>,
}

#[derive(Deserialize)]
struct ValueList {
    #[serde(default, deserialize_with = "nullable_seq")]
    values: Vec<AnyValue>,
}

#[derive(Deserialize)]
struct KeyValueList {
    #[serde(default, deserialize_with = "nullable_seq")]
    values: Vec<KeyValue>,
}

impl From<RawAnyValue> for AnyValue {
    fn from(raw: RawAnyValue) -> Self {
        if let Some(s) = raw.string_value {
            Self::String(s)
        } else if let Some(i) = raw.int_value {
            Self::Int(i)
        } else if let Some(d) = raw.double_value {
            Self::Double(d)
        } else if let Some(b) = raw.bool_value {
            Self::Bool(b)
        } else if let Some(arr) = raw.array_value {
            Self::Array(arr.values)
        } else if let Some(kv) = raw.kvlist_value {
            Self::KvList(kv.values)
        } else if let Some(bytes) = raw.bytes_value {
            Self::Bytes(bytes)
        } else {
            Self::Empty
        }
    }
}
