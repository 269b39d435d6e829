//! Shared data types
//!
//! Input model (OTLP resource spans as produced upstream), output model
//! (ingestion events) and the classification enums shared by both.

mod enums;
mod ingestion;
mod otel;

pub use enums::{EventType, ObservationKind, ObservationLevel, ObservationType};

pub use ingestion::{EventBody, IngestionEvent, ObservationBody, TraceBody};

pub use otel::{
    AnyValue, ByteBuffer, ExportTracePayload, InstrumentationScope, IntValue, KeyValue, LongBits,
    NanoTimestamp, OtelSpan, Resource, ResourceSpan, ScopeSpan, SpanEvent, Status,
};
