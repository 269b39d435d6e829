//! OTel span ingestion pipeline
//!
//! Converts vendor-specific OpenTelemetry `ResourceSpans` payloads into
//! Langfuse ingestion events (`trace-create`, `span-create`,
//! `generation-create`, `event-create`).
//!
//! - `core` - CLI, configuration and constants
//! - `data` - input/output types and the seen-traces capability
//! - `domain` - the trace conversion pipeline
//! - `utils` - OTLP scalar decoding, time, JSON and string helpers

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

pub use data::cache::{SeenTraces, SharedSeenTraces};
pub use data::types::{IngestionEvent, ResourceSpan};
pub use domain::traces::{IngestError, OtelIngestProcessor, count_spans};
