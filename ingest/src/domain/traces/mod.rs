//! Span conversion pipeline
//!
//! This module turns OTel resource spans into Langfuse ingestion events:
//!
//! - `extract` - Layered attribute resolution (trace and observation fields)
//! - `classify` - Observation kind, display name, root and trace-update detection
//! - `dedup` - Full / shallow / skipped trace emission and the batch post-filter
//! - `assemble` - Trace and observation event bodies
//! - `pipeline` - Batch orchestrator and public key check

mod assemble;
mod classify;
mod dedup;
mod error;
mod extract;
mod pipeline;

pub use dedup::TraceEmission;
pub use error::IngestError;
pub use extract::EntityUpdate;
pub use pipeline::{OtelIngestProcessor, count_spans, is_langfuse_sdk_scope};
