//! Domain logic for span ingestion
//!
//! - `traces` - OTel span to ingestion event conversion

pub mod traces;

pub use traces::{IngestError, OtelIngestProcessor};
