//! Ingestion error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// A native SDK scope declared a key other than the ingesting project's.
    /// Aborts the whole batch.
    #[error(
        "Langfuse SDK public key mismatch for project {project_id}: expected {expected}, received {received}"
    )]
    PublicKeyMismatch {
        project_id: String,
        expected: String,
        received: String,
    },
}
