// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "OTel Ingest";

/// Application name in lowercase (for log filters and identifiers)
pub const APP_NAME_LOWER: &str = "otel_ingest";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".otel-ingest";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "otel-ingest.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "OTEL_INGEST_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for the log filter (takes precedence over RUST_LOG)
pub const ENV_LOG: &str = "OTEL_INGEST_LOG";

// =============================================================================
// Environment Variables - Ingestion
// =============================================================================

/// Environment variable for the ingesting project's public key
pub const ENV_PUBLIC_KEY: &str = "OTEL_INGEST_PUBLIC_KEY";

/// Environment variable for the ingesting project's ID
pub const ENV_PROJECT_ID: &str = "OTEL_INGEST_PROJECT_ID";

/// Environment variable for the seen-traces cache capacity
pub const ENV_SEEN_TRACES_MAX_ENTRIES: &str = "OTEL_INGEST_SEEN_TRACES_MAX_ENTRIES";

/// Environment variable for the seen-traces cache TTL in seconds
pub const ENV_SEEN_TRACES_TTL_SECS: &str = "OTEL_INGEST_SEEN_TRACES_TTL_SECS";

// =============================================================================
// Defaults
// =============================================================================

/// Default seen-traces cache capacity
pub const DEFAULT_SEEN_TRACES_MAX_ENTRIES: u64 = 100_000;

/// Default seen-traces TTL (1 hour). 0 disables expiry.
pub const DEFAULT_SEEN_TRACES_TTL_SECS: u64 = 3600;

/// Environment used when no attribute provides one
pub const DEFAULT_ENVIRONMENT: &str = "default";

// =============================================================================
// OTel Mapping
// =============================================================================

/// Scope name prefix identifying the native Langfuse SDKs
pub const LANGFUSE_SDK_SCOPE_PREFIX: &str = "langfuse-sdk";

/// Scope attribute carrying the SDK's public key
pub const SCOPE_PUBLIC_KEY_ATTR: &str = "public_key";

/// Numeric path segments at or above this are treated as object keys
pub const MAX_INDEXED_ARRAY_LEN: usize = 1024;

/// OTel `STATUS_CODE_ERROR`
pub const STATUS_CODE_ERROR: i32 = 2;
