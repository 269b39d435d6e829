//! Classification enums for ingestion entities

use serde::Serialize;

// ============================================================================
// CLASSIFICATION ENUMS
// ============================================================================

/// Declared observation types (`langfuse.observation.type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationType {
    Generation,
    Embedding,
    Event,
    Agent,
    Tool,
    Chain,
    Retriever,
    Guardrail,
    Evaluator,
    Span,
}

impl ObservationType {
    /// Parse a declared type, case-insensitively. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let ty = match value.trim().to_ascii_lowercase().as_str() {
            "generation" => Self::Generation,
            "embedding" => Self::Embedding,
            "event" => Self::Event,
            "agent" => Self::Agent,
            "tool" => Self::Tool,
            "chain" => Self::Chain,
            "retriever" => Self::Retriever,
            "guardrail" => Self::Guardrail,
            "evaluator" => Self::Evaluator,
            "span" => Self::Span,
            _ => return None,
        };
        Some(ty)
    }

    /// The ingestion entity this type is emitted as
    pub fn kind(&self) -> ObservationKind {
        match self {
            Self::Generation | Self::Embedding => ObservationKind::Generation,
            Self::Event => ObservationKind::Event,
            _ => ObservationKind::Span,
        }
    }
}

/// Ingestion entity kind of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationKind {
    Generation,
    Event,
    Span,
}

impl ObservationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Event => "event",
            Self::Span => "span",
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Self::Generation => EventType::GenerationCreate,
            Self::Event => EventType::EventCreate,
            Self::Span => EventType::SpanCreate,
        }
    }
}

/// Severity level of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationLevel {
    Debug,
    #[default]
    Default,
    Warning,
    Error,
}

impl ObservationLevel {
    /// Parse a level name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        let level = match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "DEFAULT" => Self::Default,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            _ => return None,
        };
        Some(level)
    }
}

/// Ingestion event discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    TraceCreate,
    SpanCreate,
    GenerationCreate,
    EventCreate,
}
