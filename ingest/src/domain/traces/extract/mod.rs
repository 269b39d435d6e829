//! Attribute resolution
//!
//! Folds the attributes and events of one span into an [`EntityUpdate`] for
//! either the trace or the observation derived from it.
//!
//! ## Pass Order (lowest to highest priority)
//!
//! 1. `base`: bare keys (`model`, `input`, `input.value`, `mlflow.*`, `traceloop.entity.*`)
//! 2. `gen_ai`: OTel GenAI semantic conventions (`gen_ai.*`)
//! 3. `llm`: TraceLoop / OpenInference (`llm.*`)
//! 4. `vercel`: Vercel AI SDK (`ai.*`)
//! 5. `events`: span events (`gen_ai.content.*`, `gen_ai.*.message`, `gen_ai.choice`)
//! 6. `semconv`: generic identity (`session.id`, `user.id`, `deployment.environment`)
//! 7. `langfuse`: explicit overrides (`langfuse.*`)
//!
//! Every pass writes into the same builder; a later pass overwrites scalar
//! slots written by an earlier one and merges into map slots. The order of
//! [`RESOLVER_PASSES`] is therefore the priority rule.

mod attributes;
mod events;
mod langfuse;

use serde_json::{Map, Value as JsonValue};

use crate::data::types::ObservationLevel;
use crate::utils::json::{merge_json, value_as_number};
use crate::utils::otlp::AttributeMap;

pub use self::events::DecodedEvent;

// ============================================================================
// ATTRIBUTE KEYS
// ============================================================================

pub(super) mod keys {
    // Base heuristics
    pub const MODEL: &str = "model";
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
    pub const INPUT_VALUE: &str = "input.value";
    pub const OUTPUT_VALUE: &str = "output.value";
    pub const MLFLOW_SPAN_INPUTS: &str = "mlflow.spanInputs";
    pub const MLFLOW_SPAN_OUTPUTS: &str = "mlflow.spanOutputs";
    pub const TRACELOOP_ENTITY_INPUT: &str = "traceloop.entity.input";
    pub const TRACELOOP_ENTITY_OUTPUT: &str = "traceloop.entity.output";
    pub const MODEL_CONFIG: &str = "model_config";
    pub const TAGS: &str = "tags";

    // GenAI
    pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
    pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";
    pub const GEN_AI_REQUEST_PREFIX: &str = "gen_ai.request.";
    pub const GEN_AI_USAGE_PREFIX: &str = "gen_ai.usage.";
    pub const GEN_AI_PROMPT: &str = "gen_ai.prompt";
    pub const GEN_AI_COMPLETION: &str = "gen_ai.completion";
    pub const GEN_AI_PROMPT_PREFIX: &str = "gen_ai.prompt.";
    pub const GEN_AI_COMPLETION_PREFIX: &str = "gen_ai.completion.";
    pub const GEN_AI_INPUT_MESSAGES: &str = "gen_ai.input.messages";
    pub const GEN_AI_OUTPUT_MESSAGES: &str = "gen_ai.output.messages";
    pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";
    pub const GEN_AI_SYSTEM: &str = "gen_ai.system";

    // TraceLoop / OpenInference
    pub const LLM_MODEL_NAME: &str = "llm.model_name";
    pub const LLM_REQUEST_MODEL: &str = "llm.request.model";
    pub const LLM_INVOCATION_PARAMETERS: &str = "llm.invocation_parameters";
    pub const LLM_TOKEN_COUNT_PREFIX: &str = "llm.token_count.";
    pub const LLM_COST_PREFIX: &str = "llm.cost.";
    pub const LLM_INPUT_MESSAGES_PREFIX: &str = "llm.input_messages.";
    pub const LLM_OUTPUT_MESSAGES_PREFIX: &str = "llm.output_messages.";
    pub const OPENINFERENCE_SPAN_KIND: &str = "openinference.span.kind";

    // Vercel AI SDK
    pub const AI_MODEL_ID: &str = "ai.model.id";
    pub const AI_PROMPT: &str = "ai.prompt";
    pub const AI_PROMPT_MESSAGES: &str = "ai.prompt.messages";
    pub const AI_RESPONSE_TEXT: &str = "ai.response.text";
    pub const AI_RESULT_TEXT: &str = "ai.result.text";
    pub const AI_USAGE_PROMPT_TOKENS: &str = "ai.usage.promptTokens";
    pub const AI_USAGE_COMPLETION_TOKENS: &str = "ai.usage.completionTokens";
    pub const AI_USAGE_TOTAL_TOKENS: &str = "ai.usage.totalTokens";
    pub const AI_TELEMETRY_METADATA_PREFIX: &str = "ai.telemetry.metadata.";

    // Semantic conventions
    pub const SESSION_ID: &str = "session.id";
    pub const USER_ID: &str = "user.id";
    pub const DEPLOYMENT_ENV: &str = "deployment.environment";
    pub const DEPLOYMENT_ENV_NAME: &str = "deployment.environment.name";
    pub const SERVICE_VERSION: &str = "service.version";

    // Display name
    pub const LOGFIRE_MSG: &str = "logfire.msg";

    // Langfuse: trace
    pub const LANGFUSE_TRACE_PREFIX: &str = "langfuse.trace.";
    pub const LANGFUSE_TRACE_NAME: &str = "langfuse.trace.name";
    pub const LANGFUSE_TRACE_INPUT: &str = "langfuse.trace.input";
    pub const LANGFUSE_TRACE_OUTPUT: &str = "langfuse.trace.output";
    pub const LANGFUSE_TRACE_METADATA: &str = "langfuse.trace.metadata";
    pub const LANGFUSE_TRACE_METADATA_PREFIX: &str = "langfuse.trace.metadata.";
    pub const LANGFUSE_TRACE_TAGS: &str = "langfuse.trace.tags";
    pub const LANGFUSE_TRACE_PUBLIC: &str = "langfuse.trace.public";
    pub const LANGFUSE_TRACE_USER_ID: &str = "langfuse.trace.user_id";
    pub const LANGFUSE_TRACE_SESSION_ID: &str = "langfuse.trace.session_id";

    // Langfuse: observation
    pub const LANGFUSE_OBSERVATION_TYPE: &str = "langfuse.observation.type";
    pub const LANGFUSE_OBSERVATION_INPUT: &str = "langfuse.observation.input";
    pub const LANGFUSE_OBSERVATION_OUTPUT: &str = "langfuse.observation.output";
    pub const LANGFUSE_OBSERVATION_METADATA: &str = "langfuse.observation.metadata";
    pub const LANGFUSE_OBSERVATION_METADATA_PREFIX: &str = "langfuse.observation.metadata.";
    pub const LANGFUSE_OBSERVATION_MODEL: &str = "langfuse.observation.model.name";
    pub const LANGFUSE_OBSERVATION_MODEL_PARAMETERS: &str = "langfuse.observation.model.parameters";
    pub const LANGFUSE_OBSERVATION_USAGE_DETAILS: &str = "langfuse.observation.usage_details";
    pub const LANGFUSE_OBSERVATION_COST_DETAILS: &str = "langfuse.observation.cost_details";
    pub const LANGFUSE_OBSERVATION_PROMPT_NAME: &str = "langfuse.observation.prompt.name";
    pub const LANGFUSE_OBSERVATION_PROMPT_VERSION: &str = "langfuse.observation.prompt.version";
    pub const LANGFUSE_OBSERVATION_LEVEL: &str = "langfuse.observation.level";
    pub const LANGFUSE_OBSERVATION_STATUS_MESSAGE: &str = "langfuse.observation.status_message";
    pub const LANGFUSE_OBSERVATION_COMPLETION_START_TIME: &str =
        "langfuse.observation.completion_start_time";

    // Langfuse: shared
    pub const LANGFUSE_SESSION_ID: &str = "langfuse.session.id";
    pub const LANGFUSE_USER_ID: &str = "langfuse.user.id";
    pub const LANGFUSE_ENVIRONMENT: &str = "langfuse.environment";
    pub const LANGFUSE_METADATA: &str = "langfuse.metadata";
    pub const LANGFUSE_METADATA_PREFIX: &str = "langfuse.metadata.";
    pub const LANGFUSE_TAGS: &str = "langfuse.tags";
    pub const LANGFUSE_PUBLIC: &str = "langfuse.public";
    pub const LANGFUSE_VERSION: &str = "langfuse.version";
    pub const LANGFUSE_RELEASE: &str = "langfuse.release";
    pub const LANGFUSE_AS_ROOT: &str = "langfuse.internal.as_root";

    // Events
    pub const EVENT_CONTENT_PROMPT: &str = "gen_ai.content.prompt";
    pub const EVENT_CONTENT_COMPLETION: &str = "gen_ai.content.completion";
    pub const EVENT_SYSTEM_MESSAGE: &str = "gen_ai.system.message";
    pub const EVENT_USER_MESSAGE: &str = "gen_ai.user.message";
    pub const EVENT_ASSISTANT_MESSAGE: &str = "gen_ai.assistant.message";
    pub const EVENT_TOOL_MESSAGE: &str = "gen_ai.tool.message";
    pub const EVENT_CHOICE: &str = "gen_ai.choice";
    pub const EVENT_EXCEPTION: &str = "exception";
    pub const EXCEPTION_TYPE: &str = "exception.type";
    pub const EXCEPTION_MESSAGE: &str = "exception.message";
}

// ============================================================================
// ENTITY UPDATE
// ============================================================================

/// Canonical fields resolved for one trace or observation.
///
/// Scalar slots are last-write-wins. Map slots (`metadata`,
/// `model_parameters`, `usage_details`, `cost_details`) merge key-by-key
/// when both sides are objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityUpdate {
    pub name: Option<String>,
    pub environment: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub input: Option<JsonValue>,
    pub output: Option<JsonValue>,
    pub metadata: Option<JsonValue>,
    pub model: Option<String>,
    pub model_parameters: Option<JsonValue>,
    pub usage_details: Option<JsonValue>,
    pub cost_details: Option<JsonValue>,
    pub prompt_name: Option<String>,
    pub prompt_version: Option<i64>,
    pub level: Option<ObservationLevel>,
    pub status_message: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub public: Option<bool>,
    pub completion_start_time: Option<String>,
}

impl EntityUpdate {
    pub fn merge_metadata(&mut self, value: JsonValue) {
        merge_json(&mut self.metadata, value);
    }

    pub fn set_metadata_key(&mut self, key: &str, value: JsonValue) {
        insert_key(&mut self.metadata, key, value);
    }

    pub fn merge_model_parameters(&mut self, value: JsonValue) {
        merge_json(&mut self.model_parameters, value);
    }

    pub fn set_model_parameter(&mut self, key: &str, value: JsonValue) {
        insert_key(&mut self.model_parameters, key, value);
    }

    /// Record a usage counter from a `gen_ai.usage.<suffix>` style key.
    ///
    /// `cost` is routed to `cost_details.total`; non-numeric values are dropped.
    pub fn add_usage(&mut self, suffix: &str, value: &JsonValue) {
        let Some(number) = value_as_number(value) else {
            tracing::debug!(suffix, value = %value, "Dropping non-numeric usage value");
            return;
        };
        match usage_key(suffix) {
            UsageKey::Cost => insert_key(&mut self.cost_details, "total", number),
            UsageKey::Counter(key) => insert_key(&mut self.usage_details, key, number),
        }
    }

    /// Record a cost entry under `cost_details.<key>`.
    pub fn add_cost(&mut self, key: &str, value: &JsonValue) {
        match value_as_number(value) {
            Some(number) => insert_key(&mut self.cost_details, key, number),
            None => tracing::debug!(key, value = %value, "Dropping non-numeric cost value"),
        }
    }

    /// Merge an explicit usage map. A `cost` entry moves to `cost_details.total`.
    ///
    /// Numeric strings are coerced; other non-numeric entries are dropped.
    pub fn merge_usage_details(&mut self, value: JsonValue) {
        let JsonValue::Object(mut map) = value else {
            self.usage_details = Some(value);
            return;
        };
        if let Some(cost) = map.remove("cost") {
            self.add_cost("total", &cost);
        }
        let mut counters = Map::new();
        for (key, value) in map {
            match value_as_number(&value) {
                Some(number) => {
                    counters.insert(key, number);
                }
                None => tracing::debug!(key, value = %value, "Dropping non-numeric usage value"),
            }
        }
        merge_json(&mut self.usage_details, JsonValue::Object(counters));
    }

    pub fn merge_cost_details(&mut self, value: JsonValue) {
        merge_json(&mut self.cost_details, value);
    }
}

enum UsageKey<'a> {
    Counter(&'a str),
    Cost,
}

fn usage_key(suffix: &str) -> UsageKey<'_> {
    match suffix {
        "input_tokens" | "prompt_tokens" | "prompt" => UsageKey::Counter("input"),
        "output_tokens" | "completion_tokens" | "completion" => UsageKey::Counter("output"),
        "total_tokens" | "total" => UsageKey::Counter("total"),
        "cost" => UsageKey::Cost,
        other => UsageKey::Counter(other),
    }
}

/// Insert into an object slot, replacing a non-object value.
fn insert_key(slot: &mut Option<JsonValue>, key: &str, value: JsonValue) {
    if !matches!(slot, Some(JsonValue::Object(_))) {
        *slot = Some(JsonValue::Object(Map::new()));
    }
    if let Some(JsonValue::Object(map)) = slot {
        map.insert(key.to_string(), value);
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Which entity the resolved fields are for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Trace,
    Observation,
}

/// Inputs shared by every pass for one span
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Resource attributes overlaid by span attributes
    pub attributes: &'a AttributeMap,
    pub events: &'a [DecodedEvent],
    pub span_name: &'a str,
}

type PassFn = fn(&ResolveContext<'_>, Target, &mut EntityUpdate);

/// A named resolution stage
pub struct ResolverPass {
    pub name: &'static str,
    pub run: PassFn,
}

/// Resolution passes in ascending priority.
pub const RESOLVER_PASSES: &[ResolverPass] = &[
    ResolverPass {
        name: "base",
        run: attributes::resolve_base,
    },
    ResolverPass {
        name: "gen_ai",
        run: attributes::resolve_gen_ai,
    },
    ResolverPass {
        name: "llm",
        run: attributes::resolve_llm,
    },
    ResolverPass {
        name: "vercel",
        run: attributes::resolve_vercel,
    },
    ResolverPass {
        name: "events",
        run: events::resolve_events,
    },
    ResolverPass {
        name: "semconv",
        run: attributes::resolve_semconv,
    },
    ResolverPass {
        name: "langfuse",
        run: langfuse::resolve_langfuse,
    },
];

/// Run every pass in order and return the folded update.
pub fn resolve(ctx: &ResolveContext<'_>, target: Target) -> EntityUpdate {
    let mut update = EntityUpdate::default();
    for pass in RESOLVER_PASSES {
        (pass.run)(ctx, target, &mut update);
        tracing::trace!(pass = pass.name, ?target, "Applied resolver pass");
    }
    tracing::trace!(span_name = ctx.span_name, ?target, update = ?update, "Resolved attributes");
    update
}

/// Merge resource attributes (base layer) with span attributes (overlay).
pub fn layer_attributes(resource: &AttributeMap, span: &AttributeMap) -> AttributeMap {
    let mut merged = resource.clone();
    for (key, value) in span {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
