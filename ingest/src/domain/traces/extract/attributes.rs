//! Vendor and semantic-convention resolver passes

use serde_json::Value as JsonValue;

use super::{EntityUpdate, ResolveContext, Target, keys};
use crate::utils::json::{parse_json_value, set_path, structured_or_raw, value_to_string};
use crate::utils::otlp::AttributeMap;
use crate::utils::string::string_list_from_value;

// ============================================================================
// SHARED HELPER FUNCTIONS
// ============================================================================

/// Get a non-null attribute value.
pub(super) fn get<'a>(attrs: &'a AttributeMap, key: &str) -> Option<&'a JsonValue> {
    attrs.get(key).filter(|v| !v.is_null())
}

/// Get an attribute as a non-empty string.
pub(super) fn get_string(attrs: &AttributeMap, key: &str) -> Option<String> {
    get(attrs, key)
        .and_then(value_to_string)
        .filter(|s| !s.is_empty())
}

/// Get first matching value from attribute keys.
pub(super) fn get_first(attrs: &AttributeMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| get_string(attrs, k))
}

/// Set `slot` to the parsed tag list if the attribute yields any tags.
pub(super) fn set_tags(slot: &mut Option<Vec<String>>, attrs: &AttributeMap, key: &str) {
    if let Some(value) = get(attrs, key) {
        let tags = string_list_from_value(value);
        if !tags.is_empty() {
            *slot = Some(tags);
        }
    }
}

/// Write `value` at the dotted `path` inside `slot`, creating containers.
fn set_indexed(slot: &mut Option<JsonValue>, segments: &[&str], value: &JsonValue) {
    let target = slot.get_or_insert(JsonValue::Null);
    set_path(target, segments, value.clone());
}

/// `0.message.role` -> `[0, role]` for OpenInference message keys.
fn message_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('.').collect();
    if segments.get(1) == Some(&"message") {
        segments.remove(1);
    }
    segments
}

fn llm_cost_key(suffix: &str) -> &str {
    match suffix {
        "prompt" => "input",
        "completion" => "output",
        other => other,
    }
}

// ============================================================================
// BASE HEURISTICS
// ============================================================================

const BASE_INPUT_KEYS: &[&str] = &[
    keys::INPUT,
    keys::MLFLOW_SPAN_INPUTS,
    keys::TRACELOOP_ENTITY_INPUT,
    keys::INPUT_VALUE,
];

const BASE_OUTPUT_KEYS: &[&str] = &[
    keys::OUTPUT,
    keys::MLFLOW_SPAN_OUTPUTS,
    keys::TRACELOOP_ENTITY_OUTPUT,
    keys::OUTPUT_VALUE,
];

pub(super) fn resolve_base(ctx: &ResolveContext<'_>, target: Target, update: &mut EntityUpdate) {
    let attrs = ctx.attributes;
    set_tags(&mut update.tags, attrs, keys::TAGS);

    if target == Target::Trace {
        return;
    }

    if let Some(model) = get_string(attrs, keys::MODEL) {
        update.model = Some(model);
    }
    for key in BASE_INPUT_KEYS {
        if let Some(value) = get(attrs, key) {
            update.input = Some(structured_or_raw(value));
        }
    }
    for key in BASE_OUTPUT_KEYS {
        if let Some(value) = get(attrs, key) {
            update.output = Some(structured_or_raw(value));
        }
    }
    if let Some(config) = get(attrs, keys::MODEL_CONFIG) {
        update.merge_model_parameters(parse_json_value(config));
    }
}

// ============================================================================
// GEN AI SEMANTIC CONVENTIONS
// ============================================================================

pub(super) fn resolve_gen_ai(ctx: &ResolveContext<'_>, target: Target, update: &mut EntityUpdate) {
    let attrs = ctx.attributes;
    if let Some(conversation) = get_string(attrs, keys::GEN_AI_CONVERSATION_ID) {
        update.session_id = Some(conversation);
    }

    if target == Target::Trace {
        return;
    }

    if let Some(model) = get_first(attrs, &[keys::GEN_AI_REQUEST_MODEL, keys::GEN_AI_RESPONSE_MODEL])
    {
        update.model = Some(model);
    }

    let mut input: Option<JsonValue> = None;
    let mut output: Option<JsonValue> = None;

    for (key, value) in attrs {
        if value.is_null() || key == keys::GEN_AI_REQUEST_MODEL {
            continue;
        }
        if let Some(param) = key.strip_prefix(keys::GEN_AI_REQUEST_PREFIX) {
            update.set_model_parameter(param, structured_or_raw(value));
        } else if let Some(suffix) = key.strip_prefix(keys::GEN_AI_USAGE_PREFIX) {
            update.add_usage(suffix, value);
        } else if key == keys::GEN_AI_PROMPT {
            input = Some(value.clone());
        } else if key == keys::GEN_AI_COMPLETION {
            output = Some(value.clone());
        } else if let Some(path) = key.strip_prefix(keys::GEN_AI_PROMPT_PREFIX) {
            let segments: Vec<&str> = path.split('.').collect();
            set_indexed(&mut input, &segments, value);
        } else if let Some(path) = key.strip_prefix(keys::GEN_AI_COMPLETION_PREFIX) {
            let segments: Vec<&str> = path.split('.').collect();
            set_indexed(&mut output, &segments, value);
        }
    }

    if let Some(messages) = get(attrs, keys::GEN_AI_INPUT_MESSAGES) {
        input = Some(structured_or_raw(messages));
    }
    if let Some(messages) = get(attrs, keys::GEN_AI_OUTPUT_MESSAGES) {
        output = Some(structured_or_raw(messages));
    }

    if input.is_some() {
        update.input = input;
    }
    if output.is_some() {
        update.output = output;
    }
}

// ============================================================================
// TRACELOOP / OPENINFERENCE
// ============================================================================

pub(super) fn resolve_llm(ctx: &ResolveContext<'_>, target: Target, update: &mut EntityUpdate) {
    if target == Target::Trace {
        return;
    }
    let attrs = ctx.attributes;

    if let Some(model) = get_first(attrs, &[keys::LLM_MODEL_NAME, keys::LLM_REQUEST_MODEL]) {
        update.model = Some(model);
    }
    if let Some(params) = get(attrs, keys::LLM_INVOCATION_PARAMETERS) {
        update.merge_model_parameters(parse_json_value(params));
    }

    let mut input: Option<JsonValue> = None;
    let mut output: Option<JsonValue> = None;

    for (key, value) in attrs {
        if value.is_null() {
            continue;
        }
        if let Some(suffix) = key.strip_prefix(keys::LLM_TOKEN_COUNT_PREFIX) {
            update.add_usage(suffix, value);
        } else if let Some(suffix) = key.strip_prefix(keys::LLM_COST_PREFIX) {
            update.add_cost(llm_cost_key(suffix), value);
        } else if let Some(path) = key.strip_prefix(keys::LLM_INPUT_MESSAGES_PREFIX) {
            set_indexed(&mut input, &message_segments(path), value);
        } else if let Some(path) = key.strip_prefix(keys::LLM_OUTPUT_MESSAGES_PREFIX) {
            set_indexed(&mut output, &message_segments(path), value);
        }
    }

    if input.is_some() {
        update.input = input;
    }
    if output.is_some() {
        update.output = output;
    }
}

// ============================================================================
// VERCEL AI SDK
// ============================================================================

pub(super) fn resolve_vercel(ctx: &ResolveContext<'_>, target: Target, update: &mut EntityUpdate) {
    let attrs = ctx.attributes;
    for (key, value) in attrs {
        if let Some(meta_key) = key.strip_prefix(keys::AI_TELEMETRY_METADATA_PREFIX) {
            update.set_metadata_key(meta_key, structured_or_raw(value));
        }
    }

    if target == Target::Trace {
        return;
    }

    if let Some(model) = get_string(attrs, keys::AI_MODEL_ID) {
        update.model = Some(model);
    }
    for key in [keys::AI_PROMPT, keys::AI_PROMPT_MESSAGES] {
        if let Some(value) = get(attrs, key) {
            update.input = Some(structured_or_raw(value));
        }
    }
    for key in [keys::AI_RESULT_TEXT, keys::AI_RESPONSE_TEXT] {
        if let Some(value) = get(attrs, key) {
            update.output = Some(structured_or_raw(value));
        }
    }
    for (key, suffix) in [
        (keys::AI_USAGE_PROMPT_TOKENS, "input_tokens"),
        (keys::AI_USAGE_COMPLETION_TOKENS, "output_tokens"),
        (keys::AI_USAGE_TOTAL_TOKENS, "total_tokens"),
    ] {
        if let Some(value) = get(attrs, key) {
            update.add_usage(suffix, value);
        }
    }
}

// ============================================================================
// GENERIC SEMANTIC CONVENTIONS
// ============================================================================

pub(super) fn resolve_semconv(ctx: &ResolveContext<'_>, _target: Target, update: &mut EntityUpdate) {
    let attrs = ctx.attributes;
    if let Some(session) = get_string(attrs, keys::SESSION_ID) {
        update.session_id = Some(session);
    }
    if let Some(user) = get_string(attrs, keys::USER_ID) {
        update.user_id = Some(user);
    }
    if let Some(env) = get_first(attrs, &[keys::DEPLOYMENT_ENV_NAME, keys::DEPLOYMENT_ENV]) {
        update.environment = Some(env);
    }
    if let Some(version) = get_string(attrs, keys::SERVICE_VERSION) {
        update.version = Some(version);
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
