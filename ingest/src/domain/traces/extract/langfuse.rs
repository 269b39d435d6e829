//! Langfuse-namespaced overrides (highest priority pass)

use super::attributes::{get, get_string, set_tags};
use super::{EntityUpdate, ResolveContext, Target, keys};
use crate::data::types::ObservationLevel;
use crate::utils::json::{
    parse_json_value, structured_or_raw, value_as_number, value_is_true_literal, value_to_string,
};
use crate::utils::otlp::AttributeMap;

pub(super) fn resolve_langfuse(ctx: &ResolveContext<'_>, target: Target, update: &mut EntityUpdate) {
    let attrs = ctx.attributes;

    if let Some(env) = get_string(attrs, keys::LANGFUSE_ENVIRONMENT) {
        update.environment = Some(env);
    }
    if let Some(version) = get_string(attrs, keys::LANGFUSE_VERSION) {
        update.version = Some(version);
    }
    if let Some(release) = get_string(attrs, keys::LANGFUSE_RELEASE) {
        update.release = Some(release);
    }
    if let Some(session) = get_string(attrs, keys::LANGFUSE_SESSION_ID) {
        update.session_id = Some(session);
    }
    if let Some(user) = get_string(attrs, keys::LANGFUSE_USER_ID) {
        update.user_id = Some(user);
    }
    if let Some(metadata) = get(attrs, keys::LANGFUSE_METADATA) {
        update.merge_metadata(parse_json_value(metadata));
    }
    apply_metadata_keys(attrs, keys::LANGFUSE_METADATA_PREFIX, update);

    match target {
        Target::Trace => resolve_trace(attrs, update),
        Target::Observation => resolve_observation(attrs, update),
    }
}

fn resolve_trace(attrs: &AttributeMap, update: &mut EntityUpdate) {
    if let Some(name) = get_string(attrs, keys::LANGFUSE_TRACE_NAME) {
        update.name = Some(name);
    }
    if let Some(user) = get_string(attrs, keys::LANGFUSE_TRACE_USER_ID) {
        update.user_id = Some(user);
    }
    if let Some(session) = get_string(attrs, keys::LANGFUSE_TRACE_SESSION_ID) {
        update.session_id = Some(session);
    }

    set_tags(&mut update.tags, attrs, keys::LANGFUSE_TAGS);
    set_tags(&mut update.tags, attrs, keys::LANGFUSE_TRACE_TAGS);

    for key in [keys::LANGFUSE_PUBLIC, keys::LANGFUSE_TRACE_PUBLIC] {
        if let Some(value) = get(attrs, key) {
            update.public = Some(value_is_true_literal(value));
        }
    }

    if let Some(input) = get(attrs, keys::LANGFUSE_TRACE_INPUT) {
        update.input = Some(structured_or_raw(input));
    }
    if let Some(output) = get(attrs, keys::LANGFUSE_TRACE_OUTPUT) {
        update.output = Some(structured_or_raw(output));
    }
    if let Some(metadata) = get(attrs, keys::LANGFUSE_TRACE_METADATA) {
        update.merge_metadata(parse_json_value(metadata));
    }
    apply_metadata_keys(attrs, keys::LANGFUSE_TRACE_METADATA_PREFIX, update);
}

fn resolve_observation(attrs: &AttributeMap, update: &mut EntityUpdate) {
    if let Some(input) = get(attrs, keys::LANGFUSE_OBSERVATION_INPUT) {
        update.input = Some(structured_or_raw(input));
    }
    if let Some(output) = get(attrs, keys::LANGFUSE_OBSERVATION_OUTPUT) {
        update.output = Some(structured_or_raw(output));
    }
    if let Some(metadata) = get(attrs, keys::LANGFUSE_OBSERVATION_METADATA) {
        update.merge_metadata(parse_json_value(metadata));
    }
    apply_metadata_keys(attrs, keys::LANGFUSE_OBSERVATION_METADATA_PREFIX, update);

    if let Some(model) = get_string(attrs, keys::LANGFUSE_OBSERVATION_MODEL) {
        update.model = Some(model);
    }
    if let Some(params) = get(attrs, keys::LANGFUSE_OBSERVATION_MODEL_PARAMETERS) {
        update.merge_model_parameters(parse_json_value(params));
    }
    if let Some(usage) = get(attrs, keys::LANGFUSE_OBSERVATION_USAGE_DETAILS) {
        update.merge_usage_details(parse_json_value(usage));
    }
    if let Some(cost) = get(attrs, keys::LANGFUSE_OBSERVATION_COST_DETAILS) {
        update.merge_cost_details(parse_json_value(cost));
    }

    if let Some(name) = get_string(attrs, keys::LANGFUSE_OBSERVATION_PROMPT_NAME) {
        update.prompt_name = Some(name);
    }
    if let Some(version) = get(attrs, keys::LANGFUSE_OBSERVATION_PROMPT_VERSION)
        .and_then(value_as_number)
        .and_then(|n| n.as_i64())
    {
        update.prompt_version = Some(version);
    }

    if let Some(level) = get_string(attrs, keys::LANGFUSE_OBSERVATION_LEVEL) {
        match ObservationLevel::parse(&level) {
            Some(level) => update.level = Some(level),
            None => tracing::debug!(level = %level, "Ignoring unknown observation level"),
        }
    }
    if let Some(message) = get_string(attrs, keys::LANGFUSE_OBSERVATION_STATUS_MESSAGE) {
        update.status_message = Some(message);
    }
    if let Some(start) = get(attrs, keys::LANGFUSE_OBSERVATION_COMPLETION_START_TIME)
        .and_then(value_to_string)
        .map(|s| s.trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
    {
        update.completion_start_time = Some(start);
    }
}

/// `<prefix><key>` attributes become individual metadata keys.
fn apply_metadata_keys(attrs: &AttributeMap, prefix: &str, update: &mut EntityUpdate) {
    for (key, value) in attrs {
        if value.is_null() {
            continue;
        }
        if let Some(meta_key) = key.strip_prefix(prefix)
            && !meta_key.is_empty()
        {
            update.set_metadata_key(meta_key, structured_or_raw(value));
        }
    }
}
