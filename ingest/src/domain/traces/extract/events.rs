//! Span event resolver pass
//!
//! Handles the event-based GenAI conventions: content events carrying the
//! whole prompt/completion, one event per chat message, and `gen_ai.choice`.
//! Any other event is nested under `output` by attribute name.

use serde_json::{Map, Value as JsonValue};

use super::attributes::get;
use super::{EntityUpdate, ResolveContext, Target, keys};
use crate::data::types::SpanEvent;
use crate::utils::json::{structured_or_raw, value_to_string};
use crate::utils::otlp::{AttributeMap, decode_attributes};

/// A span event with decoded attributes
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub attributes: AttributeMap,
}

impl From<&SpanEvent> for DecodedEvent {
    fn from(event: &SpanEvent) -> Self {
        Self {
            name: event.name.clone(),
            attributes: decode_attributes(&event.attributes),
        }
    }
}

fn message_role(event_name: &str) -> Option<&'static str> {
    match event_name {
        keys::EVENT_SYSTEM_MESSAGE => Some("system"),
        keys::EVENT_USER_MESSAGE => Some("user"),
        keys::EVENT_ASSISTANT_MESSAGE => Some("assistant"),
        keys::EVENT_TOOL_MESSAGE => Some("tool"),
        _ => None,
    }
}

pub(super) fn resolve_events(ctx: &ResolveContext<'_>, target: Target, update: &mut EntityUpdate) {
    if target == Target::Trace || ctx.events.is_empty() {
        return;
    }

    let mut messages: Vec<JsonValue> = Vec::new();
    let mut output = Map::new();

    for event in ctx.events {
        let attrs = &event.attributes;
        fold_usage(attrs, update);

        match event.name.as_str() {
            keys::EVENT_CONTENT_PROMPT => match get(attrs, keys::GEN_AI_PROMPT) {
                Some(prompt) => update.input = Some(structured_or_raw(prompt)),
                None => nest_attributes(attrs, &mut output),
            },
            keys::EVENT_CONTENT_COMPLETION => match get(attrs, keys::GEN_AI_COMPLETION) {
                Some(completion) => update.output = Some(structured_or_raw(completion)),
                None => nest_attributes(attrs, &mut output),
            },
            keys::EVENT_CHOICE => {
                for (key, value) in payload_attributes(attrs) {
                    output.insert(key.clone(), structured_or_raw(value));
                }
            }
            keys::EVENT_EXCEPTION if update.status_message.is_none() => {
                update.status_message = exception_message(attrs);
            }
            name => match message_role(name) {
                Some(role) => messages.push(message_from_event(attrs, role)),
                None => {
                    tracing::trace!(event = %name, "Nesting unmapped span event under output");
                    nest_attributes(attrs, &mut output);
                }
            },
        }
    }

    if !messages.is_empty() {
        update.input = Some(JsonValue::Array(messages));
    }
    if !output.is_empty() {
        merge_output(update, output);
    }
}

/// Event attributes other than usage counters and the system marker.
fn payload_attributes(attrs: &AttributeMap) -> impl Iterator<Item = (&String, &JsonValue)> {
    attrs.iter().filter(|(key, value)| {
        !value.is_null()
            && key.as_str() != keys::GEN_AI_SYSTEM
            && !key.starts_with(keys::GEN_AI_USAGE_PREFIX)
    })
}

fn fold_usage(attrs: &AttributeMap, update: &mut EntityUpdate) {
    for (key, value) in attrs {
        if let Some(suffix) = key.strip_prefix(keys::GEN_AI_USAGE_PREFIX) {
            update.add_usage(suffix, value);
        }
    }
}

fn message_from_event(attrs: &AttributeMap, role: &str) -> JsonValue {
    let mut message = Map::new();
    for (key, value) in payload_attributes(attrs) {
        message.insert(key.clone(), structured_or_raw(value));
    }
    if !message.contains_key("role") {
        message.insert("role".to_string(), JsonValue::String(role.to_string()));
    }
    JsonValue::Object(message)
}

fn nest_attributes(attrs: &AttributeMap, output: &mut Map<String, JsonValue>) {
    for (key, value) in payload_attributes(attrs) {
        output.insert(key.clone(), value.clone());
    }
}

/// Fold event-derived output keys into the resolved output.
fn merge_output(update: &mut EntityUpdate, incoming: Map<String, JsonValue>) {
    match update.output.as_mut() {
        Some(JsonValue::Object(existing)) => existing.extend(incoming),
        _ => update.output = Some(JsonValue::Object(incoming)),
    }
}

fn exception_message(attrs: &AttributeMap) -> Option<String> {
    let kind = get(attrs, keys::EXCEPTION_TYPE).and_then(value_to_string);
    let message = get(attrs, keys::EXCEPTION_MESSAGE).and_then(value_to_string);
    match (kind, message) {
        (Some(kind), Some(message)) => Some(format!("{kind}: {message}")),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}
