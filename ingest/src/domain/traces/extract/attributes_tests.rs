//! Tests for attribute resolution

use serde_json::{Value as JsonValue, json};

use crate::data::types::ObservationLevel;
use crate::domain::traces::extract::{DecodedEvent, EntityUpdate, ResolveContext, Target, resolve};
use crate::utils::otlp::AttributeMap;

use super::*;

fn make_attrs(value: JsonValue) -> AttributeMap {
    value.as_object().cloned().unwrap_or_default()
}

fn resolve_attrs(attrs: JsonValue, target: Target) -> EntityUpdate {
    let attrs = make_attrs(attrs);
    let events: Vec<DecodedEvent> = Vec::new();
    let ctx = ResolveContext {
        attributes: &attrs,
        events: &events,
        span_name: "test-span",
    };
    resolve(&ctx, target)
}

fn observation(attrs: JsonValue) -> EntityUpdate {
    resolve_attrs(attrs, Target::Observation)
}

fn trace(attrs: JsonValue) -> EntityUpdate {
    resolve_attrs(attrs, Target::Trace)
}

fn run_pass(
    pass: fn(&ResolveContext<'_>, Target, &mut EntityUpdate),
    attrs: JsonValue,
) -> EntityUpdate {
    let attrs = make_attrs(attrs);
    let ctx = ResolveContext {
        attributes: &attrs,
        events: &[],
        span_name: "test-span",
    };
    let mut update = EntityUpdate::default();
    pass(&ctx, Target::Observation, &mut update);
    update
}

// ============================================================================
// HELPER FUNCTION TESTS
// ============================================================================

#[test]
fn test_get_string_skips_null_and_empty() {
    let attrs = make_attrs(json!({"a": null, "b": "", "c": 5}));
    assert_eq!(get_string(&attrs, "a"), None);
    assert_eq!(get_string(&attrs, "b"), None);
    assert_eq!(get_string(&attrs, "c"), Some("5".to_string()));
}

#[test]
fn test_message_segments_strips_message() {
    assert_eq!(message_segments("0.message.role"), vec!["0", "role"]);
    assert_eq!(
        message_segments("1.message.contents.0.message_content.text"),
        vec!["1", "contents", "0", "message_content", "text"]
    );
}

// ============================================================================
// BASE PASS
// ============================================================================

#[test]
fn test_base_io_and_model() {
    let update = run_pass(
        resolve_base,
        json!({
            "model": "gpt-4o",
            "input.value": r#"{"question": "why"}"#,
            "output.value": "because",
            "model_config": r#"{"temperature": 0.2}"#
        }),
    );
    assert_eq!(update.model.as_deref(), Some("gpt-4o"));
    assert_eq!(update.input, Some(json!({"question": "why"})));
    assert_eq!(update.output, Some(json!("because")));
    assert_eq!(update.model_parameters, Some(json!({"temperature": 0.2})));
}

#[test]
fn test_base_mlflow_and_traceloop() {
    let update = run_pass(
        resolve_base,
        json!({
            "mlflow.spanInputs": r#"{"a": 1}"#,
            "traceloop.entity.output": r#"["x"]"#
        }),
    );
    assert_eq!(update.input, Some(json!({"a": 1})));
    assert_eq!(update.output, Some(json!(["x"])));
}

#[test]
fn test_base_malformed_json_keeps_raw() {
    let update = run_pass(resolve_base, json!({"model_config": "{oops", "input": "[1, 2"}));
    assert_eq!(update.model_parameters, Some(json!("{oops")));
    assert_eq!(update.input, Some(json!("[1, 2")));
}

// ============================================================================
// GEN AI PASS
// ============================================================================

#[test]
fn test_gen_ai_model_request_wins() {
    let update = run_pass(
        resolve_gen_ai,
        json!({"gen_ai.response.model": "gpt-4o-2024-08-06", "gen_ai.request.model": "gpt-4o"}),
    );
    assert_eq!(update.model.as_deref(), Some("gpt-4o"));

    let update = run_pass(resolve_gen_ai, json!({"gen_ai.response.model": "only-response"}));
    assert_eq!(update.model.as_deref(), Some("only-response"));
}

#[test]
fn test_gen_ai_request_parameters() {
    let update = run_pass(
        resolve_gen_ai,
        json!({
            "gen_ai.request.model": "m",
            "gen_ai.request.temperature": 0.7,
            "gen_ai.request.max_tokens": 256,
            "gen_ai.request.stop_sequences": ["\n"]
        }),
    );
    assert_eq!(
        update.model_parameters,
        Some(json!({"temperature": 0.7, "max_tokens": 256, "stop_sequences": ["\n"]}))
    );
}

#[test]
fn test_gen_ai_usage_cost_excluded_from_usage() {
    let update = run_pass(resolve_gen_ai, json!({"gen_ai.usage.cost": 0.0042}));
    assert_eq!(update.usage_details, None, "cost must never land in usage");
    assert_eq!(update.cost_details, Some(json!({"total": 0.0042})));
}

#[test]
fn test_gen_ai_usage_coerces_strings() {
    let update = run_pass(
        resolve_gen_ai,
        json!({
            "gen_ai.usage.input_tokens": "15",
            "gen_ai.usage.completion_tokens": 3,
            "gen_ai.usage.total_tokens": 18
        }),
    );
    assert_eq!(
        update.usage_details,
        Some(json!({"input": 15, "output": 3, "total": 18}))
    );
}

#[test]
fn test_gen_ai_indexed_prompts() {
    let update = run_pass(
        resolve_gen_ai,
        json!({
            "gen_ai.prompt.0.role": "system",
            "gen_ai.prompt.0.content": "be nice",
            "gen_ai.prompt.1.role": "user",
            "gen_ai.prompt.1.content": "hi",
            "gen_ai.completion.0.role": "assistant",
            "gen_ai.completion.0.content": "hello"
        }),
    );
    assert_eq!(
        update.input,
        Some(json!([
            {"role": "system", "content": "be nice"},
            {"role": "user", "content": "hi"}
        ]))
    );
    assert_eq!(
        update.output,
        Some(json!([{"role": "assistant", "content": "hello"}]))
    );
}

#[test]
fn test_gen_ai_indexed_gap_is_filled_with_null() {
    let update = run_pass(resolve_gen_ai, json!({"gen_ai.prompt.2.content": "third"}));
    assert_eq!(update.input, Some(json!([null, null, {"content": "third"}])));
}

#[test]
fn test_gen_ai_bare_completion_content_is_object() {
    let update = run_pass(resolve_gen_ai, json!({"gen_ai.completion.content": "done"}));
    assert_eq!(update.output, Some(json!({"content": "done"})));
}

#[test]
fn test_gen_ai_bare_completion_is_raw_scalar() {
    let update = run_pass(
        resolve_gen_ai,
        json!({"gen_ai.completion": "plain", "gen_ai.prompt": r#"[{"role":"user"}]"#}),
    );
    assert_eq!(update.output, Some(json!("plain")));
    assert_eq!(update.input, Some(json!(r#"[{"role":"user"}]"#)));
}

#[test]
fn test_gen_ai_messages_attributes() {
    let update = run_pass(
        resolve_gen_ai,
        json!({
            "gen_ai.input.messages": r#"[{"role":"user","parts":[]}]"#,
            "gen_ai.output.messages": r#"[{"role":"assistant","parts":[]}]"#
        }),
    );
    assert_eq!(update.input, Some(json!([{"role": "user", "parts": []}])));
    assert_eq!(update.output, Some(json!([{"role": "assistant", "parts": []}])));
}

// ============================================================================
// LLM PASS
// ============================================================================

#[test]
fn test_llm_openinference() {
    let update = run_pass(
        resolve_llm,
        json!({
            "llm.model_name": "claude",
            "llm.invocation_parameters": r#"{"temperature": 0.1, "max_tokens": 10}"#,
            "llm.token_count.prompt": 11,
            "llm.token_count.completion": "4",
            "llm.token_count.total": 15,
            "llm.input_messages.0.message.role": "user",
            "llm.input_messages.0.message.content": "q",
            "llm.output_messages.0.message.role": "assistant",
            "llm.output_messages.0.message.content": "a"
        }),
    );
    assert_eq!(update.model.as_deref(), Some("claude"));
    assert_eq!(
        update.model_parameters,
        Some(json!({"temperature": 0.1, "max_tokens": 10}))
    );
    assert_eq!(
        update.usage_details,
        Some(json!({"input": 11, "output": 4, "total": 15}))
    );
    assert_eq!(update.input, Some(json!([{"role": "user", "content": "q"}])));
    assert_eq!(update.output, Some(json!([{"role": "assistant", "content": "a"}])));
}

#[test]
fn test_llm_cost_keys() {
    let update = run_pass(
        resolve_llm,
        json!({"llm.cost.prompt": 0.1, "llm.cost.completion": 0.2, "llm.cost.total": 0.3}),
    );
    assert_eq!(
        update.cost_details,
        Some(json!({"input": 0.1, "output": 0.2, "total": 0.3}))
    );
    assert_eq!(update.usage_details, None);
}

#[test]
fn test_llm_invocation_parameters_merge_with_gen_ai() {
    let update = observation(json!({
        "gen_ai.request.temperature": 0.5,
        "gen_ai.request.top_p": 0.9,
        "llm.invocation_parameters": r#"{"temperature": 0.0}"#
    }));
    assert_eq!(
        update.model_parameters,
        Some(json!({"temperature": 0.0, "top_p": 0.9}))
    );
}

// ============================================================================
// VERCEL PASS
// ============================================================================

#[test]
fn test_vercel_ai_sdk() {
    let update = run_pass(
        resolve_vercel,
        json!({
            "ai.model.id": "gpt-4o-mini",
            "ai.prompt.messages": r#"[{"role":"user","content":"hey"}]"#,
            "ai.response.text": "yo",
            "ai.usage.promptTokens": 9,
            "ai.usage.completionTokens": 2,
            "ai.telemetry.metadata.feature": "chat"
        }),
    );
    assert_eq!(update.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(update.input, Some(json!([{"role": "user", "content": "hey"}])));
    assert_eq!(update.output, Some(json!("yo")));
    assert_eq!(update.usage_details, Some(json!({"input": 9, "output": 2})));
    assert_eq!(update.metadata, Some(json!({"feature": "chat"})));
}

// ============================================================================
// PRECEDENCE
// ============================================================================

#[test]
fn test_session_id_precedence() {
    let update = trace(json!({"session.id": "semconv", "gen_ai.conversation.id": "conv"}));
    assert_eq!(update.session_id.as_deref(), Some("semconv"));

    let update = trace(json!({"langfuse.session.id": "lf", "session.id": "semconv"}));
    assert_eq!(update.session_id.as_deref(), Some("lf"));

    let update = trace(json!({"gen_ai.conversation.id": "conv"}));
    assert_eq!(update.session_id.as_deref(), Some("conv"));
}

#[test]
fn test_user_id_precedence() {
    let update = trace(json!({"langfuse.user.id": "lf", "user.id": "semconv"}));
    assert_eq!(update.user_id.as_deref(), Some("lf"));

    let update = trace(json!({"user.id": "semconv"}));
    assert_eq!(update.user_id.as_deref(), Some("semconv"));
}

#[test]
fn test_langfuse_io_overrides_vendor_io() {
    let update = observation(json!({
        "input.value": "vendor in",
        "gen_ai.prompt.0.content": "gen ai in",
        "langfuse.observation.input": r#"{"explicit": true}"#
    }));
    assert_eq!(update.input, Some(json!({"explicit": true})));
}

#[test]
fn test_environment_precedence() {
    let update = trace(json!({"deployment.environment": "staging"}));
    assert_eq!(update.environment.as_deref(), Some("staging"));

    let update = trace(json!({
        "deployment.environment": "staging",
        "deployment.environment.name": "prod"
    }));
    assert_eq!(update.environment.as_deref(), Some("prod"));

    let update = trace(json!({"deployment.environment": "staging", "langfuse.environment": "lf"}));
    assert_eq!(update.environment.as_deref(), Some("lf"));
}

#[test]
fn test_trace_target_ignores_observation_io() {
    let update = trace(json!({"input.value": "x", "gen_ai.request.model": "m"}));
    assert_eq!(update.input, None);
    assert_eq!(update.model, None);
}

// ============================================================================
// LANGFUSE PASS
// ============================================================================

#[test]
fn test_langfuse_tags_shapes() {
    let update = trace(json!({"langfuse.tags": "2,3,4"}));
    assert_eq!(update.tags, Some(vec!["2".into(), "3".into(), "4".into()]));

    let update = trace(json!({"langfuse.tags": r#"["2"]"#}));
    assert_eq!(update.tags, Some(vec!["2".to_string()]));

    let update = trace(json!({"langfuse.tags": ["2", "3", "4"]}));
    assert_eq!(update.tags, Some(vec!["2".into(), "3".into(), "4".into()]));

    let update = trace(json!({"langfuse.trace.tags": "single"}));
    assert_eq!(update.tags, Some(vec!["single".to_string()]));
}

#[test]
fn test_langfuse_public_literal_true_only() {
    assert_eq!(trace(json!({"langfuse.public": true})).public, Some(true));
    assert_eq!(trace(json!({"langfuse.public": "true"})).public, Some(true));
    assert_eq!(trace(json!({"langfuse.public": "false"})).public, Some(false));
    assert_eq!(trace(json!({"langfuse.trace.public": "yes"})).public, Some(false));
    assert_eq!(trace(json!({})).public, None);
}

#[test]
fn test_langfuse_metadata_merge() {
    let update = trace(json!({
        "langfuse.metadata": r#"{"a": 1, "b": 2}"#,
        "langfuse.metadata.b": "override",
        "langfuse.trace.metadata.c": r#"{"nested": true}"#
    }));
    assert_eq!(
        update.metadata,
        Some(json!({"a": 1, "b": "override", "c": {"nested": true}}))
    );
}

#[test]
fn test_langfuse_metadata_malformed_kept_raw() {
    let update = observation(json!({"langfuse.observation.metadata": "{broken"}));
    assert_eq!(update.metadata, Some(json!("{broken")));
}

#[test]
fn test_langfuse_trace_fields() {
    let update = trace(json!({
        "langfuse.trace.name": "my-trace",
        "langfuse.trace.user_id": "u1",
        "langfuse.trace.session_id": "s1",
        "langfuse.trace.input": r#"{"q": 1}"#,
        "langfuse.trace.output": "done",
        "langfuse.release": "r1",
        "langfuse.version": "v2"
    }));
    assert_eq!(update.name.as_deref(), Some("my-trace"));
    assert_eq!(update.user_id.as_deref(), Some("u1"));
    assert_eq!(update.session_id.as_deref(), Some("s1"));
    assert_eq!(update.input, Some(json!({"q": 1})));
    assert_eq!(update.output, Some(json!("done")));
    assert_eq!(update.release.as_deref(), Some("r1"));
    assert_eq!(update.version.as_deref(), Some("v2"));
}

#[test]
fn test_langfuse_observation_fields() {
    let update = observation(json!({
        "gen_ai.request.model": "vendor-model",
        "langfuse.observation.model.name": "explicit-model",
        "langfuse.observation.model.parameters": r#"{"temperature": 1}"#,
        "langfuse.observation.usage_details": r#"{"input": 10, "output": "15", "cost": 0.5}"#,
        "langfuse.observation.cost_details": r#"{"output": 0.25}"#,
        "langfuse.observation.prompt.name": "greeting",
        "langfuse.observation.prompt.version": "3",
        "langfuse.observation.level": "warning",
        "langfuse.observation.status_message": "slow",
        "langfuse.observation.completion_start_time": "\"2024-01-01T00:00:00.000Z\""
    }));
    assert_eq!(update.model.as_deref(), Some("explicit-model"));
    assert_eq!(update.model_parameters, Some(json!({"temperature": 1})));
    assert_eq!(update.usage_details, Some(json!({"input": 10, "output": 15})));
    assert_eq!(update.cost_details, Some(json!({"total": 0.5, "output": 0.25})));
    assert_eq!(update.prompt_name.as_deref(), Some("greeting"));
    assert_eq!(update.prompt_version, Some(3));
    assert_eq!(update.level, Some(ObservationLevel::Warning));
    assert_eq!(update.status_message.as_deref(), Some("slow"));
    assert_eq!(
        update.completion_start_time.as_deref(),
        Some("2024-01-01T00:00:00.000Z")
    );
}

#[test]
fn test_langfuse_unknown_level_ignored() {
    let update = observation(json!({"langfuse.observation.level": "LOUD"}));
    assert_eq!(update.level, None);
}
