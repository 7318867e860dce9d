//! Unit tests for Langbase API types.

use super::*;
use serde_json::json;

#[test]
fn test_message_constructors() {
    assert_eq!(Message::system("rules").role, MessageRole::System);
    assert_eq!(Message::user("hi").role, MessageRole::User);

    let msg = Message::assistant("Hi there!");
    assert_eq!(msg.role, MessageRole::Assistant);
    assert_eq!(msg.content, "Hi there!");
}

#[test]
fn test_message_round_trips_lowercase_role() {
    let value = serde_json::to_value(Message::assistant("ok")).unwrap();
    assert_eq!(value, json!({"role": "assistant", "content": "ok"}));

    let parsed: Message = serde_json::from_value(json!({"role": "user", "content": "x"})).unwrap();
    assert_eq!(parsed, Message::user("x"));
}

#[test]
fn test_pipe_request_new() {
    let req = PipeRequest::new("test-pipe", vec![Message::user("test")]);
    assert_eq!(req.name, "test-pipe");
    assert_eq!(req.messages.len(), 1);
    assert!(!req.stream);
    assert!(req.variables.is_none());
    assert!(req.thread_id.is_none());
}

#[test]
fn test_pipe_request_with_variable_and_thread() {
    let req = PipeRequest::new("test", vec![])
        .with_variable("key1", "value1")
        .with_variable("key2", "value2")
        .with_thread_id("session-1");

    let vars = req.variables.as_ref().unwrap();
    assert_eq!(vars.len(), 2);
    assert_eq!(vars.get("key2"), Some(&"value2".to_string()));
    assert_eq!(req.thread_id.as_deref(), Some("session-1"));
}

#[test]
fn test_pipe_request_serialize_skips_empty_optionals() {
    let req = PipeRequest::new("pipe", vec![Message::user("hello")]);
    let value = serde_json::to_value(&req).unwrap();

    assert_eq!(value["name"], "pipe");
    assert_eq!(value["stream"], false);
    assert!(value.get("variables").is_none());
    assert!(value.get("threadId").is_none());
}

#[test]
fn test_pipe_response_deserialize() {
    let body = json!({
        "success": true,
        "completion": "done",
        "threadId": "thread-9",
        "raw": {
            "model": "gpt-4o-mini",
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }
    });

    let resp: PipeResponse = serde_json::from_value(body).unwrap();
    assert!(resp.success);
    assert_eq!(resp.completion, "done");
    assert_eq!(resp.thread_id.as_deref(), Some("thread-9"));
    let usage = resp.raw.unwrap().usage.unwrap();
    assert_eq!(usage.total_tokens, Some(15));
}

#[test]
fn test_pipe_response_deserialize_minimal() {
    let resp: PipeResponse =
        serde_json::from_value(json!({"success": true, "completion": "x"})).unwrap();
    assert!(resp.thread_id.is_none());
    assert!(resp.raw.is_none());
}

#[test]
fn test_create_pipe_request_builder_chain() {
    let req = CreatePipeRequest::new("architect-deep-v1")
        .with_description("deep")
        .with_model("openai:gpt-4o")
        .with_upsert(true)
        .with_temperature(0.7)
        .with_max_tokens(4096);

    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["name"], "architect-deep-v1");
    assert_eq!(value["upsert"], true);
    assert_eq!(value["max_tokens"], 4096);
    assert!(value.get("stream").is_none());
}
