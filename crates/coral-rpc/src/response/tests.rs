//! Unit tests for invocation results and responses.

use serde_json::json;

use super::*;

#[test]
fn outcome_maps_onto_result() {
    let success = InvocationResult::from(Ok(Some(json!(3))));
    assert!(success.is_success());
    assert_eq!(success.value(), Some(&json!(3)));
    assert!(success.failure().is_none());

    let failure = InvocationResult::from(Err(Failure::new(FailureKind::Method, "denied")));
    assert!(!failure.is_success());
    assert_eq!(failure.value(), None);
    assert_eq!(failure.failure_kind(), Some(FailureKind::Method));
}

#[test]
fn failure_response_carries_only_the_message() {
    let response = Response::from(InvocationResult::Failure(Failure::new(
        FailureKind::Runtime,
        "runtime error",
    )));
    assert_eq!(response, Response::error("runtime error"));
    assert!(response.payload_bytes().expect("bytes").is_empty());
    assert_eq!(
        serde_json::to_value(&response).expect("encode"),
        json!({"status": "error", "message": "runtime error"})
    );
}

#[test]
fn absent_reply_has_empty_payload() {
    let response = Response::from(InvocationResult::Success(None));
    assert!(response.is_success());
    assert!(response.payload_bytes().expect("bytes").is_empty());
    assert_eq!(
        serde_json::to_string(&response).expect("encode"),
        r#"{"status":"success"}"#
    );
}

#[test]
fn response_documents_parse_back() {
    let response: Response =
        serde_json::from_str(r#"{"status":"success","payload":{"n":1}}"#).expect("decode");
    assert_eq!(response, Response::success(Some(json!({"n": 1}))));
    assert_eq!(response.payload_bytes().expect("bytes"), br#"{"n":1}"#);
}
