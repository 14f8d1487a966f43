//! Unit tests for base parameters and contexts.

use super::*;

use rstest::rstest;
use time::OffsetDateTime;

use crate::error::ContextError;

#[test]
fn base_param_downcasts_to_its_own_type() {
    let param = BaseParam::new(7_u32);
    assert_eq!(param.downcast::<u32>().expect("u32"), 7);
}

#[test]
fn base_param_returns_itself_on_type_mismatch() {
    let param = BaseParam::new(String::from("ctx"));
    let param = param.downcast::<u32>().expect_err("not a u32");
    assert_eq!(param.downcast::<String>().expect("string"), "ctx");
}

#[test]
fn context_is_injected_but_never_decoded() {
    let raw = RawValue::from_string("{}".to_owned()).expect("raw json");
    let error = Context::decode(&raw).expect_err("context is not wire data");
    assert!(matches!(error, DecodeError::NotWireType { .. }));

    let injected = Context::inject(BaseParam::from(Context::new(5_u8))).expect("inject");
    assert_eq!(injected.downcast_ref::<u8>(), Some(&5));
}

#[test]
fn context_descriptor_is_context_shaped() {
    assert!(Context::descriptor().is_context());
}

#[test]
fn memory_context_round_trips_state() {
    let context = MemoryContext::new("0x01");
    context.put_state("account:alice", b"10".to_vec());
    context.put_state("account:bob", b"4".to_vec());
    context.put_state("meta", b"x".to_vec());

    assert_eq!(context.get_state("account:alice"), Some(b"10".to_vec()));
    assert_eq!(
        context.state_keys("account:"),
        vec!["account:alice".to_owned(), "account:bob".to_owned()]
    );
    assert_eq!(context.del_state("meta"), Some(b"x".to_vec()));
    assert_eq!(context.get_state("meta"), None);
}

#[test]
fn memory_contexts_get_distinct_transaction_ids() {
    let first = MemoryContext::new("0x01");
    let second = MemoryContext::new("0x01");
    assert_ne!(first.tx_id(), second.tx_id());
    assert_eq!(first.channel_id(), "mem-channel");
}

#[test]
fn memory_context_records_events() {
    let context = MemoryContext::new("0x01");
    context.set_event("bank.Transfer", b"{}".to_vec());
    assert_eq!(context.event("bank.Transfer"), Some(b"{}".to_vec()));
    assert_eq!(context.event("bank.Mint"), None);
}

#[test]
fn composite_keys_split_back_into_their_parts() {
    let key = keys::create_composite_key("Account", &["alice", "savings"]).expect("key");
    assert_eq!(key, "\u{0}Account\u{0}alice\u{0}savings\u{0}");
    let (object_type, attributes) = keys::split_composite_key(&key).expect("split");
    assert_eq!(object_type, "Account");
    assert_eq!(attributes, ["alice", "savings"]);
}

#[test]
fn composite_key_without_attributes_has_one_part() {
    let key = keys::create_composite_key::<&str>("Account", &[]).expect("key");
    let (object_type, attributes) = keys::split_composite_key(&key).expect("split");
    assert_eq!(object_type, "Account");
    assert!(attributes.is_empty());
}

#[rstest]
#[case::nul_in_type("Acc\u{0}ount", &["alice"], '\u{0}', 3)]
#[case::max_in_attribute("Account", &["ali\u{10FFFF}ce"], '\u{10FFFF}', 3)]
#[case::nul_leading_attribute("Account", &["ok", "\u{0}"], '\u{0}', 0)]
fn composite_keys_reject_reserved_code_points(
    #[case] object_type: &str,
    #[case] attributes: &[&str],
    #[case] expected: char,
    #[case] expected_position: usize,
) {
    let error = keys::create_composite_key(object_type, attributes).expect_err("reserved");
    let ContextError::InvalidCodePoint {
        code_point,
        position,
    } = error
    else {
        panic!("expected an invalid code point, got {error:?}");
    };
    assert_eq!(code_point, expected);
    assert_eq!(position, expected_position);
}

#[rstest]
#[case::plain("Account/alice")]
#[case::no_trailing_separator("\u{0}Account\u{0}alice")]
#[case::empty("")]
fn splitting_a_non_composite_key_fails(#[case] key: &str) {
    let error = keys::split_composite_key(key).expect_err("not composite");
    assert!(matches!(error, ContextError::NotComposite { key: ref found } if found == key));
}

#[test]
fn plain_keys_join_with_slashes() {
    let key = keys::create_key("Counter", &["apples", "red"]).expect("key");
    assert_eq!(key, "Counter/apples/red");
    assert_eq!(
        keys::split_key(&key),
        ("Counter".to_owned(), vec!["apples".to_owned(), "red".to_owned()])
    );
}

#[rstest]
#[case::in_attribute("Counter", &["a/b"], "a/b")]
#[case::in_type("Coun/ter", &["apples"], "Coun/ter")]
fn plain_keys_reject_the_delimiter(
    #[case] object_type: &str,
    #[case] attributes: &[&str],
    #[case] expected: &str,
) {
    let error = keys::create_key(object_type, attributes).expect_err("delimiter");
    assert!(matches!(error, ContextError::Delimiter { ref part } if part == expected));
    assert!(error.to_string().contains(expected));
}

#[rstest]
#[case::empty_app("", "Added")]
#[case::empty_event("counter", "")]
#[case::dotted_app("coral.counter", "Added")]
fn event_names_need_two_clean_parts(#[case] app: &str, #[case] event: &str) {
    let error = keys::make_event_name(app, event).expect_err("bad event name");
    assert!(matches!(error, ContextError::EventName { .. }));
}

#[test]
fn memory_context_builds_readable_composite_keys() {
    let context = MemoryContext::new("0x01");
    let apples = context
        .create_composite_key("Counter", &["apples"])
        .expect("key");
    let pears = context
        .create_composite_key("Counter", &["pears"])
        .expect("key");
    context.put_state(apples.clone(), b"1".to_vec());
    context.put_state(pears, b"2".to_vec());
    context.put_state("Counterfeit", b"3".to_vec());

    assert_eq!(apples, "Counter/apples");
    assert_eq!(
        context
            .state_keys_by_partial_key::<&str>("Counter", &[])
            .expect("partial key"),
        ["Counter/apples", "Counter/pears"]
    );
    let (_, attributes) = context.split_composite_key(&apples);
    assert_eq!(attributes, ["apples"]);
}

#[test]
fn memory_context_names_events_from_app_and_event() {
    let context = MemoryContext::new("0x01");
    context
        .create_event("counter", "Added", b"apples".to_vec())
        .expect("event");
    assert_eq!(context.event("counter.Added"), Some(b"apples".to_vec()));

    let error = context
        .create_event("", "Added", Vec::new())
        .expect_err("empty app");
    assert!(matches!(error, ContextError::EventName { .. }));
}

#[test]
fn memory_context_timestamp_renders_as_rfc3339() {
    let timestamp = OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp");
    let context = MemoryContext::new("0x01").with_tx_timestamp(timestamp);
    assert_eq!(context.tx_timestamp(), timestamp);
    assert_eq!(
        context.tx_timestamp_rfc3339().expect("rfc3339"),
        "2023-11-14T22:13:20Z"
    );
}

#[test]
fn memory_context_timestamp_is_stable_for_the_transaction() {
    let context = MemoryContext::new("0x01");
    assert_eq!(context.tx_timestamp(), context.tx_timestamp());
}
