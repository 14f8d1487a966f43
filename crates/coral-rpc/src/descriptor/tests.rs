//! Unit tests for type and output descriptors.

use rstest::rstest;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::*;
use crate::error::MethodError;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i64,
    y: i64,
}

crate::rpc_type!(Point);

fn raw(text: &str) -> Box<RawValue> {
    RawValue::from_string(text.to_owned()).expect("valid raw json")
}

#[rstest]
#[case::primitive(<u64 as Param>::descriptor(), true)]
#[case::named(TypeDescriptor::named("Point"), true)]
#[case::private(TypeDescriptor::named("point"), false)]
#[case::private_in_vec(TypeDescriptor::sequence(TypeDescriptor::named("point")), false)]
#[case::private_in_option(TypeDescriptor::optional(TypeDescriptor::named("point")), false)]
#[case::nested_exported(
    TypeDescriptor::map(TypeDescriptor::sequence(TypeDescriptor::named("Point"))),
    true
)]
fn exported_or_builtin_is_checked_recursively(
    #[case] descriptor: TypeDescriptor,
    #[case] expected: bool,
) {
    assert_eq!(descriptor.is_exported_or_builtin(), expected, "{descriptor:?}");
}

#[test]
fn short_type_name_strips_path_and_generics() {
    assert_eq!(short_type_name::<Point>(), "Point");
    assert_eq!(short_type_name::<Vec<Point>>(), "Vec");
    assert_eq!(short_type_name::<u8>(), "u8");
}

#[rstest]
#[case::tuple(short_type_name::<(u8, Point)>(), std::any::type_name::<(u8, Point)>())]
#[case::nested_tuple(
    short_type_name::<(u8, Vec<Point>)>(),
    std::any::type_name::<(u8, Vec<Point>)>()
)]
#[case::array(short_type_name::<[Point; 2]>(), std::any::type_name::<[Point; 2]>())]
#[case::slice_ref(short_type_name::<&[Point]>(), std::any::type_name::<&[Point]>())]
fn compound_type_names_are_kept_whole(#[case] short: &str, #[case] full: &str) {
    assert_eq!(short, full);
    assert!(!is_exported(short));
}

#[test]
fn generic_arguments_that_are_tuples_do_not_leak() {
    assert_eq!(short_type_name::<Vec<(u8, Point)>>(), "Vec");
}

#[test]
fn error_shape_survives_option_wrapping() {
    assert!(<MethodError as Reply>::descriptor().is_error_shaped());
    assert!(<Option<MethodError> as Reply>::descriptor().is_error_shaped());
    assert!(!<String as Reply>::descriptor().is_error_shaped());
}

#[test]
fn output_arity_follows_return_type() {
    assert_eq!(<() as Outputs>::descriptors().len(), 0);
    assert_eq!(<String as Outputs>::descriptors().len(), 1);
    assert_eq!(<Result<String, MethodError> as Outputs>::descriptors().len(), 2);
    assert_eq!(<(String, Option<MethodError>) as Outputs>::descriptors().len(), 2);
    assert_eq!(<(String, u8, bool) as Outputs>::descriptors().len(), 3);
}

#[test]
fn non_empty_error_output_discards_reply() {
    let outcome = (String::from("ignored"), Some(MethodError::new("denied"))).into_outcome();
    let failure = outcome.expect_err("error output must win");
    assert_eq!(failure.kind(), FailureKind::Method);
    assert_eq!(failure.message(), "denied");
}

#[test]
fn empty_error_output_keeps_reply() {
    let outcome = (String::from("ok"), None::<MethodError>).into_outcome();
    assert_eq!(outcome.expect("success"), Some(json!("ok")));
}

#[test]
fn result_error_becomes_method_failure() {
    let outcome: Outcome = Err::<u8, _>(MethodError::new("nope")).into_outcome();
    assert_eq!(outcome.expect_err("failure").message(), "nope");
}

#[test]
fn absent_reply_encodes_to_nothing() {
    assert_eq!(None::<u8>.into_outcome().expect("success"), None);
}

#[test]
fn internal_error_output_exposes_external_message_only() {
    let outcome: Outcome =
        Err::<u8, _>(InternalError::new("row 9 corrupt", "ERR_STATE")).into_outcome();
    assert_eq!(outcome.expect_err("failure").message(), "ERR_STATE");
}

#[test]
fn user_types_decode_and_encode() {
    let point = <Point as Param>::decode(&raw(r#"{"x":1,"y":-2}"#)).expect("decode point");
    assert_eq!(point, Point { x: 1, y: -2 });
    assert_eq!(
        point.encode().expect("encode"),
        Some(json!({"x": 1, "y": -2}))
    );
}

#[test]
fn optional_params_decode_null_as_none() {
    assert_eq!(<Option<u8> as Param>::decode(&raw("null")).expect("null"), None);
    assert_eq!(<Option<u8> as Param>::decode(&raw("3")).expect("three"), Some(3));
}

#[test]
fn containers_decode_through_element_type() {
    let points =
        <Vec<Point> as Param>::decode(&raw(r#"[{"x":0,"y":0},{"x":1,"y":1}]"#)).expect("points");
    assert_eq!(points.len(), 2);

    let balances =
        <BTreeMap<String, u64> as Param>::decode(&raw(r#"{"alice":3}"#)).expect("balances");
    assert_eq!(balances.get("alice"), Some(&3));

    assert!(<Vec<u8> as Param>::decode(&raw(r#"["a"]"#)).is_err());
}

#[test]
fn method_descriptor_counts_leading_context_params() {
    let descriptor = MethodDescriptor::new(
        "Hello".into(),
        vec![
            TypeDescriptor::context("Context"),
            TypeDescriptor::primitive("String"),
        ],
        TypeDescriptor::primitive("String"),
        None,
    );
    assert_eq!(descriptor.context_params(), 1);
    assert!(!descriptor.has_error_return());
}
