//! Unit tests for method introspection and service invocation.

use serde_json::json;

use super::*;
use crate::context::{BaseParam, Context};
use crate::error::MethodError;

struct Counter {
    start: u64,
}

impl Counter {
    fn add(&self, _ctx: Context, by: u64) -> u64 {
        self.start + by
    }

    #[expect(clippy::unused_self, reason = "failure does not depend on the start")]
    fn fail(&self, reason: String) -> Result<u64, MethodError> {
        Err(MethodError::new(reason))
    }

    #[expect(clippy::unused_self, reason = "exercises a method with no outputs")]
    fn nothing(&self) {}
}

fn wire(text: &str) -> Vec<String> {
    vec![text.to_owned()]
}

fn builder() -> ServiceBuilder<Counter> {
    ServiceBuilder::new(Counter { start: 40 })
        .method("Add", Counter::add)
        .method("Fail", Counter::fail)
        .method("nothing", Counter::nothing)
}

#[test]
fn builder_reports_receiver_type_name() {
    assert_eq!(builder().type_name(), "Counter");
}

#[test]
fn signatures_describe_params_and_outputs() {
    let builder = builder();
    let signatures = builder.signatures();
    let add = signatures.first().expect("add signature");
    assert_eq!(add.name(), "Add");
    let params: Vec<&str> = add.params().iter().map(TypeDescriptor::name).collect();
    assert_eq!(params, ["Context", "u64"]);
    assert_eq!(add.outputs().len(), 1);

    let fail = signatures.get(1).expect("fail signature");
    assert_eq!(fail.outputs().len(), 2);
    let nothing = signatures.get(2).expect("nothing signature");
    assert!(nothing.outputs().is_empty());
}

#[test]
fn invoker_binds_base_then_wire_arguments() {
    let (receiver, candidates) = builder().into_parts();
    let add = candidates.first().expect("add candidate");
    let wire = wire("2");
    let mut args = Arguments::new(vec![BaseParam::from(Context::new(()))], &wire);

    let outcome = (add.invoker)(receiver.as_ref(), &mut args).expect("bound");
    assert_eq!(outcome.expect("success"), Some(json!(42)));
}

#[test]
fn invoker_stops_at_first_binding_error() {
    let (receiver, candidates) = builder().into_parts();
    let add = candidates.first().expect("add candidate");
    let wire = wire("\"two\"");
    let mut args = Arguments::new(vec![BaseParam::from(Context::new(()))], &wire);

    let error = (add.invoker)(receiver.as_ref(), &mut args).expect_err("decode fails");
    assert!(matches!(error, DispatchError::Convert { .. }));
}

#[test]
fn method_error_becomes_failed_outcome() {
    let (receiver, candidates) = builder().into_parts();
    let fail = candidates.get(1).expect("fail candidate");
    let wire = wire("\"denied\"");
    let mut args = Arguments::new(Vec::new(), &wire);

    let outcome = (fail.invoker)(receiver.as_ref(), &mut args).expect("bound");
    assert_eq!(outcome.expect_err("failure").message(), "denied");
}

#[test]
fn foreign_receiver_is_an_internal_error() {
    let (_, candidates) = builder().into_parts();
    let add = candidates.first().expect("add candidate");
    let mut args = Arguments::new(Vec::new(), &[]);

    let error = (add.invoker)(&"not a counter", &mut args).expect_err("wrong receiver");
    assert!(matches!(error, DispatchError::Internal { .. }));
}
