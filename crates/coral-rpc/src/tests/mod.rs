//! Crate-level integration and BDD tests.

use std::sync::Arc;

use crate::context::{BaseParam, Context, MemoryContext};
use crate::dispatch::Dispatcher;
use crate::registry::Registry;
use crate::request::Request;
use crate::service::ServiceBuilder;


/// Ledger service used by the crate-level tests.
struct Ledger;

#[expect(clippy::unused_self, reason = "test services keep no state")]
impl Ledger {
    fn put(&self, ctx: Context, key: String, value: String) -> bool {
        ctx.downcast_ref::<MemoryContext>().is_some_and(|memory| {
            memory.put_state(key, value.into_bytes());
            true
        })
    }

    fn get(&self, ctx: Context, key: String) -> Option<String> {
        ctx.downcast_ref::<MemoryContext>()
            .and_then(|memory| memory.get_state(&key))
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }
}

fn ledger_dispatcher() -> Dispatcher {
    let registry = Registry::new();
    registry
        .register(
            ServiceBuilder::new(Ledger)
                .method("Put", Ledger::put)
                .method("Get", Ledger::get),
        )
        .expect("register ledger");
    Dispatcher::new(Arc::new(registry))
}

#[test]
fn shared_context_threads_state_between_calls() {
    let dispatcher = ledger_dispatcher();
    let memory = Arc::new(MemoryContext::new("0xbeef"));
    let base = || vec![BaseParam::from(Context::from_arc(Arc::clone(&memory)))];

    let put = Request::new("Ledger.Put")
        .with_param("colour")
        .and_then(|request| request.with_param("teal"))
        .expect("encode put");
    assert!(dispatcher.dispatch(&put, base()).is_success());

    let get = Request::new("Ledger.Get")
        .with_param("colour")
        .expect("encode get");
    let result = dispatcher.dispatch(&get, base());
    assert_eq!(result.value(), Some(&serde_json::json!("teal")));
    assert_eq!(memory.get_state("colour"), Some(b"teal".to_vec()));
}

#[test]
fn missing_key_is_an_absent_reply() {
    let dispatcher = ledger_dispatcher();
    let get = Request::new("Ledger.Get")
        .with_param("nothing")
        .expect("encode get");
    let base = vec![BaseParam::from(Context::new(MemoryContext::new("0x01")))];
    let response = dispatcher.handle(&get, base);
    assert!(response.is_success());
    assert!(response.payload_bytes().expect("bytes").is_empty());
}
