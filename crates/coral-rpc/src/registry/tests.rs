//! Unit tests for the service registry.

use std::sync::Barrier;
use std::thread;

use rstest::{fixture, rstest};

use super::*;
use crate::context::Context;

struct Greeter;

#[expect(clippy::unused_self, reason = "test services keep no state")]
impl Greeter {
    fn hello(&self, _ctx: Context, name: String) -> String {
        format!("Hello {name}")
    }
}

struct Bank;

#[expect(clippy::unused_self, reason = "test services keep no state")]
impl Bank {
    fn balance(&self, account: String) -> u64 {
        account.len() as u64
    }
}

#[expect(non_camel_case_types, reason = "exercises the exported-name rule")]
struct vault;

#[expect(clippy::unused_self, reason = "test services keep no state")]
impl vault {
    fn open(&self) -> bool {
        true
    }
}

fn greeter() -> ServiceBuilder<Greeter> {
    ServiceBuilder::new(Greeter).method("Hello", Greeter::hello)
}

#[fixture]
fn populated_registry() -> Registry {
    let registry = Registry::new();
    registry.register(greeter()).expect("register greeter");
    registry
        .register(ServiceBuilder::new(Bank).method("Balance", Bank::balance))
        .expect("register bank");
    registry
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn new_registry_is_empty_and_strict() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert_eq!(registry.policy(), RegistrationPolicy::Strict);
}

#[test]
fn from_config_takes_policy() {
    let config = DispatchConfig::default().with_registration_policy(RegistrationPolicy::Lenient);
    assert_eq!(
        Registry::from_config(&config).policy(),
        RegistrationPolicy::Lenient
    );
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[rstest]
fn register_uses_type_name(populated_registry: Registry) {
    assert_eq!(populated_registry.service_names(), ["Bank", "Greeter"]);
    let service = populated_registry.lookup("Greeter").expect("greeter");
    assert_eq!(service.type_name(), "Greeter");
    assert_eq!(service.method_names(), ["Hello"]);
}

#[rstest]
fn duplicate_name_is_rejected_and_first_survives(populated_registry: Registry) {
    let error = populated_registry
        .register_name("Greeter", ServiceBuilder::new(Bank).method("Balance", Bank::balance))
        .expect_err("duplicate should fail");
    assert!(matches!(error, RegistrationError::DuplicateService { .. }));
    assert_eq!(error.to_string(), "rpc: service already defined: Greeter");

    let service = populated_registry.lookup("Greeter").expect("greeter");
    assert!(service.method("Hello").is_some());
    assert!(service.method("Balance").is_none());
}

#[test]
fn unexported_type_name_is_rejected() {
    let registry = Registry::new();
    let error = registry
        .register(ServiceBuilder::new(vault).method("Open", vault::open))
        .expect_err("unexported type");
    assert!(matches!(error, RegistrationError::UnexportedService { .. }));
}

#[test]
fn tuple_receiver_is_not_named_after_its_last_element() {
    let registry = Registry::new();
    let error = registry
        .register(ServiceBuilder::new((Greeter, Bank)))
        .expect_err("tuple receiver");
    let RegistrationError::UnexportedService { name } = error else {
        panic!("expected an unexported service, got {error:?}");
    };
    assert!(name.starts_with('('), "{name}");
    assert!(registry.lookup("Bank)").is_none());
}

#[test]
fn explicit_name_bypasses_export_check() {
    let registry = Registry::new();
    registry
        .register_name("vault", ServiceBuilder::new(vault).method("Open", vault::open))
        .expect("explicit name");
    assert!(registry.lookup("vault").is_some());
}

#[test]
fn empty_explicit_name_is_rejected() {
    let registry = Registry::new();
    let error = registry
        .register_name("", greeter())
        .expect_err("empty name");
    assert!(matches!(error, RegistrationError::MissingName { .. }));
    assert!(registry.is_empty());
}

#[test]
fn failed_validation_publishes_nothing() {
    let registry = Registry::new();
    let error = registry
        .register(ServiceBuilder::new(Greeter).method("hello", Greeter::hello))
        .expect_err("nothing exported");
    assert!(matches!(error, RegistrationError::NoSuitableMethods { .. }));
    assert!(registry.lookup("Greeter").is_none());
}

#[test]
fn concurrent_registrations_of_one_name_admit_exactly_one() {
    const THREADS: usize = 8;
    let registry = Arc::new(Registry::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.register(greeter()).is_ok()
            })
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().expect("registration thread"))
        .filter(|admitted| *admitted)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(registry.len(), 1);
}
