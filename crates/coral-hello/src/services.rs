//! Services exposed by the hello host.

use std::panic;

use coral_rpc::{
    Context, InternalError, MemoryContext, MethodError, RegistrationError, Registry,
    ServiceBuilder, raise,
};

const COUNTER_TYPE: &str = "Counter";
const COUNTER_APP: &str = "counter";

/// The classic greeting service.
pub(crate) struct MyService;

#[expect(
    clippy::needless_pass_by_value,
    reason = "dispatch binds every argument by value"
)]
#[expect(clippy::unused_self, reason = "services keep their state in the context")]
impl MyService {
    fn say_hello(&self, _ctx: Context, name: String) -> String {
        format!("hello {name}")
    }

    fn whoami(&self, ctx: Context) -> Result<String, MethodError> {
        memory(&ctx).map(|memory| memory.address().to_owned())
    }
}

/// Named counters kept in the context's state.
pub(crate) struct Counter;

#[expect(
    clippy::needless_pass_by_value,
    reason = "dispatch binds every argument by value"
)]
#[expect(clippy::unused_self, reason = "services keep their state in the context")]
impl Counter {
    fn add(&self, ctx: Context, name: String, by: u64) -> Result<u64, MethodError> {
        let memory = memory(&ctx)?;
        let key = counter_key(memory, &name)?;
        let current = read_counter(memory, &key)?;
        let Some(next) = current.checked_add(by) else {
            panic::panic_any(InternalError::new(
                format!("counter {name} overflowed at {current} + {by}"),
                "ERR_COUNTER_OVERFLOW",
            ))
        };
        memory.put_state(key, next.to_string());
        memory.create_event(COUNTER_APP, "Added", name)?;
        Ok(next)
    }

    fn get(&self, ctx: Context, name: String) -> Result<u64, MethodError> {
        let memory = memory(&ctx)?;
        read_counter(memory, &counter_key(memory, &name)?)
    }

    fn reset(&self, ctx: Context, name: String) -> Result<u64, MethodError> {
        let memory = memory(&ctx)?;
        let key = counter_key(memory, &name)?;
        let previous = read_counter(memory, &key)?;
        if memory.del_state(&key).is_none() {
            raise(format!("counter {name} does not exist"));
        }
        Ok(previous)
    }

    fn names(&self, ctx: Context) -> Result<Vec<String>, MethodError> {
        let memory = memory(&ctx)?;
        let keys = memory.state_keys_by_partial_key::<&str>(COUNTER_TYPE, &[])?;
        Ok(keys
            .iter()
            .filter_map(|key| memory.split_composite_key(key).1.into_iter().next())
            .collect())
    }
}

fn memory(ctx: &Context) -> Result<&MemoryContext, MethodError> {
    ctx.downcast_ref::<MemoryContext>()
        .ok_or_else(|| MethodError::new("no in-memory context attached"))
}

fn counter_key(memory: &MemoryContext, name: &str) -> Result<String, MethodError> {
    memory
        .create_composite_key(COUNTER_TYPE, &[name])
        .map_err(MethodError::from)
}

fn read_counter(memory: &MemoryContext, key: &str) -> Result<u64, MethodError> {
    memory.get_state(key).map_or(Ok(0), |bytes| {
        String::from_utf8(bytes)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| MethodError::new(format!("state under {key} is not a counter")))
    })
}

/// Registers every hello service.
pub(crate) fn register_all(registry: &Registry) -> Result<(), RegistrationError> {
    registry.register(
        ServiceBuilder::new(MyService)
            .method("SayHello", MyService::say_hello)
            .method("WhoAmI", MyService::whoami),
    )?;
    registry.register(
        ServiceBuilder::new(Counter)
            .method("Add", Counter::add)
            .method("Get", Counter::get)
            .method("Reset", Counter::reset)
            .method("Names", Counter::names),
    )
}
