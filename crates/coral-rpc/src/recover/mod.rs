//! Failure normalizer.
//!
//! Every invocation runs inside [`guard`], a `catch_unwind` boundary that
//! turns a panic into a [`Failure`]. Payloads are classified in a fixed
//! order:
//!
//! 1. [`InternalError`]: the external message is returned, the internal one
//!    is logged.
//! 2. [`Raised`] (see [`raise`]): the text is returned verbatim.
//! 3. Bare `&str` or `String` payloads, which is what the runtime produces
//!    for faults such as out-of-bounds indexing or arithmetic overflow: the
//!    caller only sees [`RUNTIME_ERROR_MESSAGE`]; message, location and
//!    backtrace go to the log.
//! 4. [`MethodError`] or `Box<dyn Error + Send + Sync>`: the error's message.
//! 5. Anything else: an unclassified failure naming the payload's type id.
//!
//! A process-wide panic hook is installed on first use. It chains the
//! previous hook and only intercepts panics raised on a thread that is
//! currently inside a boundary, where it records the location and a
//! backtrace for the log instead of printing them.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};

use once_cell::sync::OnceCell;
use tracing::error;

use crate::descriptor::Outcome;
use crate::error::{Failure, FailureKind, InternalError, MethodError};

/// Tracing target for recovered failures.
pub const RECOVER_TARGET: &str = module_path!();

/// Message returned to callers when a method hits a runtime fault.
pub const RUNTIME_ERROR_MESSAGE: &str = "runtime error";

static HOOK: OnceCell<()> = OnceCell::new();

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
    static FORCE_BACKTRACE: Cell<bool> = const { Cell::new(true) };
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

/// Panic payload carrying a plain text failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raised(String);

impl Raised {
    /// Returns the failure text.
    #[must_use]
    pub fn message(&self) -> &str {
        self.0.as_str()
    }
}

/// Aborts the current method with a plain text failure.
///
/// Inside a dispatch the caller receives `message` verbatim.
///
/// # Panics
///
/// Always; the panic is caught by the dispatch boundary.
///
/// # Example
///
/// ```
/// use coral_rpc::recover::{guard, raise};
///
/// let outcome = guard("Bank.Withdraw", true, || raise("insufficient funds"));
/// assert_eq!(outcome.unwrap_err().message(), "insufficient funds");
/// ```
pub fn raise(message: impl Into<String>) -> ! {
    panic::panic_any(Raised(message.into()))
}

#[derive(Debug)]
struct PanicReport {
    location: Option<String>,
    backtrace: String,
}

struct Boundary {
    previous_force: bool,
}

impl Boundary {
    fn enter(force_backtrace: bool) -> Self {
        install_hook();
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        let previous_force = FORCE_BACKTRACE.with(|force| force.replace(force_backtrace));
        Self { previous_force }
    }
}

impl Drop for Boundary {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
        FORCE_BACKTRACE.with(|force| force.set(self.previous_force));
    }
}

fn install_hook() {
    HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }
            let backtrace = if FORCE_BACKTRACE.with(Cell::get) {
                Backtrace::force_capture()
            } else {
                Backtrace::capture()
            };
            let report = PanicReport {
                location: info.location().map(ToString::to_string),
                backtrace: backtrace.to_string(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(report));
        }));
    });
}

/// Runs `call` inside a recovery boundary.
///
/// `method` names the invocation in logs. With `force_backtrace` set, a
/// backtrace is captured for every recovered panic; otherwise capture follows
/// `RUST_BACKTRACE`.
pub fn guard<F>(method: &str, force_backtrace: bool, call: F) -> Outcome
where
    F: FnOnce() -> Outcome,
{
    let result = {
        let _boundary = Boundary::enter(force_backtrace);
        panic::catch_unwind(AssertUnwindSafe(call))
    };
    result.unwrap_or_else(|payload| {
        let report = LAST_PANIC.with(|slot| slot.borrow_mut().take());
        Err(classify(method, payload, report))
    })
}

fn classify(method: &str, payload: Box<dyn Any + Send>, report: Option<PanicReport>) -> Failure {
    let payload = match payload.downcast::<InternalError>() {
        Ok(internal) => {
            error!(
                target: RECOVER_TARGET,
                method,
                internal = internal.internal(),
                external = internal.external(),
                "method raised an internal error"
            );
            return Failure::new(FailureKind::Internal, internal.external());
        }
        Err(payload) => payload,
    };

    let payload = match payload.downcast::<Raised>() {
        Ok(raised) => return Failure::new(FailureKind::Raised, raised.0),
        Err(payload) => payload,
    };

    if let Some(text) = panic_text(payload.as_ref()) {
        let (location, backtrace) = report
            .map(|report| (report.location, report.backtrace))
            .unwrap_or_default();
        error!(
            target: RECOVER_TARGET,
            method,
            panic = text,
            location = location.as_deref().unwrap_or("unknown"),
            backtrace = %backtrace,
            "method hit a runtime fault"
        );
        return Failure::new(FailureKind::Runtime, RUNTIME_ERROR_MESSAGE);
    }

    if let Some(method_error) = payload.downcast_ref::<MethodError>() {
        return Failure::new(FailureKind::Error, method_error.message());
    }

    if let Some(boxed) = payload.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return Failure::new(FailureKind::Error, boxed.to_string());
    }

    let message = format!(
        "unclassified failure: type {:?}, value: <opaque>",
        (*payload).type_id()
    );
    error!(target: RECOVER_TARGET, method, failure = %message, "method raised an unrecognised value");
    Failure::new(FailureKind::Unclassified, message)
}

fn panic_text(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
