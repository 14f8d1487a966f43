//! Caller-injected values.
//!
//! A host adapter hands the dispatcher zero or more [`BaseParam`]s per
//! request. They bind, in order, to the leading declared parameters of the
//! invoked method and never travel on the wire. The usual base parameter is
//! a [`Context`]: an opaque handle to the host's execution environment that
//! the dispatcher passes through without inspecting.

pub mod keys;
mod memory;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::value::RawValue;

use crate::descriptor::{Param, TypeDescriptor};
use crate::error::DecodeError;

pub use self::memory::{MEMORY_CHANNEL_ID, MemoryContext};

/// Type-erased value supplied by the caller of a dispatch.
pub struct BaseParam(Box<dyn Any + Send>);

impl BaseParam {
    /// Wraps a value.
    #[must_use]
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Unwraps the value when it has type `T`.
    ///
    /// # Errors
    ///
    /// Returns the parameter unchanged when it holds another type.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        self.0.downcast::<T>().map(|value| *value).map_err(Self)
    }
}

impl fmt::Debug for BaseParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseParam").finish_non_exhaustive()
    }
}

impl From<Context> for BaseParam {
    fn from(context: Context) -> Self {
        Self::new(context)
    }
}

/// Opaque handle to the host execution environment.
///
/// Methods declare a leading `Context` parameter to receive it; the
/// dispatcher never looks inside.
///
/// # Example
///
/// ```
/// use coral_rpc::{Context, MemoryContext};
///
/// let context = Context::new(MemoryContext::new("0xabc"));
/// let memory = context.downcast_ref::<MemoryContext>().unwrap();
/// assert_eq!(memory.address(), "0xabc");
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<dyn Any + Send + Sync>,
}

impl Context {
    /// Wraps a host handle.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wraps a shared host handle.
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(inner: Arc<T>) -> Self {
        Self { inner }
    }

    /// Borrows the handle as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

impl Param for Context {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::context("Context")
    }

    fn decode(_raw: &RawValue) -> Result<Self, DecodeError> {
        Err(DecodeError::not_wire_type("Context"))
    }
}

#[cfg(test)]
mod tests;
