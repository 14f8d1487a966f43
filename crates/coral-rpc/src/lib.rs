//! Named-request dispatch for typed service methods.
//!
//! The `coral-rpc` crate routes requests of the form
//! `{"func_name": "Service.Method", "params": [...]}` to methods registered
//! on ordinary Rust values. Registration validates each method's signature
//! against a fixed calling convention; dispatch decodes the positional
//! parameters into the declared types, invokes the method inside a recovery
//! boundary, and returns either the encoded reply or a single caller-safe
//! failure message.
//!
//! # Architecture
//!
//! - [`ServiceBuilder`] collects a receiver's methods. Their parameter and
//!   output types are described by the [`Param`], [`Reply`] and [`Outputs`]
//!   traits, so every signature is plain data ([`MethodSignature`]).
//! - [`Registry`] validates the signatures and publishes an immutable
//!   [`Service`] under its name.
//! - [`Dispatcher`] resolves `"Service.Method"`, checks the parameter count,
//!   binds caller-injected [`BaseParam`]s and decoded wire values, and calls
//!   the method through [`recover::guard`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use coral_rpc::{Context, Dispatcher, MemoryContext, Registry, Request, Response, ServiceBuilder};
//!
//! struct MyService;
//!
//! impl MyService {
//!     fn say_hello(&self, _ctx: Context, name: String) -> String {
//!         format!("hello {name}")
//!     }
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register(ServiceBuilder::new(MyService).method("SayHello", MyService::say_hello))
//!     .expect("registration succeeds");
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! let request = Request::new("MyService.SayHello").with_param("coral").expect("encode");
//! let context = Context::new(MemoryContext::new("0x01"));
//! let response = dispatcher.handle(&request, vec![context.into()]);
//! assert_eq!(response, Response::success(Some("hello coral".into())));
//! ```

pub mod config;
pub mod context;
pub mod decode;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod recover;
pub mod registry;
pub mod request;
pub mod response;
pub mod service;
pub mod telemetry;
pub mod validate;

#[cfg(test)]
mod tests;

pub use serde_json::Error as EncodeError;
pub use serde_json::Value;
pub use serde_json::value::RawValue;

pub use self::config::{DispatchConfig, LogFormat, RegistrationPolicy};
pub use self::context::{BaseParam, Context, MemoryContext};
pub use self::descriptor::{
    MethodDescriptor, MethodSignature, Outcome, Outputs, Param, Reply, TypeDescriptor, TypeShape,
};
pub use self::dispatch::Dispatcher;
pub use self::error::{
    ContextError, DecodeError, DispatchError, Failure, FailureKind, InternalError, MethodError, NoMethodsHint,
    RegistrationError, RequestError,
};
pub use self::recover::raise;
pub use self::registry::Registry;
pub use self::request::Request;
pub use self::response::{InvocationResult, Response};
pub use self::service::{Method, MethodEntry, Service, ServiceBuilder};
