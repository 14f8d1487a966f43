//! Request dispatch.
//!
//! The [`Dispatcher`] resolves `"Service.Method"` through two table lookups,
//! checks the parameter count against the method's declared parameters minus
//! the caller's base parameters, then binds and invokes the method inside the
//! recovery boundary. It keeps no state between calls; the registry handle is
//! shared and only read.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::context::BaseParam;
use crate::decode::Arguments;
use crate::descriptor::Outcome;
use crate::error::{DispatchError, Failure};
use crate::recover;
use crate::registry::Registry;
use crate::request::Request;
use crate::response::{InvocationResult, Response};
use crate::service::Service;

/// Tracing target for dispatch operations.
pub const DISPATCH_TARGET: &str = module_path!();

/// Routes requests to registered methods.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use coral_rpc::{Context, Dispatcher, MemoryContext, Registry, Request, ServiceBuilder};
///
/// struct Greeter;
///
/// impl Greeter {
///     fn hello(&self, _ctx: Context, name: String) -> String {
///         format!("Hello {name}")
///     }
/// }
///
/// let registry = Registry::new();
/// registry
///     .register(ServiceBuilder::new(Greeter).method("Hello", Greeter::hello))
///     .unwrap();
/// let dispatcher = Dispatcher::new(Arc::new(registry));
///
/// let request = Request::parse(br#"{"func_name":"Greeter.Hello","params":["\"World\""]}"#)
///     .unwrap();
/// let context = Context::new(MemoryContext::new("0x01"));
/// let result = dispatcher.dispatch(&request, vec![context.into()]);
/// assert_eq!(result.value(), Some(&serde_json::json!("Hello World")));
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    /// Creates a dispatcher with an explicit configuration.
    #[must_use]
    pub const fn with_config(registry: Arc<Registry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    /// Returns the registry requests are resolved against.
    #[must_use]
    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatches one request.
    ///
    /// `base` holds caller-injected values bound, in order, to the method's
    /// leading parameters. Every failure, including a panic inside the
    /// method, comes back as [`InvocationResult::Failure`].
    #[must_use]
    pub fn dispatch(&self, request: &Request, base: Vec<BaseParam>) -> InvocationResult {
        InvocationResult::from(self.invoke(request, base))
    }

    /// Dispatches one request and shapes the result as a [`Response`],
    /// logging the outcome and elapsed time.
    #[must_use]
    pub fn handle(&self, request: &Request, base: Vec<BaseParam>) -> Response {
        let started = Instant::now();
        let result = self.dispatch(request, base);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let method = request.service_method();
        match result.failure() {
            None => info!(target: DISPATCH_TARGET, method, elapsed_ms, "request handled"),
            Some(failure) => warn!(
                target: DISPATCH_TARGET,
                method,
                kind = %failure.kind(),
                error = failure.message(),
                elapsed_ms,
                "request failed"
            ),
        }
        Response::from(result)
    }

    /// Parses one request line and handles it.
    ///
    /// A line that is not a valid request yields an error response.
    #[must_use]
    pub fn handle_line(&self, line: &[u8], base: Vec<BaseParam>) -> Response {
        match Request::parse(line) {
            Ok(request) => self.handle(&request, base),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejected request line");
                Response::error(error.to_string())
            }
        }
    }

    fn invoke(&self, request: &Request, base: Vec<BaseParam>) -> Outcome {
        let path = request.service_method();
        let (service, method) = self.resolve(path)?;
        let entry = service
            .method(method)
            .ok_or_else(|| DispatchError::unknown_method(service.name(), method))?;

        let declared = entry.descriptor().params().len();
        let need = declared
            .checked_sub(base.len())
            .ok_or_else(|| DispatchError::TooManyBaseParams {
                path: path.to_owned(),
                supplied: base.len(),
                declared,
            })?;
        let got = request.params().len();
        if got != need {
            return Err(DispatchError::ArityMismatch { got, need }.into());
        }

        debug!(
            target: DISPATCH_TARGET,
            method = path,
            base = base.len(),
            wire = got,
            "invoking method"
        );
        let mut args = Arguments::new(base, request.params());
        recover::guard(path, self.config.capture_backtraces(), || {
            match service.invoke(entry, &mut args) {
                Ok(outcome) => outcome,
                Err(error) => Err(Failure::from(error)),
            }
        })
    }

    fn resolve<'p>(&self, path: &'p str) -> Result<(Arc<Service>, &'p str), DispatchError> {
        let (service, method) = path
            .rsplit_once('.')
            .ok_or_else(|| DispatchError::malformed_path(path))?;
        let found = self
            .registry
            .lookup(service)
            .ok_or_else(|| DispatchError::unknown_service(service))?;
        Ok((found, method))
    }
}
