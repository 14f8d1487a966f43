//! Domain errors raised while registering services and dispatching requests.
//!
//! Registration failures surface once, at startup, as [`RegistrationError`].
//! Per-request failures surface as [`DispatchError`] and are folded into the
//! uniform [`Failure`] value returned to callers, tagged with a
//! [`FailureKind`] so adapters can tell lookup problems from method failures
//! without parsing messages.

use std::fmt;

use thiserror::Error;

/// Reason attached to [`RegistrationError::NoSuitableMethods`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMethodsHint {
    /// Methods were declared, but every one of them was skipped because its
    /// name is not part of the exported dispatch surface.
    Unexported,
    /// Nothing registrable was declared at all.
    NoneSuitable,
}

impl fmt::Display for NoMethodsHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unexported => f.write_str(
                " (hint: methods are declared but none is exported; \
                 dispatch names must start with an uppercase letter)",
            ),
            Self::NoneSuitable => Ok(()),
        }
    }
}

/// Errors raised when a service is published to the registry.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The resolved service name is empty.
    #[error("rpc.Register: no service name for type {type_name}")]
    MissingName {
        /// Rust type name of the receiver.
        type_name: String,
    },

    /// The default service name is not exported.
    #[error("rpc.Register: type {name} is not exported")]
    UnexportedService {
        /// Name derived from the receiver type.
        name: String,
    },

    /// A declared parameter type is neither exported nor built in.
    #[error("rpc.Register: argument type of method {method:?} is not exported: {type_name:?}")]
    UnexportedArgument {
        /// Method being validated.
        method: String,
        /// Offending parameter type.
        type_name: String,
    },

    /// A declared return type is neither exported nor built in.
    #[error("rpc.Register: return type of method {method:?} is not exported: {type_name:?}")]
    UnexportedReturn {
        /// Method being validated.
        method: String,
        /// Offending return type.
        type_name: String,
    },

    /// The second output of a two-output method is not error-shaped.
    #[error("rpc.Register: last reply type of method {method:?} is not an error type: {type_name:?}")]
    NonErrorReturn {
        /// Method being validated.
        method: String,
        /// Type found in the error position.
        type_name: String,
    },

    /// The method does not have exactly one or two outputs.
    #[error("rpc.Register: method {method:?} has {count} output parameters; needs exactly one or two")]
    OutputArity {
        /// Method being validated.
        method: String,
        /// Number of declared outputs.
        count: usize,
    },

    /// A context parameter follows a wire parameter, so base parameters
    /// could not be bound as a prefix.
    #[error(
        "rpc.Register: method {method:?} declares context parameter {type_name:?} \
         at position {position}, after a wire parameter"
    )]
    ContextAfterWire {
        /// Method being validated.
        method: String,
        /// Context type found out of place.
        type_name: String,
        /// Zero-based parameter position.
        position: usize,
    },

    /// The same method name was declared twice on one service.
    #[error("rpc.Register: method {method:?} declared twice on type {service}")]
    DuplicateMethod {
        /// Service being registered.
        service: String,
        /// Repeated method name.
        method: String,
    },

    /// Validation left the service without callable methods.
    #[error("rpc.Register: type {name} has no exported methods of suitable type{hint}")]
    NoSuitableMethods {
        /// Service being registered.
        name: String,
        /// Diagnostic hint.
        hint: NoMethodsHint,
        /// Last rejection seen while validating, if any.
        #[source]
        cause: Option<Box<RegistrationError>>,
    },

    /// A service with the same name is already registered.
    #[error("rpc: service already defined: {name}")]
    DuplicateService {
        /// Name that collided.
        name: String,
    },
}

impl RegistrationError {
    /// Creates a duplicate service error.
    #[must_use]
    pub fn duplicate_service(name: impl Into<String>) -> Self {
        Self::DuplicateService { name: name.into() }
    }

    /// Returns the offending method name when the error concerns one method.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::UnexportedArgument { method, .. }
            | Self::UnexportedReturn { method, .. }
            | Self::NonErrorReturn { method, .. }
            | Self::OutputArity { method, .. }
            | Self::ContextAfterWire { method, .. }
            | Self::DuplicateMethod { method, .. } => Some(method.as_str()),
            Self::MissingName { .. }
            | Self::UnexportedService { .. }
            | Self::NoSuitableMethods { .. }
            | Self::DuplicateService { .. } => None,
        }
    }
}

/// Failure to turn one encoded parameter into its target type.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The encoded text is malformed or does not match the target shape.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The target type is only ever injected by the caller.
    #[error("{type_name} is not carried on the wire")]
    NotWireType {
        /// Target type name.
        type_name: String,
    },
}

impl DecodeError {
    /// Creates an error for a type that refuses wire decoding.
    #[must_use]
    pub fn not_wire_type(type_name: impl Into<String>) -> Self {
        Self::NotWireType {
            type_name: type_name.into(),
        }
    }
}

/// Errors raised by execution-context helpers.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A composite key part contains a reserved code point.
    #[error(
        "input contains {code_point:?} at byte {position}; U+0000 and U+10FFFF are not allowed in composite key parts"
    )]
    InvalidCodePoint {
        /// The offending code point.
        code_point: char,
        /// Byte offset within the part.
        position: usize,
    },

    /// A plain key part contains the key separator.
    #[error("key part {part:?} contains the separator '/'")]
    Delimiter {
        /// The offending part.
        part: String,
    },

    /// The key does not have the composite layout.
    #[error("{key:?} is not a composite key")]
    NotComposite {
        /// The key that failed to split.
        key: String,
    },

    /// An event name part is empty or the application name contains `.`.
    #[error("invalid event name parts: app {app:?}, event {event:?}")]
    EventName {
        /// Application part.
        app: String,
        /// Event part.
        event: String,
    },

    /// The transaction timestamp could not be rendered.
    #[error("failed to format transaction timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Errors raised while parsing a wire request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request line was empty.
    #[error("malformed request: empty request line")]
    Empty,

    /// The request line is not a valid request document.
    #[error("malformed request: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A client-side parameter could not be encoded.
    #[error("failed to encode request parameter: {0}")]
    EncodeParam(#[source] serde_json::Error),
}

/// Errors raised while resolving, binding, or invoking a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The method path has no `Service.Method` separator.
    #[error("rpc: service/method request ill-formed: {path}")]
    MalformedPath {
        /// Raw method path.
        path: String,
    },

    /// No service is registered under the requested name.
    #[error("rpc: can't find service {service}")]
    UnknownService {
        /// Requested service name.
        service: String,
    },

    /// The service exists but has no such method.
    #[error("rpc: can't find method {method} in service {service}")]
    UnknownMethod {
        /// Resolved service name.
        service: String,
        /// Requested method name.
        method: String,
    },

    /// The request carries the wrong number of parameters.
    #[error("rpc: params not matched. got {got}, need {need}")]
    ArityMismatch {
        /// Parameters present on the request.
        got: usize,
        /// Parameters the method needs after base parameters.
        need: usize,
    },

    /// More base parameters were supplied than the method declares.
    #[error("rpc: {supplied} base params supplied but method {path} declares {declared} params")]
    TooManyBaseParams {
        /// Method path being dispatched.
        path: String,
        /// Base parameters supplied by the caller.
        supplied: usize,
        /// Parameters declared by the method.
        declared: usize,
    },

    /// A base parameter does not have the declared type.
    #[error("rpc: base param {index} does not match declared type {expected}")]
    BaseParamMismatch {
        /// Zero-based parameter position.
        index: usize,
        /// Declared type name.
        expected: String,
    },

    /// A wire parameter could not be converted to its target type.
    #[error("rpc: convert param failed. expect {expected}, found={found}, error: {source}")]
    Convert {
        /// Target type name.
        expected: String,
        /// Raw encoded value.
        found: String,
        /// Underlying decode failure.
        #[source]
        source: DecodeError,
    },

    /// Invariant violation inside the dispatcher.
    #[error("rpc: internal error: {message}")]
    Internal {
        /// Description of the violation.
        message: String,
    },
}

impl DispatchError {
    /// Returns the failure category reported to the caller.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedPath { .. } | Self::UnknownService { .. } | Self::UnknownMethod { .. } => {
                FailureKind::Lookup
            }
            Self::ArityMismatch { .. } | Self::TooManyBaseParams { .. } => FailureKind::Arity,
            Self::BaseParamMismatch { .. } => FailureKind::Binding,
            Self::Convert { .. } => FailureKind::Decode,
            Self::Internal { .. } => FailureKind::Internal,
        }
    }

    /// Creates a malformed path error.
    #[must_use]
    pub fn malformed_path(path: impl Into<String>) -> Self {
        Self::MalformedPath { path: path.into() }
    }

    /// Creates an unknown service error.
    #[must_use]
    pub fn unknown_service(service: impl Into<String>) -> Self {
        Self::UnknownService {
            service: service.into(),
        }
    }

    /// Creates an unknown method error.
    #[must_use]
    pub fn unknown_method(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            service: service.into(),
            method: method.into(),
        }
    }

    /// Creates a conversion error for one wire parameter.
    #[must_use]
    pub fn convert(
        expected: impl Into<String>,
        found: impl Into<String>,
        source: DecodeError,
    ) -> Self {
        Self::Convert {
            expected: expected.into(),
            found: found.into(),
            source,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Category of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed path, unknown service or unknown method.
    Lookup,
    /// Parameter count mismatch.
    Arity,
    /// Base parameter of the wrong type.
    Binding,
    /// Wire parameter conversion failure.
    Decode,
    /// The method returned a non-empty error output.
    Method,
    /// The method raised an [`InternalError`], or the dispatcher broke an
    /// invariant.
    Internal,
    /// The method raised a plain text failure.
    Raised,
    /// The method hit an execution fault such as an out-of-bounds access.
    Runtime,
    /// The method raised an error value.
    Error,
    /// The method raised a value of unrecognised shape.
    Unclassified,
    /// The reply could not be encoded.
    Encode,
}

impl FailureKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "lookup",
            Self::Arity => "arity",
            Self::Binding => "binding",
            Self::Decode => "decode",
            Self::Method => "method",
            Self::Internal => "internal",
            Self::Raised => "raised",
            Self::Runtime => "runtime",
            Self::Error => "error",
            Self::Unclassified => "unclassified",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform failure returned to the caller of a dispatch.
///
/// The message is safe to hand to external callers: internal diagnostics are
/// logged, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
}

impl Failure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the external message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl From<DispatchError> for Failure {
    fn from(error: DispatchError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

/// Error value a method returns in its second output.
///
/// # Example
///
/// ```
/// use coral_rpc::MethodError;
///
/// let error = MethodError::new("insufficient balance");
/// assert_eq!(error.to_string(), "insufficient balance");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct MethodError {
    message: String,
}

impl MethodError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl From<ContextError> for MethodError {
    fn from(error: ContextError) -> Self {
        Self::new(error.to_string())
    }
}

/// Error carrying a diagnostic for operators and a separate message that is
/// safe to return to callers.
///
/// Raise it with [`std::panic::panic_any`] or return it as a method's error
/// output; either way only [`InternalError::external`] leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{internal}")]
pub struct InternalError {
    internal: String,
    external: String,
}

impl InternalError {
    /// Creates an internal error.
    #[must_use]
    pub fn new(internal: impl Into<String>, external: impl Into<String>) -> Self {
        Self {
            internal: internal.into(),
            external: external.into(),
        }
    }

    /// Returns the diagnostic kept for local logs.
    #[must_use]
    pub fn internal(&self) -> &str {
        self.internal.as_str()
    }

    /// Returns the message returned to callers.
    #[must_use]
    pub fn external(&self) -> &str {
        self.external.as_str()
    }
}
