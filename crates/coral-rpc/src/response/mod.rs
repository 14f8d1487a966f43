//! Invocation results and the response handed back to adapters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::Outcome;
use crate::error::{Failure, FailureKind};

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The method completed; the reply is absent for methods that produced
    /// nothing.
    Success(Option<Value>),
    /// Lookup, binding or invocation failed.
    Failure(Failure),
}

impl InvocationResult {
    /// Returns `true` for a successful dispatch.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the reply of a successful dispatch.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => value.as_ref(),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure of an unsuccessful dispatch.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Returns the failure category, if the dispatch failed.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(Failure::kind)
    }
}

impl From<Outcome> for InvocationResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// What an adapter returns to the external caller: a payload or a single
/// message.
///
/// # Example
///
/// ```
/// use coral_rpc::Response;
/// use serde_json::json;
///
/// let response = Response::success(Some(json!("Hello World")));
/// assert_eq!(response.payload_bytes().unwrap(), b"\"Hello World\"");
/// assert_eq!(
///     serde_json::to_string(&response).unwrap(),
///     r#"{"status":"success","payload":"Hello World"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The call succeeded.
    Success {
        /// Encoded reply; absent when the method produced nothing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// The call failed.
    Error {
        /// Caller-safe failure message.
        message: String,
    },
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub const fn success(payload: Option<Value>) -> Self {
        Self::Success { payload }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns `true` for a success response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the encoded payload, empty when the reply is absent or the
    /// call failed.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when the payload cannot be rendered.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Success {
                payload: Some(value),
            } => serde_json::to_vec(value),
            Self::Success { payload: None } | Self::Error { .. } => Ok(Vec::new()),
        }
    }
}

impl From<InvocationResult> for Response {
    fn from(result: InvocationResult) -> Self {
        match result {
            InvocationResult::Success(payload) => Self::Success { payload },
            InvocationResult::Failure(failure) => Self::Error {
                message: failure.message().to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests;
