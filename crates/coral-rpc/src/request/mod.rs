//! Wire request.
//!
//! A request names its target as `"Service.Method"` and carries zero or more
//! independently encoded positional parameters:
//!
//! ```json
//! {"func_name": "Greeter.Hello", "params": ["\"World\""]}
//! ```
//!
//! Each element of `params` is itself a JSON document in string form. The
//! text is kept as sent: it is only parsed once the dispatcher has checked
//! the parameter count and knows the target type, so a badly encoded value
//! fails as a conversion error for that parameter. An element that is not a
//! string is taken as an already encoded value.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::RequestError;

/// One call addressed to a registered method.
///
/// # Example
///
/// ```
/// use coral_rpc::Request;
///
/// let request = Request::new("Greeter.Hello").with_param(&"World").unwrap();
/// assert_eq!(request.service_method(), "Greeter.Hello");
/// assert_eq!(request.params().len(), 1);
/// assert_eq!(request.params(), ["\"World\""]);
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    service_method: String,
    params: Option<Vec<String>>,
}

impl Request {
    /// Creates a request without parameters.
    #[must_use]
    pub fn new(service_method: impl Into<String>) -> Self {
        Self {
            service_method: service_method.into(),
            params: None,
        }
    }

    /// Parses one request document.
    ///
    /// Trailing whitespace (such as the newline of a request line) is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Empty`] for blank input and
    /// [`RequestError::Malformed`] when the document does not have the
    /// request shape. Parameter text is not inspected here.
    pub fn parse(bytes: &[u8]) -> Result<Self, RequestError> {
        let trimmed = bytes.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(RequestError::Empty);
        }
        let wire: IncomingRequest<'_> =
            serde_json::from_slice(trimmed).map_err(RequestError::Malformed)?;
        let params = wire
            .params
            .map(|params| params.into_iter().map(param_text).collect::<Result<Vec<_>, _>>())
            .transpose()
            .map_err(RequestError::Malformed)?;
        Ok(Self {
            service_method: wire.func_name,
            params,
        })
    }

    /// Renders the request in its wire form, each parameter as a string.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EncodeParam`] when serialisation fails.
    pub fn to_wire(&self) -> Result<String, RequestError> {
        let wire = WireRequest {
            func_name: self.service_method.clone(),
            params: self.params.clone(),
        };
        serde_json::to_string(&wire).map_err(RequestError::EncodeParam)
    }

    /// Appends a parameter encoded from `value`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EncodeParam`] when `value` cannot be encoded.
    pub fn with_param<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, RequestError> {
        let text = serde_json::to_string(value).map_err(RequestError::EncodeParam)?;
        Ok(self.with_raw_param(text))
    }

    /// Appends an already encoded parameter.
    ///
    /// The text is sent as given; it is not checked until dispatch.
    #[must_use]
    pub fn with_raw_param(mut self, text: impl Into<String>) -> Self {
        self.params.get_or_insert_with(Vec::new).push(text.into());
        self
    }

    /// Returns the `"Service.Method"` path.
    #[must_use]
    pub fn service_method(&self) -> &str {
        self.service_method.as_str()
    }

    /// Returns the encoded parameters; empty when none were sent.
    #[must_use]
    pub fn params(&self) -> &[String] {
        self.params.as_deref().unwrap_or_default()
    }
}

/// Wire shape: parameters travel as JSON documents inside JSON strings.
#[derive(Serialize)]
struct WireRequest {
    func_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Vec<String>>,
}

/// Parsing side of [`WireRequest`]; elements stay raw until classified.
#[derive(Deserialize)]
struct IncomingRequest<'a> {
    func_name: String,
    #[serde(default, borrow)]
    params: Option<Vec<&'a RawValue>>,
}

/// Returns the encoded text of one element: the contents of a string, or
/// the element itself otherwise.
fn param_text(raw: &RawValue) -> Result<String, serde_json::Error> {
    let text = raw.get();
    if text.starts_with('"') {
        serde_json::from_str(text)
    } else {
        Ok(text.to_owned())
    }
}
