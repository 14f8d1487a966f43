//! Argument decoding and positional binding.
//!
//! [`Arguments`] hands each declared parameter its value in order: leading
//! positions take the caller's base parameters, the rest decode one wire
//! value each. The first failure aborts binding, so a method never sees a
//! partially decoded argument list.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::value::RawValue;

use crate::context::BaseParam;
use crate::descriptor::Param;
use crate::error::{DecodeError, DispatchError};

/// Decodes one encoded value with serde.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] when the text is malformed or does not fit
/// `T`.
pub fn decode_json<T: DeserializeOwned>(raw: &RawValue) -> Result<T, DecodeError> {
    serde_json::from_str(raw.get()).map_err(DecodeError::from)
}

/// Encodes one reply value with serde.
///
/// # Errors
///
/// Returns the serializer error when the value cannot be represented.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Option<Value>, serde_json::Error> {
    serde_json::to_value(value).map(Some)
}

/// Decodes the encoded `text` into `T`, reporting failures as a conversion
/// error that names the target type and echoes the text.
///
/// Text that is not JSON at all fails the same way as JSON of the wrong
/// shape. Nullable targets (`Option<T>`) decode `null` to `None` and
/// anything else through the wrapped type.
///
/// # Errors
///
/// Returns [`DispatchError::Convert`] when decoding fails.
///
/// # Example
///
/// ```
/// use coral_rpc::decode::decode;
///
/// assert_eq!(decode::<u32>("42").unwrap(), 42);
///
/// let error = decode::<u32>("\"abc\"").unwrap_err();
/// assert!(error.to_string().contains("expect u32"));
///
/// let error = decode::<String>("bob").unwrap_err();
/// assert!(error.to_string().contains("found=bob"));
/// ```
pub fn decode<T: Param>(text: &str) -> Result<T, DispatchError> {
    serde_json::from_str::<&RawValue>(text)
        .map_err(DecodeError::from)
        .and_then(T::decode)
        .map_err(|source| DispatchError::convert(T::descriptor().name(), text, source))
}

/// Positional argument source for one invocation.
#[derive(Debug)]
pub struct Arguments<'a> {
    base: std::vec::IntoIter<BaseParam>,
    wire: std::slice::Iter<'a, String>,
    position: usize,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(base: Vec<BaseParam>, wire: &'a [String]) -> Self {
        Self {
            base: base.into_iter(),
            wire: wire.iter(),
            position: 0,
        }
    }

    /// Binds the next declared parameter.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BaseParamMismatch`] when a base parameter has
    /// another type, [`DispatchError::Convert`] when a wire value does not
    /// decode, and [`DispatchError::Internal`] when the argument list is
    /// exhausted.
    pub fn bind<T: Param>(&mut self) -> Result<T, DispatchError> {
        let index = self.position;
        self.position += 1;
        if let Some(base) = self.base.next() {
            return T::inject(base).map_err(|_| DispatchError::BaseParamMismatch {
                index,
                expected: T::descriptor().name().to_owned(),
            });
        }
        match self.wire.next() {
            Some(text) => decode(text),
            None => Err(DispatchError::internal(format!(
                "argument {index} requested but no value remains"
            ))),
        }
    }

    /// Confirms every supplied value was bound.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] when values remain unbound.
    pub fn finish(&self) -> Result<(), DispatchError> {
        let left = self.base.len() + self.wire.len();
        if left == 0 {
            Ok(())
        } else {
            Err(DispatchError::internal(format!(
                "{left} argument values left unbound after {} parameters",
                self.position
            )))
        }
    }
}
