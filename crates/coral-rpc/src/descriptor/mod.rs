//! Explicit type and method descriptors.
//!
//! Methods are registered as ordinary typed functions. Each parameter type
//! implements [`Param`] and each return type implements [`Outputs`], so the
//! shape of every method is known as plain data ([`MethodSignature`]) before
//! the validator ever looks at it. No runtime reflection is involved: the
//! descriptor tables are produced by the trait implementations below and by
//! [`rpc_type!`](crate::rpc_type) for user-defined types.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use serde_json::value::RawValue;

use crate::context::BaseParam;
use crate::decode::{decode_json, encode_json};
use crate::error::{DecodeError, Failure, FailureKind, InternalError, MethodError};

/// Result of one invocation once its outputs have been read: the encoded
/// reply (absent when the method produced nothing) or a failure.
pub type Outcome = Result<Option<Value>, Failure>;

/// Structural category of a described type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// Built-in scalar or string type.
    Primitive,
    /// User-defined type; exported when its name starts with an uppercase
    /// letter.
    Named {
        /// Whether the type is part of the public dispatch surface.
        exported: bool,
    },
    /// Homogeneous sequence.
    Sequence(Box<TypeDescriptor>),
    /// String-keyed map.
    Map(Box<TypeDescriptor>),
    /// Nullable wrapper around a value.
    Optional(Box<TypeDescriptor>),
    /// Error-shaped value carrying a failure signal and message.
    Error,
    /// Execution-context handle injected by the caller.
    Context,
}

/// Static description of one parameter or output type.
///
/// # Example
///
/// ```
/// use coral_rpc::TypeDescriptor;
///
/// let points = TypeDescriptor::sequence(TypeDescriptor::named("Point"));
/// assert_eq!(points.name(), "Vec<Point>");
/// assert!(points.is_exported_or_builtin());
/// assert!(!TypeDescriptor::named("point").is_exported_or_builtin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: Cow<'static, str>,
    shape: TypeShape,
}

impl TypeDescriptor {
    /// Describes a built-in type.
    #[must_use]
    pub const fn primitive(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            shape: TypeShape::Primitive,
        }
    }

    /// Describes a user-defined type, deriving visibility from its name.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let exported = is_exported(&name);
        Self {
            name,
            shape: TypeShape::Named { exported },
        }
    }

    /// Describes the Rust type `T` by its short name.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::named(short_type_name::<T>())
    }

    /// Describes a sequence of `element`.
    #[must_use]
    pub fn sequence(element: Self) -> Self {
        Self {
            name: Cow::Owned(format!("Vec<{}>", element.name)),
            shape: TypeShape::Sequence(Box::new(element)),
        }
    }

    /// Describes a string-keyed map of `value`.
    #[must_use]
    pub fn map(value: Self) -> Self {
        Self {
            name: Cow::Owned(format!("Map<String, {}>", value.name)),
            shape: TypeShape::Map(Box::new(value)),
        }
    }

    /// Describes a nullable `inner`.
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self {
            name: Cow::Owned(format!("Option<{}>", inner.name)),
            shape: TypeShape::Optional(Box::new(inner)),
        }
    }

    /// Describes an error-shaped type.
    #[must_use]
    pub fn error(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Error,
        }
    }

    /// Describes an execution-context type.
    #[must_use]
    pub fn context(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Context,
        }
    }

    /// Returns the type name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the structural shape.
    #[must_use]
    pub const fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Returns `true` for exported or built-in types. Containers are judged
    /// by their element type.
    #[must_use]
    pub fn is_exported_or_builtin(&self) -> bool {
        match &self.shape {
            TypeShape::Primitive | TypeShape::Error | TypeShape::Context => true,
            TypeShape::Named { exported } => *exported,
            TypeShape::Sequence(inner) | TypeShape::Map(inner) | TypeShape::Optional(inner) => {
                inner.is_exported_or_builtin()
            }
        }
    }

    /// Returns `true` when the type can signal failure, either directly or
    /// through a nullable wrapper.
    #[must_use]
    pub fn is_error_shaped(&self) -> bool {
        match &self.shape {
            TypeShape::Error => true,
            TypeShape::Optional(inner) => inner.is_error_shaped(),
            _ => false,
        }
    }

    /// Returns `true` for caller-injected context types.
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(self.shape, TypeShape::Context)
    }
}

/// Returns `true` when `name` starts with an uppercase letter.
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Returns the last path segment of `T`'s type name, without generic
/// arguments.
///
/// Tuples, arrays, slices and function pointers have no single last
/// segment; their full type name is returned. None of them starts with an
/// uppercase letter, so [`is_exported`] rejects them as service names.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    if without_generics.contains(['(', '[']) {
        return full;
    }
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

/// A type a method can declare as a parameter.
///
/// Every parameter is bound either from a caller-supplied [`BaseParam`]
/// (leading positions) or from one encoded wire value (remaining positions).
pub trait Param: Sized + Send + 'static {
    /// Describes the type for validation and diagnostics.
    fn descriptor() -> TypeDescriptor;

    /// Decodes the type from one encoded wire value.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the text is malformed, does not match
    /// the expected shape, or the type is never carried on the wire.
    fn decode(raw: &RawValue) -> Result<Self, DecodeError>;

    /// Binds the type from a base parameter.
    ///
    /// # Errors
    ///
    /// Returns the parameter unchanged when it holds another type.
    fn inject(base: BaseParam) -> Result<Self, BaseParam> {
        base.downcast::<Self>()
    }
}

/// A type a method can return.
pub trait Reply: Send + 'static {
    /// Describes the type for validation and diagnostics.
    fn descriptor() -> TypeDescriptor;

    /// Encodes the value; `None` means the reply is absent.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when the value cannot be encoded.
    fn encode(&self) -> Result<Option<Value>, serde_json::Error>;

    /// Returns the failure message when the value signals failure. Only
    /// error-shaped types ever return `Some`.
    fn failure(&self) -> Option<String> {
        None
    }
}

/// The full output list of a method.
///
/// `()` has no outputs, any [`Reply`] is one output, `(A, B)` and
/// `Result<T, E>` are two, `(A, B, C)` is three. The validator accepts only
/// one or two outputs, the second being error-shaped.
pub trait Outputs: Send + 'static {
    /// Describes each output in order.
    fn descriptors() -> Vec<TypeDescriptor>;

    /// Reads the outputs into an [`Outcome`].
    fn into_outcome(self) -> Outcome;
}

fn encode_reply<T: Reply>(value: &T) -> Outcome {
    value.encode().map_err(|error| {
        Failure::new(
            FailureKind::Encode,
            format!("failed to encode {}: {error}", T::descriptor().name()),
        )
    })
}

impl Outputs for () {
    fn descriptors() -> Vec<TypeDescriptor> {
        Vec::new()
    }

    fn into_outcome(self) -> Outcome {
        Ok(None)
    }
}

impl<T: Reply> Outputs for T {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![T::descriptor()]
    }

    fn into_outcome(self) -> Outcome {
        encode_reply(&self)
    }
}

impl<T: Reply, E: Reply> Outputs for (T, E) {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![T::descriptor(), E::descriptor()]
    }

    fn into_outcome(self) -> Outcome {
        let (reply, error) = self;
        match error.failure() {
            Some(message) => Err(Failure::new(FailureKind::Method, message)),
            None => encode_reply(&reply),
        }
    }
}

impl<T: Reply, E: Reply> Outputs for Result<T, E> {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![T::descriptor(), E::descriptor()]
    }

    fn into_outcome(self) -> Outcome {
        match self {
            Ok(reply) => encode_reply(&reply),
            Err(error) => Err(Failure::new(
                FailureKind::Method,
                error
                    .failure()
                    .unwrap_or_else(|| E::descriptor().name().to_owned()),
            )),
        }
    }
}

impl<A: Reply, B: Reply, C: Reply> Outputs for (A, B, C) {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![A::descriptor(), B::descriptor(), C::descriptor()]
    }

    fn into_outcome(self) -> Outcome {
        Err(Failure::new(
            FailureKind::Internal,
            "methods with three outputs are never registered",
        ))
    }
}

macro_rules! primitive_types {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Param for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive($name)
                }

                fn decode(raw: &RawValue) -> Result<Self, DecodeError> {
                    decode_json(raw)
                }
            }

            impl Reply for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive($name)
                }

                fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
                    encode_json(self)
                }
            }
        )+
    };
}

primitive_types!(
    bool => "bool",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    char => "char",
    String => "String",
    Value => "Value",
);

impl<T: Param> Param for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }

    fn decode(raw: &RawValue) -> Result<Self, DecodeError> {
        if raw.get().trim() == "null" {
            return Ok(None);
        }
        T::decode(raw).map(Some)
    }
}

impl<T: Param> Param for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn decode(raw: &RawValue) -> Result<Self, DecodeError> {
        T::decode(raw).map(Box::new)
    }
}

impl<T: Param> Param for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }

    fn decode(raw: &RawValue) -> Result<Self, DecodeError> {
        let items: Vec<Box<RawValue>> = decode_json(raw)?;
        items.iter().map(|item| T::decode(item)).collect()
    }
}

impl<T: Param> Param for HashMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::descriptor())
    }

    fn decode(raw: &RawValue) -> Result<Self, DecodeError> {
        let entries: HashMap<String, Box<RawValue>> = decode_json(raw)?;
        entries
            .into_iter()
            .map(|(key, value)| T::decode(&value).map(|decoded| (key, decoded)))
            .collect()
    }
}

impl<T: Param> Param for BTreeMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::descriptor())
    }

    fn decode(raw: &RawValue) -> Result<Self, DecodeError> {
        let entries: BTreeMap<String, Box<RawValue>> = decode_json(raw)?;
        entries
            .into_iter()
            .map(|(key, value)| T::decode(&value).map(|decoded| (key, decoded)))
            .collect()
    }
}

impl<T: Reply> Reply for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            Some(value) => value.encode(),
            None => Ok(None),
        }
    }

    fn failure(&self) -> Option<String> {
        self.as_ref().and_then(Reply::failure)
    }
}

impl<T: Reply> Reply for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        (**self).encode()
    }

    fn failure(&self) -> Option<String> {
        (**self).failure()
    }
}

impl<T: Reply> Reply for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::descriptor())
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        let items = self
            .iter()
            .map(|item| item.encode().map(Option::unwrap_or_default))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Value::Array(items)))
    }
}

impl<T: Reply> Reply for HashMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::descriptor())
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        encode_entries(self.iter())
    }
}

impl<T: Reply> Reply for BTreeMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::descriptor())
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        encode_entries(self.iter())
    }
}

fn encode_entries<'a, T: Reply>(
    entries: impl Iterator<Item = (&'a String, &'a T)>,
) -> Result<Option<Value>, serde_json::Error> {
    let mut object = serde_json::Map::new();
    for (key, value) in entries {
        object.insert(key.clone(), value.encode()?.unwrap_or_default());
    }
    Ok(Some(Value::Object(object)))
}

impl Reply for MethodError {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error("MethodError")
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        Ok(Some(Value::String(self.message().to_owned())))
    }

    fn failure(&self) -> Option<String> {
        Some(self.message().to_owned())
    }
}

impl Reply for InternalError {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error("InternalError")
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        Ok(Some(Value::String(self.external().to_owned())))
    }

    fn failure(&self) -> Option<String> {
        Some(self.external().to_owned())
    }
}

impl Reply for Box<dyn std::error::Error + Send + Sync> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error("Box<dyn Error>")
    }

    fn encode(&self) -> Result<Option<Value>, serde_json::Error> {
        Ok(Some(Value::String(self.to_string())))
    }

    fn failure(&self) -> Option<String> {
        Some(self.to_string())
    }
}

/// Introspected signature of a candidate method, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    name: String,
    params: Vec<TypeDescriptor>,
    outputs: Vec<TypeDescriptor>,
}

impl MethodSignature {
    /// Creates a signature.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        params: Vec<TypeDescriptor>,
        outputs: Vec<TypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            outputs,
        }
    }

    /// Returns the dispatch name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the declared parameter types in order.
    #[must_use]
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    /// Returns the declared output types in order.
    #[must_use]
    pub fn outputs(&self) -> &[TypeDescriptor] {
        &self.outputs
    }
}

/// Validated signature of a registered method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<TypeDescriptor>,
    reply: TypeDescriptor,
    error: Option<TypeDescriptor>,
}

impl MethodDescriptor {
    pub(crate) fn new(
        name: String,
        params: Vec<TypeDescriptor>,
        reply: TypeDescriptor,
        error: Option<TypeDescriptor>,
    ) -> Self {
        Self {
            name,
            params,
            reply,
            error,
        }
    }

    /// Returns the dispatch name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the declared parameter types in order, base parameters
    /// included.
    #[must_use]
    pub fn params(&self) -> &[TypeDescriptor] {
        &self.params
    }

    /// Returns the number of leading context parameters.
    #[must_use]
    pub fn context_params(&self) -> usize {
        self.params
            .iter()
            .take_while(|param| param.is_context())
            .count()
    }

    /// Returns the primary output type.
    #[must_use]
    pub const fn reply(&self) -> &TypeDescriptor {
        &self.reply
    }

    /// Returns `true` when the method has an error-shaped second output.
    #[must_use]
    pub const fn has_error_return(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the error output type, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&TypeDescriptor> {
        self.error.as_ref()
    }
}

/// Implements [`Param`] and [`Reply`] for serde types so methods can take and
/// return them.
///
/// The descriptor uses the type's short name, so the usual uppercase Rust
/// type names are exported.
///
/// # Example
///
/// ```
/// use coral_rpc::{Param, TypeDescriptor};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Transfer {
///     to: String,
///     amount: u64,
/// }
///
/// coral_rpc::rpc_type!(Transfer);
///
/// assert_eq!(<Transfer as Param>::descriptor(), TypeDescriptor::named("Transfer"));
/// ```
#[macro_export]
macro_rules! rpc_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Param for $ty {
                fn descriptor() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::of::<$ty>()
                }

                fn decode(
                    raw: &$crate::RawValue,
                ) -> ::core::result::Result<Self, $crate::DecodeError> {
                    $crate::decode::decode_json(raw)
                }
            }

            impl $crate::Reply for $ty {
                fn descriptor() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::of::<$ty>()
                }

                fn encode(
                    &self,
                ) -> ::core::result::Result<
                    ::core::option::Option<$crate::Value>,
                    $crate::EncodeError,
                > {
                    $crate::decode::encode_json(self)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests;
