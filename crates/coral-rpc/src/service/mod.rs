//! Services: a receiver plus its table of callable methods.
//!
//! A [`ServiceBuilder`] collects candidate methods for one receiver. Each
//! candidate is an ordinary function taking `&R` followed by up to eight
//! [`Param`] arguments; the [`Method`] trait turns it into a signature for
//! the validator and a type-erased invoker for the dispatcher. The registry
//! consumes the builder and stores an immutable [`Service`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::decode::Arguments;
use crate::descriptor::{
    MethodDescriptor, MethodSignature, Outcome, Outputs, Param, TypeDescriptor, short_type_name,
};
use crate::error::DispatchError;

/// Type-erased receiver shared by every method of a service.
pub(crate) type Receiver = Arc<dyn Any + Send + Sync>;

/// Type-erased call of one method on a service receiver.
pub(crate) type Invoker = Box<
    dyn Fn(&(dyn Any + Send + Sync), &mut Arguments<'_>) -> Result<Outcome, DispatchError>
        + Send
        + Sync,
>;

/// A function callable on receiver `R` with argument list `Args`.
///
/// Implemented for every `Fn(&R, A1, ..., An) -> O` with `n <= 8`, where each
/// `Ai: Param` and `O: Outputs`. `Args` is the tuple `(A1, ..., An)` and only
/// serves to keep the implementations apart.
pub trait Method<R, Args>: Send + Sync + 'static {
    /// Declared parameter types in order.
    fn params() -> Vec<TypeDescriptor>;

    /// Declared output types in order.
    fn outputs() -> Vec<TypeDescriptor>;

    /// Binds every parameter from `args`, then calls the function.
    ///
    /// # Errors
    ///
    /// Returns the first binding error; the function is not called in that
    /// case.
    fn invoke(&self, receiver: &R, args: &mut Arguments<'_>) -> Result<Outcome, DispatchError>;
}

macro_rules! impl_method {
    ($($arg:ident => $value:ident),*) => {
        impl<R, F, O, $($arg,)*> Method<R, ($($arg,)*)> for F
        where
            R: 'static,
            F: Fn(&R, $($arg),*) -> O + Send + Sync + 'static,
            O: Outputs,
            $($arg: Param,)*
        {
            fn params() -> Vec<TypeDescriptor> {
                vec![$(<$arg as Param>::descriptor()),*]
            }

            fn outputs() -> Vec<TypeDescriptor> {
                O::descriptors()
            }

            fn invoke(
                &self,
                receiver: &R,
                args: &mut Arguments<'_>,
            ) -> Result<Outcome, DispatchError> {
                $(let $value = args.bind::<$arg>()?;)*
                args.finish()?;
                Ok((self)(receiver, $($value),*).into_outcome())
            }
        }
    };
}

impl_method!();
impl_method!(A1 => a1);
impl_method!(A1 => a1, A2 => a2);
impl_method!(A1 => a1, A2 => a2, A3 => a3);
impl_method!(A1 => a1, A2 => a2, A3 => a3, A4 => a4);
impl_method!(A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5);
impl_method!(A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5, A6 => a6);
impl_method!(A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5, A6 => a6, A7 => a7);
impl_method!(A1 => a1, A2 => a2, A3 => a3, A4 => a4, A5 => a5, A6 => a6, A7 => a7, A8 => a8);

/// A method awaiting validation.
pub(crate) struct Candidate {
    pub(crate) signature: MethodSignature,
    pub(crate) invoker: Invoker,
}

/// Collects the candidate methods of one receiver.
///
/// # Example
///
/// ```
/// use coral_rpc::{Context, Registry, ServiceBuilder};
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
/// assert!(registry.lookup("Greeter").is_some());
/// ```
pub struct ServiceBuilder<R> {
    receiver: Arc<R>,
    candidates: Vec<Candidate>,
}

impl<R: Send + Sync + 'static> ServiceBuilder<R> {
    /// Starts a service around `receiver`.
    #[must_use]
    pub fn new(receiver: R) -> Self {
        Self::from_arc(Arc::new(receiver))
    }

    /// Starts a service around a shared receiver.
    #[must_use]
    pub const fn from_arc(receiver: Arc<R>) -> Self {
        Self {
            receiver,
            candidates: Vec::new(),
        }
    }

    /// Declares a method under its dispatch name.
    ///
    /// Names starting with a lowercase letter are kept off the dispatch
    /// surface by the validator.
    #[must_use]
    pub fn method<Args, M>(mut self, name: impl Into<String>, method: M) -> Self
    where
        Args: 'static,
        M: Method<R, Args>,
    {
        let signature = MethodSignature::new(name, M::params(), M::outputs());
        let invoker: Invoker = Box::new(
            move |receiver: &(dyn Any + Send + Sync), args: &mut Arguments<'_>| {
                let receiver = receiver.downcast_ref::<R>().ok_or_else(|| {
                    DispatchError::internal(format!(
                        "receiver is not a {}",
                        short_type_name::<R>()
                    ))
                })?;
                method.invoke(receiver, args)
            },
        );
        self.candidates.push(Candidate { signature, invoker });
        self
    }

    /// Returns the receiver's short type name, the default service name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        short_type_name::<R>()
    }

    /// Returns the signatures declared so far.
    #[must_use]
    pub fn signatures(&self) -> Vec<&MethodSignature> {
        self.candidates
            .iter()
            .map(|candidate| &candidate.signature)
            .collect()
    }

    pub(crate) fn into_parts(self) -> (Receiver, Vec<Candidate>) {
        let receiver: Receiver = self.receiver;
        (receiver, self.candidates)
    }
}

impl<R> fmt::Debug for ServiceBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("receiver", &short_type_name::<R>())
            .field("methods", &self.candidates.len())
            .finish()
    }
}

/// One validated, callable method.
pub struct MethodEntry {
    descriptor: MethodDescriptor,
    invoker: Invoker,
}

impl MethodEntry {
    pub(crate) fn new(descriptor: MethodDescriptor, invoker: Invoker) -> Self {
        Self {
            descriptor,
            invoker,
        }
    }

    /// Returns the validated signature.
    #[must_use]
    pub const fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A registered service. Immutable once published.
pub struct Service {
    name: String,
    type_name: &'static str,
    receiver: Receiver,
    methods: HashMap<String, MethodEntry>,
}

impl Service {
    pub(crate) fn new(
        name: String,
        type_name: &'static str,
        receiver: Receiver,
        methods: HashMap<String, MethodEntry>,
    ) -> Self {
        Self {
            name,
            type_name,
            receiver,
            methods,
        }
    }

    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the receiver's short type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Looks up a method by dispatch name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.get(name)
    }

    /// Returns the method names in lexical order.
    #[must_use]
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Calls `entry` on this service's receiver.
    pub(crate) fn invoke(
        &self,
        entry: &MethodEntry,
        args: &mut Arguments<'_>,
    ) -> Result<Outcome, DispatchError> {
        (entry.invoker)(self.receiver.as_ref(), args)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("methods", &self.method_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
