//! Signature validation.
//!
//! A candidate method is registrable when its name is exported, every
//! parameter and output type is exported or built in, it has one or two
//! outputs with the second error-shaped, and its context parameters come
//! before any wire parameter. Validation runs once per method, at
//! registration, over the plain [`MethodSignature`] data.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::RegistrationPolicy;
use crate::descriptor::{MethodDescriptor, MethodSignature, is_exported};
use crate::error::{NoMethodsHint, RegistrationError};
use crate::registry::REGISTRY_TARGET;
use crate::service::{Candidate, MethodEntry};

/// Checks one candidate against the calling convention.
///
/// Returns `Ok(None)` when the method name is not exported: such methods are
/// simply not part of the dispatch surface.
///
/// # Errors
///
/// Returns the first rule the signature breaks.
///
/// # Example
///
/// ```
/// use coral_rpc::validate::validate_method;
/// use coral_rpc::{MethodSignature, TypeDescriptor};
///
/// let string = TypeDescriptor::primitive("String");
/// let three = MethodSignature::new(
///     "Split",
///     vec![string.clone()],
///     vec![string.clone(), string.clone(), string],
/// );
/// assert!(validate_method(&three).is_err());
/// ```
pub fn validate_method(
    signature: &MethodSignature,
) -> Result<Option<MethodDescriptor>, RegistrationError> {
    let method = signature.name();
    if !is_exported(method) {
        return Ok(None);
    }

    let (reply, error) = match signature.outputs() {
        [reply] => (reply, None),
        [reply, error] => (reply, Some(error)),
        outputs => {
            return Err(RegistrationError::OutputArity {
                method: method.to_owned(),
                count: outputs.len(),
            });
        }
    };

    if let Some(param) = signature
        .params()
        .iter()
        .find(|param| !param.is_exported_or_builtin())
    {
        return Err(RegistrationError::UnexportedArgument {
            method: method.to_owned(),
            type_name: param.name().to_owned(),
        });
    }

    let leading = signature
        .params()
        .iter()
        .take_while(|param| param.is_context())
        .count();
    if let Some((position, param)) = signature
        .params()
        .iter()
        .enumerate()
        .skip(leading)
        .find(|(_, param)| param.is_context())
    {
        return Err(RegistrationError::ContextAfterWire {
            method: method.to_owned(),
            type_name: param.name().to_owned(),
            position,
        });
    }

    if !reply.is_exported_or_builtin() {
        return Err(RegistrationError::UnexportedReturn {
            method: method.to_owned(),
            type_name: reply.name().to_owned(),
        });
    }

    if let Some(error) = error.filter(|error| !error.is_error_shaped()) {
        return Err(RegistrationError::NonErrorReturn {
            method: method.to_owned(),
            type_name: error.name().to_owned(),
        });
    }

    Ok(Some(MethodDescriptor::new(
        method.to_owned(),
        signature.params().to_vec(),
        reply.clone(),
        error.cloned(),
    )))
}

/// Validates every candidate of one service and builds its method table.
///
/// Under [`RegistrationPolicy::Strict`] the first invalid method fails the
/// registration. Under [`RegistrationPolicy::Lenient`] invalid methods are
/// logged and left out. Either way an empty table is an error.
pub(crate) fn validate_service(
    service: &str,
    candidates: Vec<Candidate>,
    policy: RegistrationPolicy,
) -> Result<HashMap<String, MethodEntry>, RegistrationError> {
    let declared = candidates.len();
    let mut unexported = 0_usize;
    let mut last_rejection = None;
    let mut methods = HashMap::with_capacity(declared);

    for Candidate { signature, invoker } in candidates {
        let outcome = validate_method(&signature).and_then(|descriptor| match descriptor {
            Some(descriptor) if methods.contains_key(descriptor.name()) => {
                Err(RegistrationError::DuplicateMethod {
                    service: service.to_owned(),
                    method: descriptor.name().to_owned(),
                })
            }
            other => Ok(other),
        });

        match outcome {
            Ok(Some(descriptor)) => {
                info!(
                    target: REGISTRY_TARGET,
                    service,
                    method = descriptor.name(),
                    params = descriptor.params().len(),
                    "registered method"
                );
                methods.insert(
                    descriptor.name().to_owned(),
                    MethodEntry::new(descriptor, invoker),
                );
            }
            Ok(None) => unexported += 1,
            Err(error) if policy == RegistrationPolicy::Lenient => {
                warn!(
                    target: REGISTRY_TARGET,
                    service,
                    method = signature.name(),
                    %error,
                    "skipping method"
                );
                last_rejection = Some(Box::new(error));
            }
            Err(error) => return Err(error),
        }
    }

    if methods.is_empty() {
        let hint = if declared > 0 && unexported == declared {
            NoMethodsHint::Unexported
        } else {
            NoMethodsHint::NoneSuitable
        };
        return Err(RegistrationError::NoSuitableMethods {
            name: service.to_owned(),
            hint,
            cause: last_rejection,
        });
    }

    Ok(methods)
}
