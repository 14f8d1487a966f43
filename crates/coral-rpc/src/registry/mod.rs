//! Service registry.
//!
//! The [`Registry`] maps service names to validated [`Service`]s. Services
//! are built and validated outside the lock, then published with a single
//! check-and-insert, so readers only ever see complete entries and two
//! concurrent registrations of one name cannot both succeed.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::config::{DispatchConfig, RegistrationPolicy};
use crate::descriptor::is_exported;
use crate::error::RegistrationError;
use crate::service::{Service, ServiceBuilder};
use crate::validate::validate_service;

/// Tracing target for registration events.
pub const REGISTRY_TARGET: &str = module_path!();

/// Concurrency-safe store of registered services.
///
/// # Example
///
/// ```
/// use coral_rpc::{Registry, ServiceBuilder};
///
/// struct Clock;
///
/// impl Clock {
///     fn now(&self) -> u64 {
///         1_700_000_000
///     }
/// }
///
/// let registry = Registry::new();
/// registry
///     .register_name("Time", ServiceBuilder::new(Clock).method("Now", Clock::now))
///     .expect("registration succeeds");
/// assert_eq!(registry.service_names(), ["Time"]);
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    policy: RegistrationPolicy,
    services: RwLock<HashMap<String, Arc<Service>>>,
}

impl Registry {
    /// Creates an empty registry with the strict policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given policy.
    #[must_use]
    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            policy,
            services: RwLock::default(),
        }
    }

    /// Creates an empty registry configured from `config`.
    #[must_use]
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::with_policy(config.registration_policy())
    }

    /// Returns the registration policy.
    #[must_use]
    pub const fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Registers a service under its receiver's type name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::UnexportedService`] when the type name is
    /// not exported, and otherwise the errors of [`Registry::register_name`].
    pub fn register<R: Send + Sync + 'static>(
        &self,
        builder: ServiceBuilder<R>,
    ) -> Result<(), RegistrationError> {
        let name = builder.type_name();
        if !name.is_empty() && !is_exported(name) {
            return Err(RegistrationError::UnexportedService {
                name: name.to_owned(),
            });
        }
        self.register_name(name, builder)
    }

    /// Registers a service under an explicit name.
    ///
    /// The name is used as given: it does not have to be exported.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::MissingName`] for an empty name,
    /// [`RegistrationError::DuplicateService`] when the name is taken, and any
    /// validation error raised by the service's methods.
    pub fn register_name<R: Send + Sync + 'static>(
        &self,
        name: &str,
        builder: ServiceBuilder<R>,
    ) -> Result<(), RegistrationError> {
        let type_name = builder.type_name();
        if name.is_empty() {
            return Err(RegistrationError::MissingName {
                type_name: type_name.to_owned(),
            });
        }
        if self.read().contains_key(name) {
            return Err(RegistrationError::duplicate_service(name));
        }

        let (receiver, candidates) = builder.into_parts();
        let methods = validate_service(name, candidates, self.policy)?;
        let service = Service::new(name.to_owned(), type_name, receiver, methods);

        match self.write().entry(name.to_owned()) {
            Entry::Occupied(_) => Err(RegistrationError::duplicate_service(name)),
            Entry::Vacant(slot) => {
                info!(
                    target: REGISTRY_TARGET,
                    service = name,
                    type_name,
                    methods = ?service.method_names(),
                    "registered service"
                );
                slot.insert(Arc::new(service));
                Ok(())
            }
        }
    }

    /// Looks up a service by name.
    ///
    /// The returned handle stays valid after the lock is released.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<Service>> {
        let found = self.read().get(name).cloned();
        if found.is_none() {
            debug!(target: REGISTRY_TARGET, service = name, "service not found");
        }
        found
    }

    /// Returns the registered service names in lexical order.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` when no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Service>>> {
        self.services.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Service>>> {
        self.services.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests;
