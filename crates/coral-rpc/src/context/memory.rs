//! In-memory execution context for local runs and tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::keys;
use crate::error::ContextError;

/// Channel identifier reported by every in-memory context.
pub const MEMORY_CHANNEL_ID: &str = "mem-channel";

static NEXT_TX: AtomicU64 = AtomicU64::new(1);

/// Execution context backed by process memory.
///
/// Stands in for a ledger host: it knows the caller's address, hands out a
/// fresh transaction id and timestamp per context, and keeps world state and
/// emitted events in ordered maps.
///
/// Composite keys use the readable `/`-joined layout of
/// [`keys::create_key`].
#[derive(Debug)]
pub struct MemoryContext {
    address: String,
    tx_id: String,
    tx_timestamp: OffsetDateTime,
    states: Mutex<BTreeMap<String, Vec<u8>>>,
    events: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryContext {
    /// Creates a context for the caller at `address`.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        let tx = NEXT_TX.fetch_add(1, Ordering::Relaxed);
        Self {
            address: address.into(),
            tx_id: format!("mem-tx-{tx:016x}"),
            tx_timestamp: OffsetDateTime::now_utc(),
            states: Mutex::new(BTreeMap::new()),
            events: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the caller address.
    #[must_use]
    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        self.tx_id.as_str()
    }

    /// Replaces the transaction timestamp.
    #[must_use]
    pub fn with_tx_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.tx_timestamp = timestamp;
        self
    }

    /// Returns the transaction timestamp, fixed when the context was created.
    #[must_use]
    pub const fn tx_timestamp(&self) -> OffsetDateTime {
        self.tx_timestamp
    }

    /// Renders the transaction timestamp as RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Timestamp`] when the timestamp cannot be
    /// represented in RFC 3339.
    pub fn tx_timestamp_rfc3339(&self) -> Result<String, ContextError> {
        Ok(self.tx_timestamp.format(&Rfc3339)?)
    }

    /// Returns the channel id.
    #[must_use]
    pub const fn channel_id(&self) -> &'static str {
        MEMORY_CHANNEL_ID
    }

    /// Reads one state entry.
    #[must_use]
    pub fn get_state(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.states).get(key).cloned()
    }

    /// Writes one state entry.
    pub fn put_state(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        lock(&self.states).insert(key.into(), value.into());
    }

    /// Removes one state entry, returning its previous value.
    #[must_use]
    pub fn del_state(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.states).remove(key)
    }

    /// Lists state keys starting with `prefix`, in order.
    #[must_use]
    pub fn state_keys(&self, prefix: &str) -> Vec<String> {
        lock(&self.states)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Builds a state key for `object_type` and `attributes`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Delimiter`] when a part contains `/`.
    pub fn create_composite_key<S: AsRef<str>>(
        &self,
        object_type: &str,
        attributes: &[S],
    ) -> Result<String, ContextError> {
        keys::create_key(object_type, attributes)
    }

    /// Splits a key built by [`MemoryContext::create_composite_key`].
    #[must_use]
    pub fn split_composite_key(&self, key: &str) -> (String, Vec<String>) {
        keys::split_key(key)
    }

    /// Lists the state keys built from `object_type` and the leading
    /// `attributes`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Delimiter`] when a part contains `/`.
    pub fn state_keys_by_partial_key<S: AsRef<str>>(
        &self,
        object_type: &str,
        attributes: &[S],
    ) -> Result<Vec<String>, ContextError> {
        let mut prefix = keys::create_key(object_type, attributes)?;
        prefix.push(keys::KEY_SEPARATOR);
        Ok(self.state_keys(&prefix))
    }

    /// Records the event `app.event`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::EventName`] for an invalid name part.
    pub fn create_event(
        &self,
        app: &str,
        event: &str,
        payload: impl Into<Vec<u8>>,
    ) -> Result<(), ContextError> {
        let name = keys::make_event_name(app, event)?;
        self.set_event(name, payload);
        Ok(())
    }

    /// Records an event; a later event with the same name replaces it.
    pub fn set_event(&self, name: impl Into<String>, payload: impl Into<Vec<u8>>) {
        lock(&self.events).insert(name.into(), payload.into());
    }

    /// Returns the payload of a recorded event.
    #[must_use]
    pub fn event(&self, name: &str) -> Option<Vec<u8>> {
        lock(&self.events).get(name).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
