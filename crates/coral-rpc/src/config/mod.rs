//! Dispatcher configuration.
//!
//! [`DispatchConfig`] is plain serde data with defaults for every field, so
//! hosts can embed it in their own configuration documents or build it in
//! code with the `with_*` methods.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

const fn default_capture_backtraces() -> bool {
    true
}

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// How registration treats methods that break the calling convention.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RegistrationPolicy {
    /// Any invalid method fails the whole registration.
    #[default]
    Strict,
    /// Invalid methods are logged and left out of the method table.
    Lenient,
}

/// Errors encountered while parsing a [`LogFormat`] or
/// [`RegistrationPolicy`] from text.
pub type ConfigParseError = strum::ParseError;

/// Runtime settings for the registry, dispatcher and telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    log_filter: String,
    log_format: LogFormat,
    registration_policy: RegistrationPolicy,
    capture_backtraces: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: LogFormat::default(),
            registration_policy: RegistrationPolicy::default(),
            capture_backtraces: default_capture_backtraces(),
        }
    }
}

impl DispatchConfig {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the registration policy.
    #[must_use]
    pub const fn registration_policy(&self) -> RegistrationPolicy {
        self.registration_policy
    }

    /// Returns whether panics inside a dispatch capture a backtrace even when
    /// `RUST_BACKTRACE` is unset.
    #[must_use]
    pub const fn capture_backtraces(&self) -> bool {
        self.capture_backtraces
    }

    /// Replaces the tracing filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Replaces the log output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Replaces the registration policy.
    #[must_use]
    pub const fn with_registration_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.registration_policy = policy;
        self
    }

    /// Enables or disables forced backtrace capture.
    #[must_use]
    pub const fn with_capture_backtraces(mut self, capture: bool) -> Self {
        self.capture_backtraces = capture;
        self
    }
}

#[cfg(test)]
mod tests;
