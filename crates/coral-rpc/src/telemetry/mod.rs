//! Tracing setup for dispatcher hosts.
//!
//! Log records go to stderr; stdout belongs to responses. The filter is taken
//! from `RUST_LOG` when that variable holds any directives, and from
//! [`DispatchConfig::log_filter`] otherwise, so an operator can raise the
//! verbosity of one run without editing host configuration. The subscriber is
//! installed once per process; the filter chosen by that first call stays in
//! force.

use std::fmt;
use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::debug;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;

use crate::config::{DispatchConfig, LogFormat};

/// Environment variable whose directives override the configured filter.
pub const FILTER_ENV: &str = EnvFilter::DEFAULT_ENV;

const TELEMETRY_TARGET: &str = module_path!();

static INSTALLED: OnceCell<LogFilter> = OnceCell::new();

/// Where the active filter directives came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOrigin {
    /// The [`FILTER_ENV`] environment variable.
    Environment,
    /// [`DispatchConfig::log_filter`].
    Config,
}

impl fmt::Display for FilterOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => f.write_str(FILTER_ENV),
            Self::Config => f.write_str("dispatch config"),
        }
    }
}

/// Filter directives selected for the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    directives: String,
    origin: FilterOrigin,
}

impl LogFilter {
    /// Picks the environment directives when `env_value` is non-blank and the
    /// configured ones otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use coral_rpc::DispatchConfig;
    /// use coral_rpc::telemetry::{FilterOrigin, LogFilter};
    ///
    /// let config = DispatchConfig::default().with_log_filter("warn");
    /// let chosen = LogFilter::resolve(&config, Some("coral_rpc=trace"));
    /// assert_eq!(chosen.directives(), "coral_rpc=trace");
    /// assert_eq!(chosen.origin(), FilterOrigin::Environment);
    ///
    /// let chosen = LogFilter::resolve(&config, Some(""));
    /// assert_eq!(chosen.directives(), "warn");
    /// ```
    #[must_use]
    pub fn resolve(config: &DispatchConfig, env_value: Option<&str>) -> Self {
        match env_value.map(str::trim).filter(|value| !value.is_empty()) {
            Some(directives) => Self {
                directives: directives.to_owned(),
                origin: FilterOrigin::Environment,
            },
            None => Self {
                directives: config.log_filter().to_owned(),
                origin: FilterOrigin::Config,
            },
        }
    }

    /// Reads [`FILTER_ENV`] and resolves against `config`.
    #[must_use]
    pub fn from_env(config: &DispatchConfig) -> Self {
        let env_value = std::env::var(FILTER_ENV).ok();
        Self::resolve(config, env_value.as_deref())
    }

    /// Returns the directive string.
    #[must_use]
    pub fn directives(&self) -> &str {
        self.directives.as_str()
    }

    /// Returns where the directives came from.
    #[must_use]
    pub const fn origin(&self) -> FilterOrigin {
        self.origin
    }

    fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::try_new(&self.directives).map_err(|error| TelemetryError::Filter {
            directives: self.directives.clone(),
            origin: self.origin,
            reason: error.to_string(),
        })
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The selected directives do not parse.
    #[error("invalid log filter {directives:?} from {origin}: {reason}")]
    Filter {
        /// The rejected directives.
        directives: String,
        /// Where they came from.
        origin: FilterOrigin,
        /// Parser message.
        reason: String,
    },
    /// Another global subscriber is already in place.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the process-wide subscriber and returns the filter it uses.
///
/// Only the first successful call installs anything. Later calls return the
/// filter already in force and ignore `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the selected directives do not
/// parse and [`TelemetryError::Subscriber`] when something other than this
/// module already set a global subscriber.
///
/// # Example
///
/// ```
/// use coral_rpc::DispatchConfig;
/// use coral_rpc::telemetry;
///
/// # fn main() -> Result<(), coral_rpc::telemetry::TelemetryError> {
/// let quiet = DispatchConfig::default().with_log_filter("off");
/// let installed = telemetry::initialise(&quiet)?;
/// let again = telemetry::initialise(&DispatchConfig::default())?;
/// assert_eq!(installed, again);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &DispatchConfig) -> Result<&'static LogFilter, TelemetryError> {
    INSTALLED.get_or_try_init(|| {
        let filter = LogFilter::from_env(config);
        install(&filter, config.log_format())?;
        debug!(
            target: TELEMETRY_TARGET,
            directives = filter.directives(),
            origin = %filter.origin(),
            "telemetry installed"
        );
        Ok(filter)
    })
}

fn install(filter: &LogFilter, format: LogFormat) -> Result<(), TelemetryError> {
    let stderr_builder = tracing_subscriber::fmt()
        .with_env_filter(filter.env_filter()?)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_target(true);

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(stderr_builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(stderr_builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests;
