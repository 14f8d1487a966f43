//! Command-line arguments for the hello host.

use clap::Parser;
use coral_rpc::config::DEFAULT_LOG_FILTER;
use coral_rpc::{DispatchConfig, LogFormat, RegistrationPolicy};

/// Default caller address handed to every request's context.
pub(crate) const DEFAULT_CALLER: &str = "0x0000000000000000000000000000000000000000";

/// Reads JSONL requests on stdin and writes one JSON response per line on
/// stdout.
#[derive(Parser, Debug)]
#[command(name = "coral-hello", version, about)]
pub(crate) struct Cli {
    /// Tracing filter expression (for example `coral_rpc=debug`); a non-empty
    /// `RUST_LOG` takes precedence.
    #[arg(long, env = "CORAL_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub(crate) log_filter: String,
    /// Log output format written to stderr.
    #[arg(long, env = "CORAL_LOG_FORMAT", default_value_t = LogFormat::Json)]
    pub(crate) log_format: LogFormat,
    /// Whether invalid service methods fail registration or are skipped.
    #[arg(long, env = "CORAL_REGISTRATION_POLICY", default_value_t = RegistrationPolicy::Strict)]
    pub(crate) registration_policy: RegistrationPolicy,
    /// Address reported by the execution context.
    #[arg(long, env = "CORAL_CALLER", default_value = DEFAULT_CALLER)]
    pub(crate) caller: String,
    /// Only capture backtraces for recovered panics when `RUST_BACKTRACE`
    /// asks for them.
    #[arg(long)]
    pub(crate) lazy_backtraces: bool,
}

impl Cli {
    /// Builds the dispatcher configuration from the parsed flags.
    pub(crate) fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_log_filter(self.log_filter.as_str())
            .with_log_format(self.log_format)
            .with_registration_policy(self.registration_policy)
            .with_capture_backtraces(!self.lazy_backtraces)
    }
}
