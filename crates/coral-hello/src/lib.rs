//! Line-oriented host for the `coral-rpc` dispatcher.
//!
//! [`run`] parses the command line, installs telemetry, registers the demo
//! services, then answers one JSON request per stdin line with one JSON
//! response per stdout line. Every request shares a single in-memory context,
//! so state written by one call is visible to the next.

mod cli;
mod errors;
mod services;

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use coral_rpc::{BaseParam, Context, Dispatcher, MemoryContext, Registry, telemetry};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::errors::HostError;

/// Tracing target for the host loop.
pub const HOST_TARGET: &str = module_path!();

/// Runs the host with explicit argument and stream handles.
///
/// Returns [`ExitCode::SUCCESS`] once stdin is exhausted. Usage errors are
/// written to `stderr` (help and version output to `stdout`) with clap's exit
/// status; setup and stream failures exit with [`ExitCode::FAILURE`].
/// Failed requests are not host failures: they become error responses.
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    match serve(&cli, stdin, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            writeln!(stderr, "coral-hello: {error}").ok();
            ExitCode::FAILURE
        }
    }
}

fn report_usage<W: Write, E: Write>(
    error: &clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    let written = if error.use_stderr() {
        write!(stderr, "{error}")
    } else {
        write!(stdout, "{error}")
    };
    written.ok();
    u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn serve<R: BufRead, W: Write>(cli: &Cli, stdin: R, stdout: &mut W) -> Result<(), HostError> {
    let config = cli.dispatch_config();
    telemetry::initialise(&config)?;

    let registry = Registry::from_config(&config);
    services::register_all(&registry)?;
    let dispatcher = Dispatcher::with_config(Arc::new(registry), config);
    let memory = Arc::new(MemoryContext::new(cli.caller.as_str()));
    info!(
        target: HOST_TARGET,
        services = ?dispatcher.registry().service_names(),
        caller = memory.address(),
        "serving requests from stdin"
    );

    let mut answered = 0_usize;
    for line in stdin.split(b'\n') {
        let line = line.map_err(HostError::ReadRequest)?;
        if line.trim_ascii().is_empty() {
            continue;
        }
        let base = vec![BaseParam::from(Context::from_arc(Arc::clone(&memory)))];
        let response = dispatcher.handle_line(&line, base);
        serde_json::to_writer(&mut *stdout, &response).map_err(HostError::SerialiseResponse)?;
        stdout
            .write_all(b"\n")
            .and_then(|()| stdout.flush())
            .map_err(HostError::WriteResponse)?;
        answered = answered.saturating_add(1);
    }

    debug!(target: HOST_TARGET, answered, "stdin closed");
    Ok(())
}
