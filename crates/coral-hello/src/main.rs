//! Entry point for the `coral-hello` host.
//!
//! Delegates to [`coral_hello::run`] with the process arguments and locked
//! standard streams.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    coral_hello::run(std::env::args_os(), stdin, &mut stdout, &mut stderr)
}
