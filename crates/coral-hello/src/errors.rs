//! Error types for the hello host.

use std::io;

use coral_rpc::RegistrationError;
use coral_rpc::telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum HostError {
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to register services: {0}")]
    Register(#[from] RegistrationError),
    #[error("failed to read request: {0}")]
    ReadRequest(io::Error),
    #[error("failed to serialise response: {0}")]
    SerialiseResponse(serde_json::Error),
    #[error("failed to write response: {0}")]
    WriteResponse(io::Error),
}
