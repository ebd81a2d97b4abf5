use crate::frame::message_error::ErrorBody;
use crate::frame::Opcode;
use itertools::Itertools;
use std::fmt::Display;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::result;
use thiserror::Error as ThisError;

pub type Result<T> = result::Result<T, Error>;

/// Control plane error type. Errors either come from the server via error responses, or are
/// raised within the client itself while establishing connections or maintaining topology.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Internal IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// General error
    #[error("General error: {0}")]
    General(String),
    /// Server error.
    #[error("Server {addr} error: {body:?}")]
    Server { body: ErrorBody, addr: SocketAddr },
    /// Timed out waiting for an operation to complete.
    #[error("Timeout: {0}")]
    Timeout(String),
    /// Authentication handshake could not be completed.
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// A topology or event operation was invoked before a control connection was established.
    #[error("Not connected")]
    NotConnected,
    /// Every candidate host failed to produce a control connection. Errors are kept in attempt
    /// order, one per candidate.
    #[error("No hosts available: {}", display_host_errors(.errors))]
    NoHostsAvailable { errors: Vec<(IpAddr, Error)> },
    /// Builder rejected by the builder registry.
    #[error("Invalid builder: {0}")]
    InvalidBuilder(String),
    /// Unknown server event.
    #[error("Unknown server event: {0}")]
    UnknownServerEvent(String),
    /// Unexpected topology change event type.
    #[error("Unexpected topology change type: {0}")]
    UnexpectedTopologyChangeType(String),
    /// Unexpected status change event type.
    #[error("Unexpected status change type: {0}")]
    UnexpectedStatusChangeType(String),
    /// Unexpected schema change event type.
    #[error("Unexpected schema change type: {0}")]
    UnexpectedSchemaChangeType(String),
    /// Unexpected schema change event target.
    #[error("Unexpected schema change target: {0}")]
    UnexpectedSchemaChangeTarget(String),
    /// Unexpected additional error info.
    #[error("Unexpected error code: {0}")]
    UnexpectedErrorCode(i32),
    /// Unexpected column type.
    #[error("Unexpected type of column {column}: expected {expected}")]
    UnexpectedColumnType {
        column: String,
        expected: &'static str,
    },
    /// Protocol version not known to the client.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(u8),
    /// Response of a kind the request could not produce.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(Opcode),
    /// Unexpected response to auth message.
    #[error("Unexpected auth response: {0}")]
    UnexpectedAuthResponse(Opcode),
    /// Unexpected startup response.
    #[error("Unexpected startup response: {0}")]
    UnexpectedStartupResponse(Opcode),
}

impl Error {
    /// Returns server error body, if this error was reported by a server.
    pub fn server_error(&self) -> Option<&ErrorBody> {
        match self {
            Error::Server { body, .. } => Some(body),
            _ => None,
        }
    }
}

fn display_host_errors(errors: &[(IpAddr, Error)]) -> String {
    if errors.is_empty() {
        return "no hosts were tried".into();
    }

    errors
        .iter()
        .map(|(host, error)| format!("{} ({})", host, error))
        .join(", ")
}

pub fn column_is_empty_err<T: Display>(column_name: T) -> Error {
    Error::General(format!("Column or Udt property '{}' is empty", column_name))
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::General(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Error {
        Error::General(err.to_string())
    }
}
