//! Error types for the CrossCloud IPC client.
//!
//! The transport and RPC channel surface these to their callers. The sync
//! client is the boundary where every variant is turned into a safe default,
//! so shell integrations built on top of it never see them.

use std::io;
use thiserror::Error;

/// Main error type for the IPC client.
#[derive(Debug, Error)]
pub enum IpcError {
    /// The core endpoint could not be reached or resolved.
    #[error("Connection to {endpoint} failed: {message}")]
    Connection {
        endpoint: String,
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// A read or write on an open connection failed or was cut short.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The core sent something that is not a valid response envelope.
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The core answered with an `error` field.
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        /// The raw `error` value as sent by the core.
        error: serde_json::Value,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for IPC operations.
pub type Result<T> = std::result::Result<T, IpcError>;

impl From<io::Error> for IpcError {
    fn from(err: io::Error) -> Self {
        IpcError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for IpcError {
    fn from(err: serde_json::Error) -> Self {
        IpcError::Protocol {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl IpcError {
    /// Create a connection error for an endpoint.
    pub fn connection(endpoint: impl ToString, err: io::Error) -> Self {
        IpcError::Connection {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with a context message.
    pub fn io(context: &str, err: io::Error) -> Self {
        IpcError::Io {
            message: format!("{}: {}", context, err),
            source: Some(err),
        }
    }

    /// Create a protocol error without an underlying parse error.
    pub fn protocol(message: impl Into<String>) -> Self {
        IpcError::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Create a remote error from the core's `error` value.
    ///
    /// JSON-RPC error objects carry a `message`; anything else is rendered
    /// as compact JSON.
    pub fn remote(error: serde_json::Value) -> Self {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        IpcError::Remote { message, error }
    }

    /// The IO error kind, if this error wraps one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            IpcError::Connection { source, .. } | IpcError::Io { source, .. } => {
                source.as_ref().map(io::Error::kind)
            }
            _ => None,
        }
    }
}
