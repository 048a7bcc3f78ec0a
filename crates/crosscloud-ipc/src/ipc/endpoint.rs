//! Addresses of the sync core's IPC endpoint.

use crate::config::IpcConfig;
use crate::error::{IpcError, Result};
use crate::platform::pipe_name;
#[cfg(windows)]
use crate::platform::current_username;
#[cfg(not(windows))]
use crate::platform::unix_socket_path;
use std::fmt;
use std::path::PathBuf;

/// Platform-specific address the core listens on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Windows named pipe, `\\.\pipe\<app-id>-<username>`.
    NamedPipe(String),
    /// Filesystem path of an `AF_UNIX` stream socket.
    UnixSocket(PathBuf),
}

impl Endpoint {
    /// Resolve the endpoint the core opens for the current user.
    ///
    /// # Platform Behavior
    /// - **Windows**: named pipe including the user name from `GetUserNameW`
    /// - **Unix**: domain socket from [`unix_socket_path`]
    ///
    /// Resolution failures are connection errors: without an address the
    /// core is unreachable.
    pub fn for_current_user(app_id: &str) -> Result<Self> {
        #[cfg(windows)]
        {
            let username = current_username().map_err(|e| IpcError::Connection {
                endpoint: format!("{}{}-<user>", IpcConfig::PIPE_PREFIX, app_id),
                message: format!("Failed to resolve user name: {}", e),
                source: Some(e),
            })?;
            Ok(Endpoint::NamedPipe(pipe_name(app_id, &username)))
        }

        #[cfg(not(windows))]
        {
            unix_socket_path(app_id)
                .map(Endpoint::UnixSocket)
                .map_err(|e| IpcError::Connection {
                    endpoint: app_id.to_string(),
                    message: format!("Failed to resolve socket path: {}", e),
                    source: None,
                })
        }
    }

    /// Named pipe for an explicit user, bypassing the user lookup.
    pub fn named_pipe_for(app_id: &str, username: &str) -> Self {
        Endpoint::NamedPipe(pipe_name(app_id, username))
    }

    /// Default endpoint of the CrossCloud core for the current user.
    pub fn default_for_current_user() -> Result<Self> {
        Self::for_current_user(IpcConfig::APP_ID)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::NamedPipe(name) => write!(f, "{}", name),
            Endpoint::UnixSocket(path) => write!(f, "{}", path.display()),
        }
    }
}
