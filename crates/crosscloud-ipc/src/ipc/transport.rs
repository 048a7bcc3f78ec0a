//! Byte-stream transport to the sync core.
//!
//! A [`Connector`] opens one stream per connection attempt. The RPC channel
//! owns the stream it gets back; dropping it closes the OS handle, so every
//! exit path releases the handle exactly once.

use super::endpoint::Endpoint;
use crate::error::{IpcError, Result};
use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// A bidirectional byte stream to the core.
pub trait IpcStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> IpcStream for T {}

/// Opens streams to the core.
///
/// Implemented by [`EndpointConnector`] for the real pipe/socket, and by test
/// fakes that hand out in-memory streams.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Stream: IpcStream + 'static;

    /// Open a new stream. Attempted once; the caller decides about retries.
    async fn connect(&self) -> Result<Self::Stream>;

    /// Human-readable target, for logs and errors.
    fn describe(&self) -> String;
}

/// How the connector finds its endpoint.
#[derive(Debug, Clone)]
enum Target {
    /// Resolved on every connect, so a user-name lookup failure surfaces there.
    CurrentUser { app_id: String },
    Fixed(Endpoint),
}

/// Connector for the platform's named pipe or domain socket.
#[derive(Debug, Clone)]
pub struct EndpointConnector {
    target: Target,
}

impl EndpointConnector {
    /// Connect to the endpoint the core opens for the current user.
    pub fn for_current_user(app_id: impl Into<String>) -> Self {
        Self {
            target: Target::CurrentUser {
                app_id: app_id.into(),
            },
        }
    }

    /// Connect to an explicit endpoint.
    pub fn fixed(endpoint: Endpoint) -> Self {
        Self {
            target: Target::Fixed(endpoint),
        }
    }

    fn resolve(&self) -> Result<Endpoint> {
        match &self.target {
            Target::CurrentUser { app_id } => Endpoint::for_current_user(app_id),
            Target::Fixed(endpoint) => Ok(endpoint.clone()),
        }
    }
}

#[async_trait]
impl Connector for EndpointConnector {
    type Stream = Box<dyn IpcStream>;

    async fn connect(&self) -> Result<Self::Stream> {
        let endpoint = self.resolve()?;
        debug!("Connecting to {}", endpoint);

        let stream = open_endpoint(&endpoint)
            .await
            .map_err(|e| IpcError::connection(&endpoint, e))?;

        debug!("Connected to {}", endpoint);
        Ok(stream)
    }

    fn describe(&self) -> String {
        match &self.target {
            Target::CurrentUser { app_id } => format!("{} (current user)", app_id),
            Target::Fixed(endpoint) => endpoint.to_string(),
        }
    }
}

/// Open the OS-level stream for an endpoint.
///
/// # Platform Behavior
/// - **Windows**: `CreateFileW` on the pipe with read/write access and no
///   sharing; a busy pipe fails immediately
/// - **Unix**: a single `connect()` on an `AF_UNIX` stream socket
async fn open_endpoint(endpoint: &Endpoint) -> io::Result<Box<dyn IpcStream>> {
    match endpoint {
        Endpoint::UnixSocket(path) => {
            #[cfg(unix)]
            {
                let stream = tokio::net::UnixStream::connect(path).await?;
                Ok(Box::new(stream))
            }

            #[cfg(not(unix))]
            {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("Domain sockets are not supported here: {}", path.display()),
                ))
            }
        }
        Endpoint::NamedPipe(name) => {
            #[cfg(windows)]
            {
                let client = tokio::net::windows::named_pipe::ClientOptions::new().open(name)?;
                Ok(Box::new(client))
            }

            #[cfg(not(windows))]
            {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("Named pipes are not supported here: {}", name),
                ))
            }
        }
    }
}
