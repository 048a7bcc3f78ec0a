//! Framed request/response channel over a single connection.
//!
//! The channel owns at most one stream to the core. A call takes the stream
//! lock, reconnects once if the previous exchange broke the connection,
//! writes one request frame and reads one response frame.
//!
//! # Thread Safety
//!
//! A tokio `Mutex` serializes whole exchanges, so calls from several tasks
//! (or several shell callback threads through the blocking client) queue up
//! instead of interleaving frames on the wire.

use super::protocol::{parse_response, read_frame, write_frame, IpcRequest};
use super::transport::Connector;
use crate::cancel::{CancellationToken, CancelledError};
use crate::config::ClientOptions;
use crate::error::{IpcError, Result};
use serde_json::Value;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// RPC channel to the sync core.
pub struct RpcChannel<C: Connector> {
    connector: C,
    stream: Mutex<Option<C::Stream>>,
    connected: AtomicBool,
    next_id: AtomicU64,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
    max_message_size: usize,
    cancel: CancellationToken,
}

impl<C: Connector> RpcChannel<C> {
    /// Create a disconnected channel. The first call connects.
    pub fn new(connector: C, options: &ClientOptions) -> Self {
        Self {
            connector,
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            connect_timeout: options.connect_timeout,
            io_timeout: options.io_timeout,
            max_message_size: options.max_message_size,
            cancel: options.cancel.clone(),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// True when there is no open stream; the next call will reconnect.
    pub fn is_disconnected(&self) -> bool {
        !self.connected.load(Ordering::SeqCst)
    }

    /// (Re)establish the connection, replacing any open stream.
    pub async fn connect(&self) -> Result<()> {
        let mut stream = self.stream.lock().await;
        if stream.take().is_some() {
            debug!("Dropping previous connection to {}", self.connector.describe());
        }
        self.connected.store(false, Ordering::SeqCst);

        *stream = Some(self.open().await?);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Close the connection. Waits for an in-flight call to finish first.
    pub async fn shutdown(&self) {
        let mut stream = self.stream.lock().await;
        if stream.take().is_some() {
            debug!("Closed connection to {}", self.connector.describe());
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Call a method on the core and return its `result` value.
    ///
    /// Nothing is retried within a call. Any failure on the connection drops
    /// it, so the next call starts with exactly one reconnect attempt.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let mut stream = self.stream.lock().await;

        if stream.is_none() {
            debug!("Reconnecting to {}", self.connector.describe());
            match self.open().await {
                Ok(opened) => {
                    *stream = Some(opened);
                    self.connected.store(true, Ordering::SeqCst);
                }
                // Still go on to the write so the caller sees the IO failure.
                Err(e) => warn!("Reconnect to {} failed: {}", self.connector.describe(), e),
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request_bytes = serde_json::to_vec(&IpcRequest::new(method, params, id))?;
        debug!("--> {} (id {}, {} bytes)", method, id, request_bytes.len());

        let exchanged = match stream.as_mut() {
            Some(open) => self.exchange(open, &request_bytes).await,
            None => Err(IpcError::io(
                "Failed to write request",
                io::Error::new(io::ErrorKind::NotConnected, "not connected to the sync core"),
            )),
        };

        let response_bytes = match exchanged {
            Ok(bytes) => bytes,
            Err(e) => {
                stream.take();
                self.connected.store(false, Ordering::SeqCst);
                debug!("{} failed, connection closed: {}", method, e);
                return Err(e);
            }
        };
        drop(stream);

        debug!("<-- {} (id {}, {} bytes)", method, id, response_bytes.len());
        parse_response(&response_bytes)
    }

    async fn exchange(&self, stream: &mut C::Stream, request: &[u8]) -> Result<Vec<u8>> {
        self.bounded(self.io_timeout, write_frame(stream, request), |e| {
            IpcError::io("Failed to write request", e)
        })
        .await?;

        self.bounded(self.io_timeout, read_frame(stream, self.max_message_size), |e| {
            IpcError::io("Failed to read response", e)
        })
        .await
    }

    async fn open(&self) -> Result<C::Stream> {
        let describe = self.connector.describe();
        self.bounded(self.connect_timeout, self.connector.connect(), |e| {
            IpcError::connection(describe, e)
        })
        .await
    }

    /// Run `fut` under an optional timeout and the channel's cancellation
    /// token. Expiry and cancellation are reported through `interrupted`.
    async fn bounded<T, F>(
        &self,
        limit: Option<Duration>,
        fut: F,
        interrupted: impl FnOnce(io::Error) -> IpcError,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timed = async {
            match limit {
                Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                    io::Error::new(io::ErrorKind::TimedOut, format!("timed out after {:?}", limit))
                }),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            outcome = timed => match outcome {
                Ok(result) => result,
                Err(timeout) => Err(interrupted(timeout)),
            },
            _ = self.cancel.cancelled() => {
                Err(interrupted(io::Error::new(io::ErrorKind::Interrupted, CancelledError)))
            }
        }
    }
}
