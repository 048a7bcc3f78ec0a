//! In-memory fake of the sync core for unit tests.
//!
//! Each connect hands out one end of a `tokio::io::duplex` pipe and spawns a
//! task that answers frames on the other end. Everything the client writes
//! is recorded so tests can check frame boundaries on the wire.

use super::protocol::{encode_frame, IpcRequest, FRAME_HEADER_LEN};
use super::transport::Connector;
use crate::error::{IpcError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

/// What the fake core does with a request.
pub(crate) enum Reply {
    /// Send this value as the whole response envelope.
    Envelope(Value),
    /// Send raw payload bytes (for malformed responses).
    Raw(Vec<u8>),
    /// Wait, then send the envelope.
    Slow(Duration, Value),
    /// Close the connection without answering.
    Hangup,
    /// Keep the connection open and never answer.
    Silent,
}

impl Reply {
    pub(crate) fn result(value: Value) -> Self {
        Reply::Envelope(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": value}))
    }
}

type Handler = dyn Fn(&IpcRequest) -> Reply + Send + Sync;

/// Client-side stream that records every byte written through it.
pub(crate) struct RecordingStream {
    inner: DuplexStream,
    written: Arc<Mutex<Vec<u8>>>,
}

impl AsyncRead for RecordingStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for RecordingStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                this.written.lock().unwrap().extend_from_slice(&buf[..n]);
                Poll::Ready(Ok(n))
            }
            other => other,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// Connector backed by a scripted in-memory core.
#[derive(Clone)]
pub(crate) struct FakeCore {
    handler: Arc<Handler>,
    connects: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<IpcRequest>>>,
    written: Arc<Mutex<Vec<u8>>>,
}

impl FakeCore {
    pub(crate) fn new(handler: impl Fn(&IpcRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            connects: Arc::new(AtomicUsize::new(0)),
            refuse: Arc::new(AtomicBool::new(false)),
            requests: Arc::new(Mutex::new(Vec::new())),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A core that answers every request with `result`.
    pub(crate) fn answering(result: Value) -> Self {
        Self::new(move |_| Reply::result(result.clone()))
    }

    /// Make subsequent connects fail (or succeed again).
    pub(crate) fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of connect attempts, successful or not.
    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<IpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// All bytes the client wrote, across connections.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    async fn serve(self, mut stream: DuplexStream) {
        loop {
            let mut len_buf = [0u8; FRAME_HEADER_LEN];
            if stream.read_exact(&mut len_buf).await.is_err() {
                return;
            }
            let mut payload = vec![0u8; u32::from_le_bytes(len_buf) as usize];
            if stream.read_exact(&mut payload).await.is_err() {
                return;
            }

            let request: IpcRequest = match serde_json::from_slice(&payload) {
                Ok(request) => request,
                Err(_) => return,
            };
            self.requests.lock().unwrap().push(request.clone());

            let body = match (self.handler)(&request) {
                Reply::Envelope(value) => serde_json::to_vec(&value).unwrap(),
                Reply::Raw(bytes) => bytes,
                Reply::Slow(delay, value) => {
                    tokio::time::sleep(delay).await;
                    serde_json::to_vec(&value).unwrap()
                }
                Reply::Hangup => return,
                Reply::Silent => {
                    std::future::pending::<()>().await;
                    return;
                }
            };

            let frame = encode_frame(&body).unwrap();
            if stream.write_all(&frame).await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl Connector for FakeCore {
    type Stream = RecordingStream;

    async fn connect(&self) -> Result<Self::Stream> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(IpcError::connection(
                self.describe(),
                io::Error::new(io::ErrorKind::ConnectionRefused, "core not running"),
            ));
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        tokio::spawn(self.clone().serve(server));

        Ok(RecordingStream {
            inner: client,
            written: self.written.clone(),
        })
    }

    fn describe(&self) -> String {
        "fake-core".to_string()
    }
}

/// Split a recorded byte stream into frame payloads.
///
/// Panics if the bytes do not form a clean sequence of complete frames.
pub(crate) fn split_frames(mut bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    while !bytes.is_empty() {
        assert!(bytes.len() >= FRAME_HEADER_LEN, "truncated length prefix");
        let len = u32::from_le_bytes(bytes[..FRAME_HEADER_LEN].try_into().unwrap()) as usize;
        let rest = &bytes[FRAME_HEADER_LEN..];
        assert!(rest.len() >= len, "truncated payload");
        frames.push(rest[..len].to_vec());
        bytes = &rest[len..];
    }
    frames
}
