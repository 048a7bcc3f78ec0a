//! IPC between shell integrations and the running sync core.
//!
//! Length-prefixed JSON-RPC 2.0 over a per-user Windows named pipe or a Unix
//! domain socket. The core is the server; shell hosts only ever connect.
//!
//! # Architecture
//!
//! - **Endpoint / Transport**: where the core listens and how a stream to it is opened
//! - **Protocol**: framing and the request/response envelope
//! - **Channel**: one connection, serialized exchanges, reconnect after failure
//! - **Client**: typed operations that degrade to safe defaults
//! - **Blocking**: the client driven on the caller's thread

pub mod blocking;
pub mod channel;
pub mod client;
pub mod endpoint;
pub mod protocol;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use blocking::BlockingSyncClient;
pub use channel::RpcChannel;
pub use client::SyncClient;
pub use endpoint::Endpoint;
pub use protocol::{read_frame, write_frame, IpcRequest};
pub use transport::{Connector, EndpointConnector, IpcStream};
