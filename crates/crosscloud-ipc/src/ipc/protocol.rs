//! Wire format shared with the sync core.
//!
//! Every message in either direction is a 4-byte little-endian length prefix
//! followed by that many bytes of UTF-8 JSON. There is no delimiter and no
//! framing beyond the prefix.
//!
//! ```text
//! [u32 LE: len][UTF-8 JSON bytes of len]
//! ```
//!
//! Requests are JSON-RPC 2.0 shaped. Responses carry either `result` or
//! `error`; the protocol is strictly one request, then one response.

use crate::config::IpcConfig;
use crate::error::{IpcError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Size of the length prefix in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// JSON-RPC 2.0 request sent to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcRequest {
    pub jsonrpc: String,
    pub method: String,
    /// Positional params; left out of the envelope when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,
    /// Informational only. The core answers in order, so ids are never matched.
    pub id: u64,
}

impl IpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: u64) -> Self {
        Self {
            jsonrpc: IpcConfig::JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: if params.is_empty() { None } else { Some(params) },
            id,
        }
    }
}

/// Interpret a response payload.
///
/// Returns the `result` value (which may be `null`), a remote error for an
/// `error` field, and a protocol error for anything else.
pub fn parse_response(payload: &[u8]) -> Result<Value> {
    let response: Value = serde_json::from_slice(payload).map_err(|e| IpcError::Protocol {
        message: format!("Failed to parse IPC response: {}", e),
        source: Some(e),
    })?;

    let Value::Object(mut fields) = response else {
        return Err(IpcError::protocol("IPC response is not a JSON object"));
    };

    if let Some(result) = fields.remove("result") {
        return Ok(result);
    }
    if let Some(error) = fields.remove("error") {
        return Err(IpcError::remote(error));
    }
    Err(IpcError::protocol(
        "IPC response contains neither a 'result' nor an 'error' field",
    ))
}

/// Prefix a payload with its length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| IpcError::protocol(format!("IPC payload of {} bytes is too large", payload.len())))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read a length-prefixed frame from an async reader.
///
/// End of stream before a complete frame is an IO error: the core never
/// closes a connection in the middle of an exchange on purpose.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; FRAME_HEADER_LEN];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| IpcError::io("Failed to read response length", e))?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_len {
        return Err(IpcError::protocol(format!(
            "IPC message size {} exceeds maximum {}",
            len, max_len
        )));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| IpcError::io("Failed to read response payload", e))?;

    Ok(payload)
}

/// Write a length-prefixed frame and flush it to the OS.
///
/// Prefix and payload go out in one write so a concurrent reader of the raw
/// stream never sees a prefix without its payload.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let frame = encode_frame(payload)?;
    writer
        .write_all(&frame)
        .await
        .map_err(|e| IpcError::io("Failed to write request", e))?;
    writer
        .flush()
        .await
        .map_err(|e| IpcError::io("Failed to flush request", e))?;
    Ok(())
}
