//! CrossCloud IPC - client side of the shell integration protocol.
//!
//! Windows Explorer handlers and the macOS Finder extension use this crate to
//! ask the running CrossCloud sync core for the sync root, per-file overlay
//! status and context menus, and to trigger menu actions. The core listens on
//! a per-user named pipe (Windows) or domain socket (macOS and Linux).
//!
//! Every query degrades to a safe default when the core is not reachable, so
//! a host never has to handle IPC errors to keep working.
//!
//! # Example
//!
//! ```rust,ignore
//! use crosscloud_ipc::{SyncClient, SyncStatus};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = SyncClient::new();
//!
//!     let root = client.get_sync_directory().await;
//!     let status = client.get_path_status(&root.join("report.pdf")).await;
//!     if status == SyncStatus::Syncing {
//!         println!("still uploading");
//!     }
//!
//!     for item in client.get_context_menu(&[root.join("report.pdf")]).await {
//!         println!("{} ({})", item.name, item.action_id);
//!     }
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod ipc;
pub mod lifecycle;
pub mod models;
pub mod platform;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use config::{ClientOptions, IpcConfig};
pub use error::{IpcError, Result};
pub use ipc::{BlockingSyncClient, Endpoint, EndpointConnector, SyncClient};
pub use lifecycle::{HostGuard, HostRefCount};
pub use models::{flatten_leaves, parse_menu, CheckState, MenuItem, PathUpdate, SyncStatus};
pub use platform::{core_running, path_contains_file};
