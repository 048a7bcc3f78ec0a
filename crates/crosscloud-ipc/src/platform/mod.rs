//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific behavior live in this module rather
//! than being scattered through the IPC code.
//!
//! - `paths` - endpoint and settings locations, path membership checks
//! - `user` - current OS user name (part of the Windows pipe name)
//! - `lock` - detecting a running core through its lockfile
//!
//! # Supported Platforms
//!
//! - **Windows**: named pipe transport
//! - **macOS**: domain socket in the app group container
//! - **Linux**: domain socket in the runtime dir (development and tests)

pub mod lock;
pub mod paths;
pub mod user;

pub use lock::{core_running, core_running_at};
pub use paths::{lock_file_path, path_contains_file, pipe_name, settings_dir, unix_socket_path};
pub use user::current_username;
