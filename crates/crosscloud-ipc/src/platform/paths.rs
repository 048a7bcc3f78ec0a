//! Platform-specific path utilities.
//!
//! This module provides:
//! - The named pipe and domain socket locations of the core's IPC endpoint
//! - The core's settings directory and lockfile
//! - Sync-root membership checks for overlay and menu handlers

use crate::config::{IpcConfig, PathsConfig};
use crate::error::{IpcError, Result};
use std::path::{Path, PathBuf};

/// Build the named pipe path for an app id and user.
///
/// ```
/// use crosscloud_ipc::platform::pipe_name;
///
/// assert_eq!(
///     pipe_name("crosscloud.shellextension", "alice"),
///     r"\\.\pipe\crosscloud.shellextension-alice"
/// );
/// ```
pub fn pipe_name(app_id: &str, username: &str) -> String {
    format!("{}{}-{}", IpcConfig::PIPE_PREFIX, app_id, username)
}

/// Get the path of the core's domain socket.
///
/// # Platform Behavior
/// - **macOS**: `~/Library/Group Containers/{app_id}/unix_socket` (the only
///   location the sandboxed Finder extension can reach)
/// - **Other Unix**: `$XDG_RUNTIME_DIR/{app_id}/unix_socket`, falling back
///   to the temp dir
/// - **Windows**: not used, the core listens on a named pipe
pub fn unix_socket_path(app_id: &str) -> Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let home = dirs::home_dir().ok_or_else(|| IpcError::Config {
            message: "Could not determine home directory".to_string(),
        })?;
        Ok(home
            .join(PathsConfig::GROUP_CONTAINERS_DIR)
            .join(app_id)
            .join(IpcConfig::UNIX_SOCKET_NAME))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let base = dirs::runtime_dir().unwrap_or_else(std::env::temp_dir);
        Ok(base.join(app_id).join(IpcConfig::UNIX_SOCKET_NAME))
    }
}

/// Get the core's settings directory.
///
/// # Platform Behavior
/// - **Windows**: `%LOCALAPPDATA%/CrossCloud/CrossCloud/1.0`
/// - **macOS**: `~/Library/Application Support/CrossCloud/CrossCloud/1.0`
/// - **Linux**: `~/.local/share/CrossCloud/CrossCloud/1.0`
pub fn settings_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().ok_or_else(|| IpcError::Config {
        message: "Could not determine local data directory".to_string(),
    })?;
    Ok(base
        .join(PathsConfig::VENDOR_DIR_NAME)
        .join(PathsConfig::APP_DIR_NAME)
        .join(PathsConfig::SETTINGS_VERSION_DIR_NAME))
}

/// Get the lockfile the core holds while it is running.
pub fn lock_file_path() -> Result<PathBuf> {
    Ok(settings_dir()?.join(PathsConfig::LOCK_FILE_NAME))
}

/// Check whether `file` lives inside `dir`.
///
/// Only the directory part of `file` is compared, so the sync root itself is
/// not "contained" in the sync root. Comparison is component-wise; a
/// trailing `.` or separator on `dir` is ignored.
pub fn path_contains_file(dir: &Path, file: &Path) -> bool {
    let Some(parent) = file.parent() else {
        return false;
    };
    let dir_len = dir.components().count();
    if dir_len == 0 || dir_len > parent.components().count() {
        return false;
    }
    parent.starts_with(dir)
}
