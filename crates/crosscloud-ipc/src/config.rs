//! Centralized configuration for the IPC client.
//!
//! `IpcConfig` holds the constants shared with the sync core. `ClientOptions`
//! is the per-client runtime configuration.

use crate::cancel::CancellationToken;
use std::time::Duration;

/// Constants shared with the sync core and the shell integrations.
pub struct IpcConfig;

impl IpcConfig {
    /// Application id used in the pipe name and the macOS group container.
    pub const APP_ID: &'static str = "crosscloud.shellextension";
    /// File name of the domain socket inside the app's container directory.
    pub const UNIX_SOCKET_NAME: &'static str = "unix_socket";
    /// Prefix of every Windows named pipe path.
    pub const PIPE_PREFIX: &'static str = r"\\.\pipe\";

    pub const JSONRPC_VERSION: &'static str = "2.0";

    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
    pub const IO_TIMEOUT: Duration = Duration::from_secs(5);
    pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16MB

    /// Deepest menu level accepted from the core; deeper records are dropped.
    pub const MAX_MENU_DEPTH: usize = 16;
    /// Levels walked when flattening a menu for hosts without submenus.
    pub const MAX_FLATTEN_DEPTH: usize = 10;

    /// Returned as the sync root when the core cannot tell us the real one.
    ///
    /// The NUL byte keeps it from naming a file on any platform.
    pub const SYNC_DIRECTORY_SENTINEL: &'static str = "\0crosscloud-unavailable\0/y/z";
}

/// Locations of the core's on-disk state.
pub struct PathsConfig;

impl PathsConfig {
    pub const VENDOR_DIR_NAME: &'static str = "CrossCloud";
    pub const APP_DIR_NAME: &'static str = "CrossCloud";
    pub const SETTINGS_VERSION_DIR_NAME: &'static str = "1.0";
    pub const LOCK_FILE_NAME: &'static str = "crosscloud.lock";
    /// macOS group containers live under `~/Library/Group Containers`.
    pub const GROUP_CONTAINERS_DIR: &'static str = "Library/Group Containers";
}

/// Runtime options for a sync client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Upper bound for opening the transport. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Upper bound for each frame read or write. `None` waits for the OS.
    pub io_timeout: Option<Duration>,
    /// Largest response frame accepted.
    pub max_message_size: usize,
    /// Deepest menu level parsed from `get_context_menu` results.
    pub max_menu_depth: usize,
    /// Aborts in-flight calls when cancelled.
    pub cancel: CancellationToken,
    /// Logging context every operation runs in.
    pub span: Option<tracing::Span>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(IpcConfig::CONNECT_TIMEOUT),
            io_timeout: Some(IpcConfig::IO_TIMEOUT),
            max_message_size: IpcConfig::MAX_MESSAGE_SIZE,
            max_menu_depth: IpcConfig::MAX_MENU_DEPTH,
            cancel: CancellationToken::new(),
            span: None,
        }
    }
}

impl ClientOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-frame read/write timeout.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Set the largest accepted response frame.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the deepest accepted menu level.
    pub fn with_max_menu_depth(mut self, depth: usize) -> Self {
        self.max_menu_depth = depth;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run every client operation inside `span`.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }
}
