//! Synchronous façade over [`SyncClient`] for shell host callbacks.
//!
//! Explorer and Finder call overlay and menu handlers on their own threads
//! and expect an answer before returning. The blocking client owns a
//! current-thread tokio runtime and drives each operation to completion on
//! the calling thread. Several host threads may share one client; their
//! calls queue on the channel lock.
//!
//! Do not call these methods from inside an async context: `block_on`
//! panics when a runtime is already running on the thread.

use super::client::SyncClient;
use super::endpoint::Endpoint;
use super::transport::{Connector, EndpointConnector};
use crate::config::{ClientOptions, IpcConfig};
use crate::error::{IpcError, Result};
use crate::models::{MenuItem, PathUpdate, SyncStatus};
use std::path::{Path, PathBuf};
use tokio::runtime::{Builder, Runtime};

/// Blocking client for a running CrossCloud core.
pub struct BlockingSyncClient<C: Connector = EndpointConnector> {
    runtime: Runtime,
    client: SyncClient<C>,
}

impl BlockingSyncClient<EndpointConnector> {
    /// Client for the CrossCloud core of the current user, default options.
    pub fn new() -> Result<Self> {
        Self::for_app(IpcConfig::APP_ID, ClientOptions::default())
    }

    pub fn for_app(app_id: impl Into<String>, options: ClientOptions) -> Result<Self> {
        Self::with_connector(EndpointConnector::for_current_user(app_id), options)
    }

    pub fn for_endpoint(endpoint: Endpoint, options: ClientOptions) -> Result<Self> {
        Self::with_connector(EndpointConnector::fixed(endpoint), options)
    }
}

impl<C: Connector> BlockingSyncClient<C> {
    /// Build the runtime and wrap a client over `connector`.
    pub fn with_connector(connector: C, options: ClientOptions) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| IpcError::io("Failed to start IPC runtime", e))?;

        Ok(Self {
            runtime,
            client: SyncClient::with_connector(connector, options),
        })
    }

    pub fn connect(&self) -> Result<()> {
        self.runtime.block_on(self.client.connect())
    }

    pub fn is_disconnected(&self) -> bool {
        self.client.is_disconnected()
    }

    pub fn shutdown(&self) {
        self.runtime.block_on(self.client.shutdown())
    }

    /// See [`SyncClient::get_sync_directory`].
    pub fn get_sync_directory(&self) -> PathBuf {
        self.runtime.block_on(self.client.get_sync_directory())
    }

    pub fn get_path_status(&self, path: &Path) -> SyncStatus {
        self.runtime.block_on(self.client.get_path_status(path))
    }

    pub fn get_context_menu<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<MenuItem> {
        self.runtime.block_on(self.client.get_context_menu(paths))
    }

    pub fn perform_action<P: AsRef<Path>>(&self, action_id: &str, paths: &[P]) {
        self.runtime.block_on(self.client.perform_action(action_id, paths))
    }

    pub fn get_status_updates(&self) -> Vec<PathUpdate> {
        self.runtime.block_on(self.client.get_status_updates())
    }

    /// The async client underneath.
    pub fn client(&self) -> &SyncClient<C> {
        &self.client
    }
}
