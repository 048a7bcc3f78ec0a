//! Typed client for the sync core's shell extension API.
//!
//! Shell hosts call into this from overlay and menu callbacks where an error
//! has nowhere to go, so every operation logs its failure and returns a safe
//! default instead. Only [`SyncClient::connect`] reports errors.

use super::channel::RpcChannel;
use super::endpoint::Endpoint;
use super::transport::{Connector, EndpointConnector};
use crate::config::{ClientOptions, IpcConfig};
use crate::error::Result;
use crate::models::{parse_menu, parse_status_updates, MenuItem, PathUpdate, SyncStatus};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn, Instrument, Span};

/// Client for a running CrossCloud core.
pub struct SyncClient<C: Connector = EndpointConnector> {
    channel: RpcChannel<C>,
    max_menu_depth: usize,
    span: Span,
}

impl SyncClient<EndpointConnector> {
    /// Client for the CrossCloud core of the current user, default options.
    pub fn new() -> Self {
        Self::for_app(IpcConfig::APP_ID, ClientOptions::default())
    }

    /// Client for the core registered under `app_id` for the current user.
    pub fn for_app(app_id: impl Into<String>, options: ClientOptions) -> Self {
        Self::with_connector(EndpointConnector::for_current_user(app_id), options)
    }

    /// Client for an explicit pipe or socket.
    pub fn for_endpoint(endpoint: Endpoint, options: ClientOptions) -> Self {
        Self::with_connector(EndpointConnector::fixed(endpoint), options)
    }
}

impl Default for SyncClient<EndpointConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> SyncClient<C> {
    /// Client over a custom connector. Does not connect yet.
    pub fn with_connector(connector: C, options: ClientOptions) -> Self {
        let span = options
            .span
            .clone()
            .unwrap_or_else(|| tracing::info_span!("sync_client"));
        Self {
            channel: RpcChannel::new(connector, &options),
            max_menu_depth: options.max_menu_depth,
            span,
        }
    }

    /// (Re)establish the connection to the core.
    ///
    /// Calls connect lazily on their own; use this to find out up front
    /// whether the core is reachable.
    pub async fn connect(&self) -> Result<()> {
        self.channel.connect().instrument(self.span.clone()).await
    }

    /// True when the last exchange broke the connection (or none was made).
    pub fn is_disconnected(&self) -> bool {
        self.channel.is_disconnected()
    }

    /// Close the connection. The next operation reconnects.
    pub async fn shutdown(&self) {
        self.channel.shutdown().instrument(self.span.clone()).await
    }

    pub fn connector(&self) -> &C {
        self.channel.connector()
    }

    /// Root directory the core synchronizes.
    ///
    /// Returns [`IpcConfig::SYNC_DIRECTORY_SENTINEL`] when the core cannot
    /// be asked. The sentinel never contains a real path, so callers can
    /// treat every file as outside the sync root.
    pub async fn get_sync_directory(&self) -> PathBuf {
        async {
            match self.channel.call("get_sync_directory", vec![]).await {
                Ok(Value::String(dir)) => PathBuf::from(dir),
                Ok(other) => {
                    warn!("get_sync_directory returned a non-string result: {}", other);
                    PathBuf::from(IpcConfig::SYNC_DIRECTORY_SENTINEL)
                }
                Err(e) => {
                    warn!("get_sync_directory failed: {}", e);
                    PathBuf::from(IpcConfig::SYNC_DIRECTORY_SENTINEL)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Overlay status of one path. Failures map to [`SyncStatus::Ignore`].
    pub async fn get_path_status(&self, path: &Path) -> SyncStatus {
        async {
            match self
                .channel
                .call("get_path_status", vec![path_param(path)])
                .await
            {
                Ok(result) => SyncStatus::from_result(&result),
                Err(e) => {
                    warn!("get_path_status failed for {}: {}", path.display(), e);
                    SyncStatus::Ignore
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Context menu for a selection of paths. Empty on failure.
    pub async fn get_context_menu<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<MenuItem> {
        async {
            match self
                .channel
                .call("get_context_menu", vec![paths_param(paths)])
                .await
            {
                Ok(result) => {
                    let menu = parse_menu(&result, self.max_menu_depth);
                    debug!("context menu for {} paths has {} items", paths.len(), menu.len());
                    menu
                }
                Err(e) => {
                    warn!("get_context_menu failed: {}", e);
                    Vec::new()
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Run a menu action on a selection of paths.
    ///
    /// Fire and forget: the core's result is ignored and failures are only
    /// logged.
    pub async fn perform_action<P: AsRef<Path>>(&self, action_id: &str, paths: &[P]) {
        async {
            let params = vec![json!(action_id), paths_param(paths)];
            if let Err(e) = self.channel.call("perform_action", params).await {
                warn!("perform_action '{}' failed: {}", action_id, e);
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Status changes the core queued since the last poll. Empty on failure.
    pub async fn get_status_updates(&self) -> Vec<PathUpdate> {
        async {
            match self.channel.call("get_status_updates", vec![]).await {
                Ok(result) => parse_status_updates(&result),
                Err(e) => {
                    warn!("get_status_updates failed: {}", e);
                    Vec::new()
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }
}

fn path_param(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

fn paths_param<P: AsRef<Path>>(paths: &[P]) -> Value {
    Value::Array(paths.iter().map(|p| path_param(p.as_ref())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IpcError;
    use crate::ipc::testing::{FakeCore, Reply};
    use crate::models::CheckState;
    use crate::platform::path_contains_file;

    fn client(core: &FakeCore) -> SyncClient<FakeCore> {
        SyncClient::with_connector(core.clone(), ClientOptions::default())
    }

    fn unreachable_core() -> FakeCore {
        let core = FakeCore::answering(json!("unused"));
        core.refuse_connections(true);
        core
    }

    #[tokio::test]
    async fn test_sync_directory() {
        let core = FakeCore::answering(json!("/home/alice/CrossCloud"));
        let client = client(&core);

        assert_eq!(
            client.get_sync_directory().await,
            PathBuf::from("/home/alice/CrossCloud")
        );

        let requests = core.requests();
        assert_eq!(requests[0].method, "get_sync_directory");
        assert_eq!(requests[0].params, None);
    }

    #[tokio::test]
    async fn test_sync_directory_sentinel_when_core_unreachable() {
        let client = client(&unreachable_core());

        let dir = client.get_sync_directory().await;
        assert_eq!(dir, PathBuf::from(IpcConfig::SYNC_DIRECTORY_SENTINEL));
        assert!(client.is_disconnected());

        // nothing real is ever inside the sentinel
        assert!(!path_contains_file(&dir, Path::new("/home/alice/CrossCloud/a.txt")));
        assert!(!path_contains_file(&dir, Path::new("a.txt")));
    }

    #[tokio::test]
    async fn test_sync_directory_sentinel_for_non_string_result() {
        let client = client(&FakeCore::answering(json!(42)));
        assert_eq!(
            client.get_sync_directory().await,
            PathBuf::from(IpcConfig::SYNC_DIRECTORY_SENTINEL)
        );
    }

    #[tokio::test]
    async fn test_path_status_mapping() {
        let core = FakeCore::new(|req| {
            let path = req.params.as_ref().and_then(|p| p[0].as_str()).unwrap_or("");
            match path {
                "/sync/busy.txt" => Reply::result(json!("Syncing")),
                "/sync/done.txt" => Reply::result(json!("Synced")),
                "/sync/odd.txt" => Reply::result(json!("Conflicted")),
                "/sync/num.txt" => Reply::result(json!(3)),
                _ => Reply::Envelope(json!({"error": {"code": 1, "message": "unknown path"}})),
            }
        });
        let client = client(&core);

        let cases = [
            ("/sync/busy.txt", SyncStatus::Syncing),
            ("/sync/done.txt", SyncStatus::Synced),
            ("/sync/odd.txt", SyncStatus::Ignore),
            ("/sync/num.txt", SyncStatus::Ignore),
            ("/elsewhere.txt", SyncStatus::Ignore),
        ];
        for (path, expected) in cases {
            assert_eq!(client.get_path_status(Path::new(path)).await, expected, "{}", path);
        }

        assert_eq!(core.requests()[0].params, Some(vec![json!("/sync/busy.txt")]));
    }

    #[tokio::test]
    async fn test_path_status_ignore_when_disconnected() {
        let client = client(&unreachable_core());
        assert_eq!(
            client.get_path_status(Path::new("/sync/a.txt")).await,
            SyncStatus::Ignore
        );
    }

    #[tokio::test]
    async fn test_path_status_ignore_after_hangup() {
        let core = FakeCore::new(|_| Reply::Hangup);
        let client = client(&core);

        assert_eq!(
            client.get_path_status(Path::new("/sync/a.txt")).await,
            SyncStatus::Ignore
        );
        assert!(client.is_disconnected());
    }

    #[tokio::test]
    async fn test_context_menu() {
        let core = FakeCore::answering(json!([
            {"name": "Share", "enabled": true, "actionId": "share", "children": []},
            {"name": "Broken", "enabled": "yes", "actionId": "broken", "children": []},
            {"name": "Sync", "enabled": true, "actionId": "", "children": [
                {"name": "Always", "enabled": true, "actionId": "pin", "checked": true, "children": []},
                {"name": "Never", "enabled": false, "actionId": "unpin", "checked": false, "children": []}
            ]}
        ]));
        let client = client(&core);

        let menu = client
            .get_context_menu(&[PathBuf::from("/sync/a.txt"), PathBuf::from("/sync/b")])
            .await;

        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].name, "Share");
        assert_eq!(menu[0].checked, CheckState::Undefined);
        assert_eq!(menu[1].children.len(), 2);
        assert_eq!(menu[1].children[0].checked, CheckState::Checked);
        assert_eq!(menu[1].children[1].checked, CheckState::Unchecked);
        assert!(!menu[1].children[1].enabled);

        assert_eq!(
            core.requests()[0].params,
            Some(vec![json!(["/sync/a.txt", "/sync/b"])])
        );
    }

    #[tokio::test]
    async fn test_context_menu_depth_follows_options() {
        let core = FakeCore::answering(json!([
            {"name": "a", "enabled": true, "actionId": "a", "children": [
                {"name": "b", "enabled": true, "actionId": "b", "children": []}
            ]}
        ]));
        let client = SyncClient::with_connector(
            core.clone(),
            ClientOptions::default().with_max_menu_depth(1),
        );

        let menu = client.get_context_menu(&["/sync/a"]).await;
        assert_eq!(menu.len(), 1);
        assert!(menu[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_context_menu_empty_on_failure() {
        let client = client(&unreachable_core());
        assert!(client.get_context_menu(&["/sync/a"]).await.is_empty());

        let client = client_answering_error();
        assert!(client.get_context_menu(&["/sync/a"]).await.is_empty());
    }

    fn client_answering_error() -> SyncClient<FakeCore> {
        client(&FakeCore::new(|_| {
            Reply::Envelope(json!({"error": {"code": -32603, "message": "internal"}}))
        }))
    }

    #[tokio::test]
    async fn test_perform_action_params() {
        let core = FakeCore::answering(json!(null));
        let client = client(&core);

        client
            .perform_action("share", &[Path::new("/sync/a.txt"), Path::new("/sync/b")])
            .await;

        let requests = core.requests();
        assert_eq!(requests[0].method, "perform_action");
        assert_eq!(
            requests[0].params,
            Some(vec![json!("share"), json!(["/sync/a.txt", "/sync/b"])])
        );
    }

    #[tokio::test]
    async fn test_perform_action_swallows_failures() {
        client_answering_error().perform_action("share", &["/sync/a"]).await;
        client(&unreachable_core()).perform_action("share", &["/sync/a"]).await;
    }

    #[tokio::test]
    async fn test_status_updates() {
        let core = FakeCore::answering(json!([
            {"path": "/sync/a.txt", "status": "Synced"},
            {"path": "/sync/b.txt"},
            {"path": "/sync/c.txt", "status": "Syncing"}
        ]));
        let client = client(&core);

        let updates = client.get_status_updates().await;
        assert_eq!(
            updates,
            vec![
                PathUpdate {
                    path: PathBuf::from("/sync/a.txt"),
                    status: SyncStatus::Synced
                },
                PathUpdate {
                    path: PathBuf::from("/sync/c.txt"),
                    status: SyncStatus::Syncing
                },
            ]
        );

        assert!(client_answering_error().get_status_updates().await.is_empty());
    }

    #[tokio::test]
    async fn test_connect_reports_connection_error() {
        let client = client(&unreachable_core());
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, IpcError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_operations_recover_after_core_restart() {
        let core = FakeCore::answering(json!("Synced"));
        core.refuse_connections(true);
        let client = client(&core);

        assert_eq!(client.get_path_status(Path::new("/sync/a")).await, SyncStatus::Ignore);

        core.refuse_connections(false);
        assert_eq!(client.get_path_status(Path::new("/sync/a")).await, SyncStatus::Synced);
        assert!(!client.is_disconnected());

        client.shutdown().await;
        assert!(client.is_disconnected());
    }

    #[tokio::test]
    async fn test_injected_span() {
        let span = tracing::info_span!("explorer_overlay", pid = 42);
        let client = SyncClient::with_connector(
            FakeCore::answering(json!("Synced")),
            ClientOptions::default().with_span(span),
        );
        assert_eq!(client.get_path_status(Path::new("/sync/a")).await, SyncStatus::Synced);
    }
}
