//! CrossCloud IPC probe - talks to a running sync core the way a shell
//! extension does.
//!
//! Every subcommand prints one JSON document to stdout; logs go to stderr.
//! Like the shell integrations, queries fall back to their defaults when the
//! core is unreachable, so check the log output (or `running`) when an answer
//! looks empty.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crosscloud_ipc::platform::core_running_at;
use crosscloud_ipc::{
    core_running, flatten_leaves, ClientOptions, Endpoint, IpcConfig, MenuItem, PathUpdate,
    SyncClient,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "crosscloud-ipc-probe")]
#[command(about = "Query a running CrossCloud core over its shell extension IPC")]
struct Args {
    /// Domain socket to connect to instead of the current user's default
    #[arg(long, global = true, conflicts_with = "pipe_user")]
    socket: Option<PathBuf>,

    /// Connect to the named pipe of this user instead of the current one
    #[arg(long, global = true)]
    pipe_user: Option<String>,

    /// Application id the core registers its endpoint under
    #[arg(long, global = true, default_value = IpcConfig::APP_ID)]
    app_id: String,

    /// Read/write timeout per message in milliseconds (0 = wait forever)
    #[arg(long, global = true, default_value = "5000")]
    timeout_ms: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Print the directory the core synchronizes
    SyncDir,
    /// Print the overlay status of one or more paths
    Status {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the context menu for a selection of paths
    Menu {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print only the leaf items, as Finder shows them
        #[arg(long)]
        flat: bool,
    },
    /// Run a menu action on a selection of paths
    Action {
        action_id: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the status changes queued by the core
    Updates,
    /// Check the core's lockfile to see whether it is running
    Running {
        /// Lockfile to check instead of the default location
        #[arg(long)]
        lockfile: Option<PathBuf>,
    },
}

impl Args {
    fn endpoint(&self) -> Result<Endpoint> {
        if let Some(socket) = &self.socket {
            return Ok(Endpoint::UnixSocket(socket.clone()));
        }
        if let Some(user) = &self.pipe_user {
            return Ok(Endpoint::named_pipe_for(&self.app_id, user));
        }
        Ok(Endpoint::for_current_user(&self.app_id)?)
    }

    fn options(&self) -> ClientOptions {
        let io_timeout = match self.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        ClientOptions::new().with_io_timeout(io_timeout)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging, RUST_LOG overrides --debug
    FmtSubscriber::builder()
        .with_env_filter(log_filter(args.debug, std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let output = match &args.command {
        Command::Running { lockfile } => render_running(lockfile.as_deref()),
        command => {
            let endpoint = args.endpoint()?;
            info!("Probing core at {}", endpoint);

            let client = SyncClient::for_endpoint(endpoint, args.options());
            if let Err(e) = client.connect().await {
                warn!("Core unreachable, answers are defaults: {}", e);
            }
            run(&client, command).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(client: &SyncClient, command: &Command) -> Result<Value> {
    let output = match command {
        Command::SyncDir => render_sync_dir(&client.get_sync_directory().await),
        Command::Status { paths } => {
            let mut statuses = Vec::with_capacity(paths.len());
            for path in paths {
                statuses.push(PathUpdate {
                    path: path.clone(),
                    status: client.get_path_status(path).await,
                });
            }
            serde_json::to_value(statuses)?
        }
        Command::Menu { paths, flat } => {
            let menu = client.get_context_menu(paths.as_slice()).await;
            render_menu(&menu, *flat)?
        }
        Command::Action { action_id, paths } => {
            client.perform_action(action_id, paths.as_slice()).await;
            json!({
                "actionId": action_id,
                "paths": paths.len(),
                "connected": !client.is_disconnected(),
            })
        }
        Command::Updates => serde_json::to_value(client.get_status_updates().await)?,
        Command::Running { lockfile } => render_running(lockfile.as_deref()),
    };
    Ok(output)
}

fn log_filter(debug: bool, rust_log: Option<&str>) -> EnvFilter {
    let default = if debug { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

fn render_sync_dir(dir: &Path) -> Value {
    let available = dir != Path::new(IpcConfig::SYNC_DIRECTORY_SENTINEL);
    let sync_directory = if available {
        Value::from(dir.to_string_lossy())
    } else {
        Value::Null
    };
    json!({ "syncDirectory": sync_directory, "available": available })
}

fn render_menu(menu: &[MenuItem], flat: bool) -> Result<Value> {
    if flat {
        Ok(serde_json::to_value(flatten_leaves(menu))?)
    } else {
        Ok(serde_json::to_value(menu)?)
    }
}

fn render_running(lockfile: Option<&Path>) -> Value {
    let running = match lockfile {
        Some(path) => core_running_at(path),
        None => core_running(),
    };
    json!({ "running": running })
}
