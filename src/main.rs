//! streamchat - terminal client for a streaming chat backend.

use clap::Parser;
use std::path::PathBuf;
use streamchat::clipboard::system_clipboard;
use streamchat::config::APP_DIR;
use streamchat::render::RenderStyle;
use streamchat::{
    connection, ui, ChatApp, ClientConfig, ConfigOverrides, ConnectionManager, DesktopNotifier,
    EventBus, ExportClient, Highlighter, MarkdownRenderer, Notifications, PermissionStore,
    WsConnector, XdgDirs,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Chat with a streaming assistant backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "streamchat")]
#[command(version, about, long_about = None)]
struct Args {
    /// WebSocket endpoint of the chat backend
    #[arg(long, env = "STREAMCHAT_URL")]
    url: Option<String>,

    /// Base URL of the HTTP API (used for exports)
    #[arg(long, env = "STREAMCHAT_HTTP_BASE")]
    http_base: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/streamchat/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory exported conversations are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Guess tool activity from the streamed text
    #[arg(long)]
    detect_tools: bool,

    /// Back off exponentially between reconnect attempts
    #[arg(long)]
    backoff: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ws_url: self.url.clone(),
            http_base: self.http_base.clone(),
            export_dir: self.export_dir.clone(),
            detect_tools: self.detect_tools,
            backoff: self.backoff,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dirs = XdgDirs::new();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(args, dirs))
}

/// Log to a file in the state directory; the terminal belongs to the UI.
fn init_logging(args: &Args, dirs: &XdgDirs) -> anyhow::Result<()> {
    let default_filter = if args.verbose {
        "trace"
    } else if args.debug {
        "debug"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    dirs.ensure_dirs()?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dirs.log_file())?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file)),
        )
        .init();

    if args.debug || args.verbose {
        tracing::info!("Debug logging enabled");
    }
    Ok(())
}

async fn run(args: Args, dirs: XdgDirs) -> anyhow::Result<()> {
    init_logging(&args, &dirs)?;

    let config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::load_or_default(&dirs.config_file())?,
    }
    .with_overrides(args.overrides());

    tracing::info!(
        ws_url = %config.ws_url,
        http_base = %config.http_base,
        reconnect = ?config.reconnect,
        "Starting streamchat"
    );

    let bus = EventBus::new();
    let sender = bus.sender();

    let (handle, link) = connection::channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let manager = ConnectionManager::new(
        config.ws_url.clone(),
        config.reconnect,
        WsConnector,
        sender.clone(),
    );
    let connection_task = manager.spawn(link, shutdown_rx);

    let notifications = Notifications::new(
        Some(Box::new(DesktopNotifier::new(APP_DIR))),
        Some(PermissionStore::new(&dirs.state)),
    );
    let renderer = MarkdownRenderer::with_style(
        RenderStyle::default(),
        Highlighter::with_theme(&config.theme),
    );
    let app = ChatApp::new(handle)
        .with_notifications(notifications)
        .with_clipboard(system_clipboard())
        .with_renderer(renderer)
        .with_tool_detection(config.detect_tools);

    let exporter = ExportClient::new(config.http_base.clone(), config.resolved_export_dir(&dirs));

    let result = ui::run(app, bus.into_receiver(), sender, exporter).await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = connection_task.await {
        tracing::warn!(error = %e, "Connection task ended abnormally");
    }
    tracing::info!("Exiting");
    result
}
