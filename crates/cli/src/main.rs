//! CLI entrypoint.

mod config;
mod repl;

use chat::ChatController;
use clap::Parser;
use config::Config;
use gateway::HttpGateway;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments.
#[derive(Parser)]
#[command(name = "medilink")]
#[command(about = "Medical assistant chat client", version = "0.1.0")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Enable debug logging to ~/.medilink/logs/
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Override the remote service base URL
    #[arg(short, long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Console logging stays quiet by default so it does not interleave with
    // the REPL; --debug adds a daily-rotated file layer.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    if cli.debug {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let log_dir = std::path::PathBuf::from(home).join(".medilink").join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);

        let console = fmt::layer().with_target(false).with_filter(console_filter);
        let file = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug,hyper_util=info,reqwest=info"));
        tracing_subscriber::registry().with(console).with(file).init();
    } else {
        _file_guard = None;
        fmt()
            .with_env_filter(console_filter)
            .with_target(false)
            .init();
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url;
    }
    info!(base_url = %config.api_base_url, "medilink starting");

    let gateway = HttpGateway::new(config.gateway_config(), config.auth_context());
    let mut controller = ChatController::new(gateway);

    // Populate the sidebar up front; an unreachable server should not keep
    // the REPL from starting.
    if let Err(e) = controller.refresh_sessions().await {
        warn!(error = %e, "initial session list load failed");
        eprintln!("Warning: could not load sessions: {e}");
    }

    repl::run(&mut controller).await
}
