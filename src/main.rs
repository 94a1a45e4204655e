//! Site server entry point.
//!
//! Loads configuration, discovers modules and serves them until SIGINT or
//! SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use site_server::config::load_or_default;
use site_server::lifecycle::{self, signals, Shutdown};
use site_server::models::ModelCatalog;
use site_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "site-server")]
#[command(about = "Serves a directory of web modules", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the modules directory
    #[arg(short, long)]
    modules: Option<PathBuf>,

    /// Enable development mode (template and model reload)
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(modules) = cli.modules {
        config.site.modules_dir = modules;
    }
    if cli.dev {
        config.site.dev = true;
    }

    logging::init(&config.observability)?;
    tracing::info!("site-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        modules_dir = %config.site.modules_dir.display(),
        dev = config.site.dev,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let users = lifecycle::user_directory(&config);
    let site = lifecycle::build_site(config, ModelCatalog::with_builtins(), users).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = tokio::spawn(site.server.run(listener, receiver));

    signals::wait_for_shutdown(&shutdown).await;
    server.await??;

    drop(site.watchers);
    tracing::info!("Shutdown complete");
    Ok(())
}
