//! snippetbox web server

use anyhow::{Context, Result};
use clap::Parser;
use snippetbox::{config::SnippetboxConfig, observability, routes, state::AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// How often expired sessions are purged
const SESSION_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Parser)]
#[command(name = "snippetbox")]
#[command(version)]
#[command(about = "Server-rendered snippet sharing", long_about = None)]
struct Cli {
    /// HTTP network address
    #[arg(long)]
    addr: Option<String>,

    /// Directory served under /static/
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// MySQL data source name
    #[arg(long, env = "SNIPPETBOX_DSN")]
    dsn: Option<String>,

    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut SnippetboxConfig) {
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(static_dir) = self.static_dir {
            config.server.static_dir = static_dir;
        }
        if let Some(dsn) = self.dsn {
            config.database.url = Some(dsn);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init()?;

    let mut config = SnippetboxConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let addr = config.server.addr.clone();
    let state = AppState::connect(config).await?;
    let reaper = state.sessions().spawn_reaper(SESSION_REAP_INTERVAL);
    let app = routes::routes(&state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "starting server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    reaper.abort();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
