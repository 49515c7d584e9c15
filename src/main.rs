// src/main.rs

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use pdms::api::build_router;
use pdms::config::CONFIG;
use pdms::db;
use pdms::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "pdms")]
#[command(about = "Project document management service")]
struct Args {
    /// Address to bind (overrides PDMS_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PDMS_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

/// Graceful shutdown signal handler for SIGTERM and Ctrl+C
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = CONFIG.clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.logging.tracing_level())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    config.validate()?;
    info!("Starting PDMS");
    info!(storage = %config.storage.root_dir, "document storage");

    let pool = db::init(&config.database, &config.auth).await?;
    let bind_address = config.bind_address();
    let state = Arc::new(AppState::from_config(pool.clone(), config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("HTTP server listening on http://{}", bind_address);
    info!("Health endpoints: /health, /live");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
