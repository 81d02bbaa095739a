use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bookmark_host::config::{Cli, Command, Config};
use bookmark_host::db::Database;
use bookmark_host::handler::{AppState, routes};
use bookmark_host::logging;
use bookmark_host::manifest::{Browser, Manifest, default_host_path};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();

    if let Some(Command::Manifest { browser, allowed, path }) = args.command {
        if let Err(e) = print_manifest(browser, &allowed, path) {
            eprintln!("failed to build manifest: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    logging::init_console();
    tracing::info!("bookmark-host starting");

    let mut cfg = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        tracing::error!("failed to load config file: {:#}", e);
        std::process::exit(1);
    });
    cfg.override_database(args.database);
    cfg.override_port(args.port);

    let db = Database::from_config(&cfg).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to open database");
        std::process::exit(1);
    });
    if let Err(e) = db.ensure_schema().await {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }

    let address = cfg.app.address();
    let app = routes(
        AppState { db: Arc::new(db) },
        cfg.app.get_max_concurrent_requests(),
        cfg.native.max_message_bytes,
    );

    let listener = tokio::net::TcpListener::bind(address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let cancellation_token = CancellationToken::new();
    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        }
        cancellation_token.cancel();
    });

    tracing::info!("bookmark-host running on http://{}", &address);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await;

    if let Err(err) = served {
        tracing::error!(error = %err, "server failed");
        std::process::exit(1);
    }
    tracing::info!("server stopped");
}

fn print_manifest(browser: Browser, allowed: &[String], path: Option<PathBuf>) -> Result<()> {
    let host_path = match path {
        Some(p) => p,
        None => default_host_path()?,
    };
    let manifest = Manifest::new(browser, &host_path, allowed);
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}
