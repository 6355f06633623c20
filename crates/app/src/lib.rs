//! HTTP front of the vocabulary service.
//!
//! `GET` answers a learner's progress in one category, `POST` selects, records
//! and returns the next word. Both are mounted on `/` and `/vocabulary`.
//! Progress lives in memory and is flushed to `SQLite` by a background task
//! every `VOCAB_FLUSH_INTERVAL_SECS`, when the write-back journal fills up,
//! and once more on shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::Method, routing::get};
use services::{AppServices, Clock};
use storage::catalog::JsonCatalog;
use tokio::{
    net::TcpListener,
    signal,
    sync::watch,
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::{Config, prepare_sqlite_file};
use error::ServerError;
use routes::{overview_handler, word_handler};
use state::AppState;

/// Routes with permissive CORS; preflight requests are answered by the layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(overview_handler).post(word_handler))
        .route("/vocabulary", get(overview_handler).post(word_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the server and block until a shutdown signal.
///
/// # Errors
///
/// Returns `ServerError` if the database, catalog or listener cannot be set up,
/// or if the final flush on shutdown fails.
pub async fn run(config: Config) -> Result<(), ServerError> {
    info!("Initializing state...");
    prepare_sqlite_file(&config.db_url)?;
    let catalog = JsonCatalog::load_dir(&config.catalog_dir)?;
    let services = AppServices::new_sqlite(
        &config.db_url,
        Arc::new(catalog),
        Clock::default(),
        config.store_settings(),
    )
    .await?;
    for (category, count) in services.registry().categories() {
        info!(%category, count, "Category loaded");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flusher = spawn_flusher(services.clone(), config.flush_interval, shutdown_rx);

    let app = router(AppState::new(&services));
    let address = config.socket_addr();
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Server shutting down...");
    if shutdown_tx.send(true).is_err() {
        debug!("Flush task already stopped");
    }
    if let Err(err) = flusher.await {
        warn!(%err, "Flush task ended abnormally");
    }
    let report = services.flush().await?;
    info!(
        written = report.written,
        cleared = report.cleared,
        "Final progress flush complete"
    );

    served?;
    Ok(())
}

fn spawn_flusher(
    services: AppServices,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = services.flush().await {
                        error!(%err, "Periodic progress flush failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Flush task stopped");
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(%err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                error!(%err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
