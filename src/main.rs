//! Papers server - interactive papers listing.
//!
//! Serves the listing at `/` with filters, sorting, selection exports,
//! per-paper notes and a theme toggle. Configuration comes from the
//! environment; see `papers::Config::from_env`.

use std::sync::Arc;

use tracing::{error, info};

use papers::{handlers, logging, AppState, Config};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    if let Err(e) = logging::init() {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    let config = Config::from_env();
    let state = match AppState::open(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!(error = %e, "failed to load papers");
            std::process::exit(1);
        }
    };

    let bind_addr = state.config.bind_addr.clone();
    info!(
        cards = %state.config.cards_path.display(),
        db = %state.config.db_path.display(),
        "configuration loaded"
    );

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind server address");

    info!("Papers server running at http://{}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
