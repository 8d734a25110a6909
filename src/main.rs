// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gymlog API Server
//!
//! Serves workout scheduling, session logging and quota-gated AI workout
//! generation.

use gymlog::{
    clock::{SharedClock, SystemClock},
    config::{Config, StorageBackend},
    db::FirestoreDb,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        storage = ?config.storage_backend,
        "Starting Gymlog API"
    );

    let db = match config.storage_backend {
        StorageBackend::Firestore => FirestoreDb::new(&config.gcp_project_id).await?,
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            FirestoreDb::new_in_memory()
        }
    };

    if config.ai_api_key.is_none() {
        tracing::warn!("AI_API_KEY not set; workout generation is disabled");
    }

    let clock: SharedClock = Arc::new(SystemClock);
    let state = Arc::new(AppState::new(config.clone(), db, clock)?);

    // Reclaim expired rate limit windows for the life of the process
    let _sweepers = state.ai_quota.spawn_sweepers();

    // Build router
    let app = gymlog::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gymlog=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
