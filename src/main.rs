// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava Wrapped API Server
//!
//! Turns a Strava bulk export or a year of Strava API activities into
//! year-in-review statistics.

use std::sync::Arc;
use strava_wrapped::{config::Config, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        max_upload_bytes = config.max_upload_bytes,
        token_refresh = config.strava_client_secret.is_some(),
        "Starting Strava Wrapped API"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config));
    let app = strava_wrapped::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strava_wrapped=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
