// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava Wrapped: a year in review for Strava athletes
//!
//! This crate provides the backend API that imports a Strava bulk export
//! (or fetches a year from the Strava API) and aggregates it into
//! year-in-review statistics.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::StravaClient;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub strava: StravaClient,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let strava = StravaClient::new(
            config.strava_client_id.clone(),
            config.strava_client_secret.clone(),
        );
        Self { config, strava }
    }
}
