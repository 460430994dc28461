// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for building a year in review.

use crate::error::{AppError, Result};
use crate::models::{Activity, Athlete, WrappedStats};
use crate::services::stats::process_activities_now;
use crate::services::strava::{fetch_year_with_refresh, Credentials, TokenRefreshResponse};
use crate::services::years::{available_years_now, filter_by_year};
use crate::services::import_archive;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes. The upload size limit is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/import", post(import_export))
        .route("/api/stats", post(compute_stats))
        .route("/api/strava/wrapped", post(strava_wrapped))
}

// ─── Archive Import ──────────────────────────────────────────

#[derive(Deserialize)]
struct ImportQuery {
    year: Option<i32>,
}

/// Imported export with the statistics of the selected year.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ImportResponse {
    pub athlete: Athlete,
    pub activities: Vec<Activity>,
    pub available_years: Vec<i32>,
    pub selected_year: i32,
    pub stats: WrappedStats,
}

/// Import a Strava bulk export sent as the raw request body.
///
/// The full activity list is returned so the client can switch years
/// through `/api/stats` without uploading again.
async fn import_export(
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportResponse>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Empty upload".to_string()));
    }

    let size = body.len();
    let export = tokio::task::spawn_blocking(move || import_archive(&body))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Import task failed: {}", e)))??;

    let available_years = available_years_now(&export.activities);
    let selected_year = query
        .year
        .or_else(|| available_years.first().copied())
        .unwrap_or_else(|| Local::now().year());

    let stats = process_activities_now(&filter_by_year(&export.activities, selected_year));

    tracing::info!(
        bytes = size,
        activities = export.activities.len(),
        selected_year,
        year_activities = stats.total_activities,
        "Export imported"
    );

    Ok(Json(ImportResponse {
        athlete: export.athlete,
        activities: export.activities,
        available_years,
        selected_year,
        stats,
    }))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StatsRequest {
    pub activities: Vec<Activity>,
    pub year: i32,
}

/// Aggregate the given activities for one year.
async fn compute_stats(Json(request): Json<StatsRequest>) -> Result<Json<WrappedStats>> {
    let year_activities = filter_by_year(&request.activities, request.year);
    tracing::debug!(
        year = request.year,
        total = request.activities.len(),
        in_year = year_activities.len(),
        "Computing stats"
    );
    Ok(Json(process_activities_now(&year_activities)))
}

// ─── Strava API ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedRequest {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub year: i32,
}

/// A year fetched from Strava with its statistics.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WrappedResponse {
    pub activities: Vec<Activity>,
    pub stats: WrappedStats,
    /// Replacement tokens, present only when a refresh happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenRefreshResponse>,
}

/// Fetch a year of activities from Strava and aggregate them.
async fn strava_wrapped(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WrappedRequest>,
) -> Result<Json<WrappedResponse>> {
    if request.access_token.trim().is_empty() {
        return Err(AppError::BadRequest("Missing access token".to_string()));
    }

    let credentials = Credentials {
        access_token: request.access_token,
        refresh_token: request.refresh_token.filter(|t| !t.is_empty()),
    };

    let fetched = fetch_year_with_refresh(&state.strava, &credentials, request.year).await?;
    let stats = process_activities_now(&fetched.activities);

    tracing::info!(
        year = request.year,
        activities = fetched.activities.len(),
        refreshed = fetched.refreshed.is_some(),
        "Strava year fetched"
    );

    Ok(Json(WrappedResponse {
        activities: fetched.activities,
        stats,
        tokens: fetched.refreshed,
    }))
}
