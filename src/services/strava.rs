// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for fetching a year of activities.
//!
//! Handles:
//! - Paginated activity listing over a calendar year
//! - Token refresh when the access token is rejected
//! - Rate limit detection

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;
use crate::models::Activity;

pub const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
pub const STRAVA_OAUTH_BASE: &str = "https://www.strava.com/oauth";

/// Page size used when walking a year of activities (Strava's maximum).
pub const ACTIVITIES_PER_PAGE: u32 = 200;

/// OAuth application credentials used for token refresh.
#[derive(Clone)]
struct OAuthCredentials {
    client_id: String,
    client_secret: String,
}

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    api_base: String,
    oauth_base: String,
    credentials: Option<OAuthCredentials>,
}

impl StravaClient {
    /// Create a new Strava client. Token refresh is only available when
    /// both OAuth credentials are supplied.
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        let credentials = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(OAuthCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        Self {
            http: reqwest::Client::new(),
            api_base: STRAVA_API_BASE.to_string(),
            oauth_base: STRAVA_OAUTH_BASE.to_string(),
            credentials,
        }
    }

    /// Point the client at different API and OAuth hosts.
    pub fn with_base_urls(mut self, api_base: impl Into<String>, oauth_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.oauth_base = oauth_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether this client holds credentials for token refresh.
    pub fn can_refresh(&self) -> bool {
        self.credentials.is_some()
    }

    /// List one page of the athlete's activities between two Unix timestamps.
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        before: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Activity>, AppError> {
        let url = format!("{}/athlete/activities", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("after", after.to_string()),
                ("before", before.to_string()),
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Fetch every activity started during `year`.
    ///
    /// Pages are requested until one comes back empty or short.
    pub async fn get_activities_for_year(
        &self,
        access_token: &str,
        year: i32,
    ) -> Result<Vec<Activity>, AppError> {
        let (after, before) = year_bounds(year)?;

        let mut activities = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .list_activities(access_token, after, before, page, ACTIVITIES_PER_PAGE)
                .await?;
            let count = batch.len();
            activities.extend(batch);

            if count < ACTIVITIES_PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        tracing::debug!(year, pages = page, count = activities.len(), "Fetched Strava activities");
        Ok(activities)
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenRefreshResponse, AppError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AppError::SessionExpired)?;

        let response = self
            .http
            .post(format!("{}/token", self.oauth_base))
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token refresh request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Strava rate limit hit (429)");
                return Err(AppError::StravaApi(AppError::STRAVA_RATE_LIMIT.to_string()));
            }

            if status.as_u16() == 401 {
                return Err(AppError::Unauthorized);
            }

            return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))
    }
}

/// Unix timestamps for Jan 1 00:00:00 and Dec 31 23:59:59 UTC of `year`.
fn year_bounds(year: i32) -> Result<(i64, i64), AppError> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    let end = NaiveDate::from_ymd_opt(year, 12, 31).and_then(|d| d.and_hms_opt(23, 59, 59));
    match (start, end) {
        (Some(start), Some(end)) => Ok((unix(start), unix(end))),
        _ => Err(AppError::BadRequest(format!("Invalid year: {}", year))),
    }
}

fn unix(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp()
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Tokens a caller presents for a fetch.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// A year of activities, plus the replacement tokens if a refresh happened.
#[derive(Debug, Clone)]
pub struct YearFetch {
    pub activities: Vec<Activity>,
    pub refreshed: Option<TokenRefreshResponse>,
}

/// Fetch a year of activities, refreshing the access token at most once.
///
/// A rejected access token is refreshed when a refresh token is available
/// and the fetch retried. If either the refresh or the retry fails the
/// session is considered expired.
pub async fn fetch_year_with_refresh(
    client: &StravaClient,
    credentials: &Credentials,
    year: i32,
) -> Result<YearFetch, AppError> {
    match client
        .get_activities_for_year(&credentials.access_token, year)
        .await
    {
        Ok(activities) => {
            return Ok(YearFetch {
                activities,
                refreshed: None,
            })
        }
        Err(AppError::Unauthorized) => {}
        Err(e) => return Err(e),
    }

    let Some(refresh_token) = credentials.refresh_token.as_deref() else {
        tracing::info!(year, "Access token rejected and no refresh token supplied");
        return Err(AppError::SessionExpired);
    };

    tracing::info!(year, "Access token rejected, refreshing");
    let tokens = client.refresh_token(refresh_token).await.map_err(|e| {
        tracing::warn!(error = %e, "Token refresh failed");
        AppError::SessionExpired
    })?;

    let activities = client
        .get_activities_for_year(&tokens.access_token, year)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Fetch failed after token refresh");
            AppError::SessionExpired
        })?;

    Ok(YearFetch {
        activities,
        refreshed: Some(tokens),
    })
}
