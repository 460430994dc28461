// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_MAX_UPLOAD_MB: usize = 512;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Strava OAuth client ID; token refresh is disabled without it
    pub strava_client_id: Option<String>,
    /// Strava OAuth client secret
    pub strava_client_secret: Option<String>,
    /// Largest accepted export archive, in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            strava_client_id: Some("test_client_id".to_string()),
            strava_client_secret: Some("test_secret".to_string()),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first
    /// if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match non_empty("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT", v))?,
            None => DEFAULT_PORT,
        };

        let max_upload_mb: usize = match non_empty("MAX_UPLOAD_MB") {
            Some(v) => match v.parse() {
                Ok(mb) if mb > 0 => mb,
                _ => return Err(ConfigError::Invalid("MAX_UPLOAD_MB", v)),
            },
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        Ok(Self {
            port,
            frontend_url: non_empty("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            strava_client_id: non_empty("STRAVA_CLIENT_ID"),
            strava_client_secret: non_empty("STRAVA_CLIENT_SECRET"),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
