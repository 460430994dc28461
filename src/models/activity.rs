// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model shared by the export importer and the Strava API client.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::services::track::{decode_route, encode_route};
use crate::time_utils::parse_local_timestamp;

/// A `[latitude, longitude]` pair in degrees.
pub type LatLng = [f64; 2];

/// Sport label used when the source does not provide one.
pub const DEFAULT_ACTIVITY_TYPE: &str = "Workout";

/// One recorded exercise session.
///
/// Field names follow Strava's `SummaryActivity` JSON so that activities
/// fetched from the API and activities imported from an export archive
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Activity {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: f64,
    /// Elapsed time in seconds
    #[serde(default)]
    pub elapsed_time: f64,
    /// Elevation gain in meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(rename = "type", default = "default_activity_type")]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: String,
    /// Absolute start instant (RFC 3339, UTC)
    pub start_date: String,
    /// Start time in the athlete's recording timezone. All calendar
    /// bucketing uses this field.
    pub start_date_local: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub kudos_count: u32,
    #[serde(default)]
    pub achievement_count: u32,
    /// Average speed in m/s
    #[serde(default)]
    pub average_speed: f64,
    /// Max speed in m/s
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_heartrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_heartrate: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_latlng")]
    pub start_latlng: Option<LatLng>,
    #[serde(default, deserialize_with = "deserialize_latlng")]
    pub end_latlng: Option<LatLng>,
    #[serde(default)]
    pub location_city: Option<String>,
    #[serde(default)]
    pub location_state: Option<String>,
    #[serde(default)]
    pub location_country: Option<String>,
    #[serde(default)]
    pub map: Option<ActivityMap>,
}

fn default_activity_type() -> String {
    DEFAULT_ACTIVITY_TYPE.to_string()
}

/// Strava sends `[]` for activities without GPS, so accept any length and
/// keep only well-formed pairs.
fn deserialize_latlng<'de, D>(deserializer: D) -> Result<Option<LatLng>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<f64>> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match v.as_slice() {
        [lat, lng] => Some([*lat, *lng]),
        _ => None,
    }))
}

impl Activity {
    /// Sport label, preferring `sport_type` over the legacy `type` field.
    pub fn sport(&self) -> &str {
        if self.sport_type.is_empty() {
            &self.activity_type
        } else {
            &self.sport_type
        }
    }

    /// Parsed local start time, if the timestamp is well-formed.
    pub fn local_start(&self) -> Option<NaiveDateTime> {
        parse_local_timestamp(&self.start_date_local)
    }

    /// Encoded route, if the activity carries a non-empty one.
    pub fn polyline(&self) -> Option<&str> {
        self.map
            .as_ref()
            .map(|m| m.summary_polyline.as_str())
            .filter(|p| !p.is_empty())
    }

    /// Decoded route coordinates.
    pub fn route(&self) -> Option<Vec<LatLng>> {
        self.polyline().and_then(decode_route)
    }

    /// Attach a decoded track. Tracks with fewer than two points are ignored.
    ///
    /// Returns `true` if a route was attached.
    pub fn attach_route(&mut self, coords: &[LatLng]) -> bool {
        let Some(map) = ActivityMap::from_coords(self.id, coords) else {
            return false;
        };
        self.start_latlng = coords.first().copied();
        self.end_latlng = coords.last().copied();
        self.map = Some(map);
        true
    }
}

/// Activity map data with polylines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityMap {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub summary_polyline: String,
    #[serde(default)]
    pub polyline: Option<String>,
}

fn deserialize_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ActivityMap {
    /// Build a map from decoded coordinates.
    ///
    /// Returns `None` for fewer than two points or if encoding fails, so a
    /// map never exists without both its coordinates and its encoded form.
    pub fn from_coords(activity_id: u64, coords: &[LatLng]) -> Option<Self> {
        if coords.len() < 2 {
            return None;
        }
        let encoded = encode_route(coords)?;
        Some(Self {
            id: format!("map_{}", activity_id),
            summary_polyline: encoded.clone(),
            polyline: Some(encoded),
        })
    }
}
