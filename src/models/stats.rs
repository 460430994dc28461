//! Year-in-review aggregates.
//!
//! These are derived from an activity collection and never stored on their
//! own; a year change recomputes them from scratch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Activity;

/// Month labels used as `monthly_distribution` keys, in calendar order.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Summary statistics rendered by the story slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WrappedStats {
    // ─── Totals ──────────────────────────────────────────────────
    /// Total distance (km)
    pub total_distance: f64,
    /// Total moving time (hours)
    pub total_time: f64,
    /// Total elevation gain (meters)
    pub total_elevation: f64,
    pub total_activities: u32,
    pub total_kudos: u32,

    // ─── Extremes ────────────────────────────────────────────────
    pub longest_activity: Option<Activity>,
    /// Fastest run or ride by average speed
    pub fastest_activity: Option<Activity>,
    pub personal_bests: PersonalBests,

    // ─── Breakdowns ──────────────────────────────────────────────
    /// Activity count per sport type
    pub activity_types: HashMap<String, u32>,
    /// Activity count per month label; always holds all twelve months
    pub monthly_distribution: HashMap<String, u32>,
    pub average_per_activity: Averages,
    pub streaks: Streaks,

    // ─── Places & Routes ─────────────────────────────────────────
    pub top_locations: Vec<LocationStats>,
    pub top_routes: Vec<RouteData>,
    /// Every encoded route, for the heatmap
    pub all_polylines: Vec<String>,
}

impl Default for WrappedStats {
    fn default() -> Self {
        Self {
            total_distance: 0.0,
            total_time: 0.0,
            total_elevation: 0.0,
            total_activities: 0,
            total_kudos: 0,
            longest_activity: None,
            fastest_activity: None,
            personal_bests: PersonalBests::default(),
            activity_types: HashMap::new(),
            monthly_distribution: empty_monthly_distribution(),
            average_per_activity: Averages::default(),
            streaks: Streaks::default(),
            top_locations: Vec::new(),
            top_routes: Vec::new(),
            all_polylines: Vec::new(),
        }
    }
}

/// Twelve month buckets, all zero.
pub fn empty_monthly_distribution() -> HashMap<String, u32> {
    MONTHS.iter().map(|m| (m.to_string(), 0)).collect()
}

/// Per-activity averages (km, hours, meters).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Averages {
    pub distance: f64,
    pub time: f64,
    pub elevation: f64,
}

/// Consecutive-day activity streaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Streaks {
    pub longest_streak: u32,
    pub current_streak: u32,
}

/// Single-activity bests (km, hours, meters, kudos).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PersonalBests {
    pub longest_distance: f64,
    pub longest_time: f64,
    pub highest_elevation: f64,
    pub most_kudos: u32,
}

/// Activities grouped by place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocationStats {
    pub city: String,
    pub country: String,
    pub count: u32,
    /// Total distance (km)
    pub total_distance: f64,
    pub lat: f64,
    pub lng: f64,
}

/// A ranked route for the map slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RouteData {
    pub polyline: String,
    pub name: String,
    /// Distance (km)
    pub distance: f64,
    #[serde(rename = "type")]
    pub activity_type: String,
}
