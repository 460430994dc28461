//! Athlete model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Athlete owning an activity collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Athlete {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    #[serde(default)]
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    /// Profile picture URL, or a `data:` URI for archive imports
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub profile_medium: Option<String>,
}
