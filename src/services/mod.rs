// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - import and aggregation pipeline.

pub mod archive;
pub mod normalize;
pub mod stats;
pub mod strava;
pub mod table;
pub mod track;
pub mod years;

pub use archive::{import_archive, ImportError, ParsedExport};
pub use stats::process_activities;
pub use strava::StravaClient;
pub use years::{available_years, filter_by_year};
