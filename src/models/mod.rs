// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod athlete;
pub mod stats;

pub use activity::{Activity, ActivityMap, LatLng};
pub use athlete::Athlete;
pub use stats::WrappedStats;
