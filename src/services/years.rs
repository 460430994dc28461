// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Year selection over an activity collection.

use chrono::{Datelike, Local};
use std::collections::BTreeSet;

use crate::models::Activity;

/// Years at or before this are treated as corrupt timestamps.
const MIN_YEAR_EXCLUSIVE: i32 = 2000;

/// Activities whose local start date falls in `year`, in original order.
pub fn filter_by_year(activities: &[Activity], year: i32) -> Vec<Activity> {
    activities
        .iter()
        .filter(|a| a.local_start().is_some_and(|start| start.year() == year))
        .cloned()
        .collect()
}

/// Distinct plausible years present in `activities`, most recent first.
///
/// Years not after 2000 or more than one year past `current_year` are
/// dropped.
pub fn available_years(activities: &[Activity], current_year: i32) -> Vec<i32> {
    let years: BTreeSet<i32> = activities
        .iter()
        .filter_map(|a| a.local_start())
        .map(|start| start.year())
        .filter(|&year| year > MIN_YEAR_EXCLUSIVE && year <= current_year + 1)
        .collect();
    years.into_iter().rev().collect()
}

/// [`available_years`] relative to the local calendar year.
pub fn available_years_now(activities: &[Activity]) -> Vec<i32> {
    available_years(activities, Local::now().year())
}
