// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversion of `activities.csv` rows into [`Activity`] records.
//!
//! Numeric fields are parsed best-effort: anything unparseable becomes 0 (or
//! `None` for optional values) instead of rejecting the row. Only a missing or
//! non-numeric activity ID drops a row.

use chrono::{DateTime, Utc};

use crate::models::activity::DEFAULT_ACTIVITY_TYPE;
use crate::models::Activity;
use crate::time_utils::{format_utc_rfc3339, parse_export_date};

/// Column positions in Strava's `activities.csv`.
pub mod columns {
    pub const ACTIVITY_ID: usize = 0;
    pub const ACTIVITY_DATE: usize = 1;
    pub const ACTIVITY_NAME: usize = 2;
    pub const ACTIVITY_TYPE: usize = 3;
    pub const ELAPSED_TIME_DISPLAY: usize = 5;
    pub const DISTANCE_KM: usize = 6;
    pub const MAX_HR_DISPLAY: usize = 7;
    pub const FILENAME: usize = 12;
    pub const ELAPSED_TIME_RAW: usize = 15;
    pub const MOVING_TIME: usize = 16;
    pub const DISTANCE_METERS: usize = 17;
    pub const MAX_SPEED: usize = 18;
    pub const AVERAGE_SPEED: usize = 19;
    pub const ELEVATION_GAIN: usize = 20;
    pub const MAX_HR_RAW: usize = 30;
    pub const AVERAGE_HR: usize = 31;
}

/// Named view over one `activities.csv` row. Missing columns read as `""`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportRow<'a> {
    pub activity_id: &'a str,
    pub activity_date: &'a str,
    pub activity_name: &'a str,
    pub activity_type: &'a str,
    pub elapsed_time_display: &'a str,
    pub distance_km: &'a str,
    pub max_hr_display: &'a str,
    pub filename: &'a str,
    pub elapsed_time_raw: &'a str,
    pub moving_time: &'a str,
    pub distance_meters: &'a str,
    pub max_speed: &'a str,
    pub average_speed: &'a str,
    pub elevation_gain: &'a str,
    pub max_hr_raw: &'a str,
    pub average_hr: &'a str,
}

impl<'a> ExportRow<'a> {
    pub fn from_fields(fields: &'a [String]) -> Self {
        let get = |col: usize| fields.get(col).map(String::as_str).unwrap_or("");
        Self {
            activity_id: get(columns::ACTIVITY_ID),
            activity_date: get(columns::ACTIVITY_DATE),
            activity_name: get(columns::ACTIVITY_NAME),
            activity_type: get(columns::ACTIVITY_TYPE),
            elapsed_time_display: get(columns::ELAPSED_TIME_DISPLAY),
            distance_km: get(columns::DISTANCE_KM),
            max_hr_display: get(columns::MAX_HR_DISPLAY),
            filename: get(columns::FILENAME),
            elapsed_time_raw: get(columns::ELAPSED_TIME_RAW),
            moving_time: get(columns::MOVING_TIME),
            distance_meters: get(columns::DISTANCE_METERS),
            max_speed: get(columns::MAX_SPEED),
            average_speed: get(columns::AVERAGE_SPEED),
            elevation_gain: get(columns::ELEVATION_GAIN),
            max_hr_raw: get(columns::MAX_HR_RAW),
            average_hr: get(columns::AVERAGE_HR),
        }
    }
}

/// An activity together with the side-file its row references.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub activity: Activity,
    pub filename: Option<String>,
}

/// Convert one data row into an activity.
///
/// `index` is the zero-based data-row position, used only for the fallback
/// name and ID. `fallback_time` stands in for unparseable dates.
pub fn normalize_row(
    fields: &[String],
    index: usize,
    fallback_time: DateTime<Utc>,
) -> Option<NormalizedRow> {
    let row = ExportRow::from_fields(fields);

    let id = match parse_id(row.activity_id)? {
        0 => fallback_time.timestamp_millis().unsigned_abs() + index as u64,
        id => id,
    };

    let start = parse_export_date(row.activity_date).unwrap_or(fallback_time);
    let start_str = format_utc_rfc3339(start);

    let distance = match parse_number(row.distance_km) * 1000.0 {
        d if d == 0.0 => parse_number(row.distance_meters),
        d => d,
    };

    let moving_time = non_zero_or(parse_number(row.moving_time), || {
        parse_number(row.elapsed_time_display)
    });
    let elapsed_time = non_zero_or(parse_number(row.elapsed_time_raw), || {
        parse_number(row.elapsed_time_display)
    });
    let elapsed_time = non_zero_or(elapsed_time, || moving_time);

    let max_heartrate =
        parse_optional(row.max_hr_raw).or_else(|| parse_optional(row.max_hr_display));

    let activity_type = non_empty_or(row.activity_type, DEFAULT_ACTIVITY_TYPE);

    let activity = Activity {
        id,
        name: if row.activity_name.is_empty() {
            format!("Activity {}", index + 1)
        } else {
            row.activity_name.to_string()
        },
        distance,
        moving_time,
        elapsed_time,
        total_elevation_gain: parse_number(row.elevation_gain),
        activity_type: activity_type.clone(),
        sport_type: activity_type,
        start_date: start_str.clone(),
        start_date_local: start_str,
        timezone: None,
        kudos_count: 0,
        achievement_count: 0,
        average_speed: parse_number(row.average_speed),
        max_speed: parse_number(row.max_speed),
        average_heartrate: parse_optional(row.average_hr),
        max_heartrate,
        start_latlng: None,
        end_latlng: None,
        location_city: None,
        location_state: None,
        location_country: None,
        map: None,
    };

    let filename = (!row.filename.is_empty()).then(|| row.filename.to_string());

    Some(NormalizedRow { activity, filename })
}

fn non_zero_or(value: f64, fallback: impl FnOnce() -> f64) -> f64 {
    if value == 0.0 {
        fallback()
    } else {
        value
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Parse an activity ID from its leading digits.
///
/// Returns `None` when the field does not start with a digit.
pub fn parse_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().ok()
}

/// Parse a locale-formatted number, returning 0 on failure.
///
/// Whichever of `.` and `,` appears last is the decimal separator; the other
/// is a thousands separator and is dropped. Parsing stops at the first
/// character that cannot continue the number, so units like `"12.5 km"`
/// still parse.
pub fn parse_number(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }

    let decimal = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => Some(','),
        (None, Some(_)) => Some(','),
        (Some(_), _) => Some('.'),
        (None, None) => None,
    };
    let decimal_pos = decimal.and_then(|sep| raw.rfind(sep));

    let normalized: String = raw
        .char_indices()
        .filter_map(|(i, c)| match c {
            '.' | ',' if Some(i) == decimal_pos => Some('.'),
            '.' | ',' => None,
            _ => Some(c),
        })
        .collect();

    parse_leading_f64(&normalized)
}

/// Parse an optional numeric field; zero and garbage are treated as absent.
pub fn parse_optional(raw: &str) -> Option<f64> {
    Some(parse_number(raw)).filter(|v| *v != 0.0)
}

/// Parse the longest numeric prefix of `s`.
fn parse_leading_f64(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_dot = false;
    let mut seen_digit = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return 0.0;
    }
    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    /// Build a 32-column row with the given (column, value) pairs set.
    fn row(values: &[(usize, &str)]) -> Vec<String> {
        let mut fields = vec![String::new(); 32];
        for (col, value) in values {
            fields[*col] = value.to_string();
        }
        fields
    }

    // ─── parse_number ────────────────────────────────────────────

    #[test]
    fn test_parse_number_plain() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number(" 3.25 "), 3.25);
        assert_eq!(parse_number("-7.5"), -7.5);
    }

    #[test]
    fn test_parse_number_comma_decimal() {
        assert_eq!(parse_number("12,5"), 12.5);
        assert_eq!(parse_number("1.234,5"), 1234.5);
    }

    #[test]
    fn test_parse_number_comma_thousands() {
        assert_eq!(parse_number("1,234.5"), 1234.5);
        assert_eq!(parse_number("1,234,567.25"), 1234567.25);
    }

    #[test]
    fn test_parse_number_last_separator_wins() {
        // With only commas, the last one is the decimal point.
        assert_eq!(parse_number("1,234,5"), 1234.5);
        assert_eq!(parse_number("1.234.5"), 1234.5);
    }

    #[test]
    fn test_parse_number_trailing_text() {
        assert_eq!(parse_number("12.5 km"), 12.5);
    }

    #[test]
    fn test_parse_number_garbage_is_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("."), 0.0);
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional("150"), Some(150.0));
        assert_eq!(parse_optional("0"), None);
        assert_eq!(parse_optional(""), None);
        assert_eq!(parse_optional("n/a"), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1234567890"), Some(1234567890));
        assert_eq!(parse_id(" 42 "), Some(42));
        assert_eq!(parse_id("77abc"), Some(77));
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("-5"), None);
    }

    // ─── normalize_row ───────────────────────────────────────────

    #[test]
    fn test_full_row() {
        let fields = row(&[
            (columns::ACTIVITY_ID, "9876"),
            (columns::ACTIVITY_DATE, "Mar 5, 2023, 6:30:00 AM"),
            (columns::ACTIVITY_NAME, "Morning Ride"),
            (columns::ACTIVITY_TYPE, "Ride"),
            (columns::ELAPSED_TIME_DISPLAY, "4000"),
            (columns::DISTANCE_KM, "42,5"),
            (columns::FILENAME, "activities/9876.gpx.gz"),
            (columns::ELAPSED_TIME_RAW, "3900"),
            (columns::MOVING_TIME, "3600"),
            (columns::MAX_SPEED, "15.2"),
            (columns::AVERAGE_SPEED, "11.8"),
            (columns::ELEVATION_GAIN, "350.5"),
            (columns::MAX_HR_RAW, "181"),
            (columns::AVERAGE_HR, "142.3"),
        ]);

        let result = normalize_row(&fields, 0, fallback()).unwrap();
        let a = result.activity;

        assert_eq!(a.id, 9876);
        assert_eq!(a.name, "Morning Ride");
        assert_eq!(a.sport_type, "Ride");
        assert_eq!(a.activity_type, "Ride");
        assert_eq!(a.distance, 42500.0);
        assert_eq!(a.moving_time, 3600.0);
        assert_eq!(a.elapsed_time, 3900.0);
        assert_eq!(a.total_elevation_gain, 350.5);
        assert_eq!(a.max_speed, 15.2);
        assert_eq!(a.average_speed, 11.8);
        assert_eq!(a.max_heartrate, Some(181.0));
        assert_eq!(a.average_heartrate, Some(142.3));
        assert_eq!(a.start_date, "2023-03-05T06:30:00Z");
        assert_eq!(a.start_date_local, "2023-03-05T06:30:00Z");
        assert_eq!(a.kudos_count, 0);
        assert!(a.map.is_none());
        assert_eq!(result.filename.as_deref(), Some("activities/9876.gpx.gz"));
    }

    #[test]
    fn test_rejects_missing_or_non_numeric_id() {
        assert!(normalize_row(&row(&[(columns::ACTIVITY_NAME, "x")]), 0, fallback()).is_none());
        assert!(normalize_row(&row(&[(columns::ACTIVITY_ID, "abc")]), 0, fallback()).is_none());
        assert!(normalize_row(&[], 0, fallback()).is_none());
    }

    #[test]
    fn test_short_row_degrades_to_defaults() {
        let fields = vec!["55".to_string()];
        let a = normalize_row(&fields, 3, fallback()).unwrap().activity;

        assert_eq!(a.id, 55);
        assert_eq!(a.name, "Activity 4");
        assert_eq!(a.sport_type, DEFAULT_ACTIVITY_TYPE);
        assert_eq!(a.distance, 0.0);
        assert_eq!(a.moving_time, 0.0);
        assert_eq!(a.average_heartrate, None);
        assert_eq!(a.max_heartrate, None);
        assert_eq!(a.start_date, "2024-06-01T12:00:00Z");
    }

    #[test]
    fn test_zero_id_gets_fallback() {
        let a = normalize_row(&row(&[(columns::ACTIVITY_ID, "0")]), 2, fallback())
            .unwrap()
            .activity;
        assert_eq!(a.id, fallback().timestamp_millis() as u64 + 2);
    }

    #[test]
    fn test_distance_falls_back_to_meters() {
        let fields = row(&[
            (columns::ACTIVITY_ID, "1"),
            (columns::DISTANCE_KM, ""),
            (columns::DISTANCE_METERS, "5012.3"),
        ]);
        let a = normalize_row(&fields, 0, fallback()).unwrap().activity;
        assert_eq!(a.distance, 5012.3);
    }

    #[test]
    fn test_distance_km_parses_locale_formats() {
        let a = normalize_row(
            &row(&[(columns::ACTIVITY_ID, "1"), (columns::DISTANCE_KM, "12,5")]),
            0,
            fallback(),
        )
        .unwrap()
        .activity;
        assert_eq!(a.distance, 12500.0);

        let a = normalize_row(
            &row(&[(columns::ACTIVITY_ID, "1"), (columns::DISTANCE_KM, "1.234,5")]),
            0,
            fallback(),
        )
        .unwrap()
        .activity;
        assert_eq!(a.distance, 1234500.0);
    }

    #[test]
    fn test_time_fallbacks() {
        let fields = row(&[
            (columns::ACTIVITY_ID, "1"),
            (columns::ELAPSED_TIME_DISPLAY, "1800"),
        ]);
        let a = normalize_row(&fields, 0, fallback()).unwrap().activity;
        assert_eq!(a.moving_time, 1800.0);
        assert_eq!(a.elapsed_time, 1800.0);

        let fields = row(&[(columns::ACTIVITY_ID, "1"), (columns::MOVING_TIME, "900")]);
        let a = normalize_row(&fields, 0, fallback()).unwrap().activity;
        assert_eq!(a.moving_time, 900.0);
        assert_eq!(a.elapsed_time, 900.0);
    }

    #[test]
    fn test_max_hr_falls_back_to_display_column() {
        let fields = row(&[(columns::ACTIVITY_ID, "1"), (columns::MAX_HR_DISPLAY, "175")]);
        let a = normalize_row(&fields, 0, fallback()).unwrap().activity;
        assert_eq!(a.max_heartrate, Some(175.0));
    }

    #[test]
    fn test_empty_filename_is_none() {
        let result = normalize_row(&row(&[(columns::ACTIVITY_ID, "1")]), 0, fallback()).unwrap();
        assert!(result.filename.is_none());
    }
}
