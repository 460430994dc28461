// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track side-file decoding (GPX and FIT) and route encoding.
//!
//! Every decoder here is best-effort: malformed, truncated or undecodable
//! input yields an empty coordinate list, which callers treat as "no route".

use crate::models::LatLng;
use flate2::read::MultiGzDecoder;
use geo::Coord;
use regex::Regex;
use std::borrow::Cow;
use std::io::Read;
use std::sync::LazyLock;

/// Maximum number of points kept per route.
pub const MAX_ROUTE_POINTS: usize = 200;

/// Polyline precision used by Strava (Google encoded polyline format).
const POLYLINE_PRECISION: u32 = 5;

/// FIT stores positions in semicircles: 2^31 semicircles = 180 degrees.
const SEMICIRCLES_TO_DEGREES: f64 = 180.0 / 2_147_483_648.0;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

static TRKPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<trkpt\b([^>]*)>").expect("valid trkpt regex"));
static COORD_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(lat|lon)\s*=\s*["']([^"']*)["']"#).expect("valid attribute regex")
});

/// Track side-file format, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFormat {
    Gpx,
    Fit,
}

impl TrackFormat {
    /// Detect the format from a file name, ignoring case and a `.gz` suffix.
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let base = lower.strip_suffix(".gz").unwrap_or(&lower);
        if base.ends_with(".gpx") {
            Some(TrackFormat::Gpx)
        } else if base.ends_with(".fit") {
            Some(TrackFormat::Fit)
        } else {
            None
        }
    }
}

/// Decode a side-file into a reduced coordinate list.
///
/// Gzip-compressed input is inflated first. Never fails; any problem
/// results in an empty list.
pub fn decode_track(format: TrackFormat, bytes: &[u8]) -> Vec<LatLng> {
    let Some(data) = decompress_if_needed(bytes) else {
        tracing::warn!(?format, "Failed to decompress track file");
        return Vec::new();
    };

    let coords = match format {
        TrackFormat::Gpx => decode_gpx(&String::from_utf8_lossy(&data)),
        TrackFormat::Fit => decode_fit(&data),
    };

    simplify_coords(coords, MAX_ROUTE_POINTS)
}

/// Inflate gzip data, passing anything else through unchanged.
///
/// Returns `None` when the data looks like gzip but cannot be inflated.
pub fn decompress_if_needed(bytes: &[u8]) -> Option<Cow<'_, [u8]>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Some(Cow::Borrowed(bytes));
    }

    let mut out = Vec::new();
    match MultiGzDecoder::new(bytes).read_to_end(&mut out) {
        Ok(_) => Some(Cow::Owned(out)),
        Err(e) => {
            tracing::debug!(error = %e, "Gzip decompression failed");
            None
        }
    }
}

/// Extract `<trkpt lat=".." lon="..">` coordinates from GPX text.
///
/// Points whose attributes are missing or not finite numbers are skipped.
pub fn decode_gpx(content: &str) -> Vec<LatLng> {
    TRKPT_TAG
        .captures_iter(content)
        .filter_map(|tag| {
            let mut lat = None;
            let mut lon = None;
            for attr in COORD_ATTR.captures_iter(&tag[1]) {
                let value = attr[2].trim().parse::<f64>().ok().filter(|v| v.is_finite());
                match &attr[1] {
                    "lat" => lat = value,
                    _ => lon = value,
                }
            }
            Some([lat?, lon?])
        })
        .collect()
}

/// Extract positions from `record` messages of a FIT file.
pub fn decode_fit(bytes: &[u8]) -> Vec<LatLng> {
    use fitparser::de::from_bytes;
    use fitparser::profile::MesgNum;

    let records = match from_bytes(bytes) {
        Ok(records) => records,
        Err(e) => {
            tracing::debug!(error = %e, "FIT decode failed");
            return Vec::new();
        }
    };

    records
        .iter()
        .filter(|record| record.kind() == MesgNum::Record)
        .filter_map(|record| {
            let mut lat = None;
            let mut lon = None;
            for field in record.fields() {
                match field.name() {
                    "position_lat" => lat = fit_value_to_f64(field.value()),
                    "position_long" => lon = fit_value_to_f64(field.value()),
                    _ => {}
                }
            }
            let lat = lat? * SEMICIRCLES_TO_DEGREES;
            let lon = lon? * SEMICIRCLES_TO_DEGREES;
            (lat.is_finite() && lon.is_finite()).then_some([lat, lon])
        })
        .collect()
}

fn fit_value_to_f64(value: &fitparser::Value) -> Option<f64> {
    match value {
        fitparser::Value::SInt32(v) => Some(*v as f64),
        fitparser::Value::Float32(v) => Some(*v as f64),
        fitparser::Value::Float64(v) => Some(*v),
        fitparser::Value::SInt64(v) => Some(*v as f64),
        _ => None,
    }
}

/// Reduce a route to at most `cap` points by fixed-stride selection.
///
/// Keeps every `ceil(len / cap)`-th point and always ends on the original
/// last point.
pub fn simplify_coords(coords: Vec<LatLng>, cap: usize) -> Vec<LatLng> {
    let cap = cap.max(1);
    if coords.len() <= cap {
        return coords;
    }

    let step = coords.len().div_ceil(cap);
    let last_index = coords.len() - 1;
    let last = coords[last_index];

    let mut simplified: Vec<LatLng> = coords.into_iter().step_by(step).collect();
    if last_index % step != 0 {
        if simplified.len() >= cap {
            simplified.pop();
        }
        simplified.push(last);
    }
    simplified
}

/// Encode coordinates as a Google encoded polyline.
pub fn encode_route(coords: &[LatLng]) -> Option<String> {
    let line = coords.iter().map(|[lat, lng]| Coord { x: *lng, y: *lat });
    polyline::encode_coordinates(line, POLYLINE_PRECISION).ok()
}

/// Decode a Google encoded polyline into `[lat, lng]` pairs.
pub fn decode_route(encoded: &str) -> Option<Vec<LatLng>> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION).ok()?;
    Some(line.0.into_iter().map(|c| [c.y, c.x]).collect())
}
