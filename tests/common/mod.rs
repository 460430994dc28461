// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use flate2::{write::GzEncoder, Compression};
use std::io::{Cursor, Write};
use std::sync::Arc;
use strava_wrapped::config::Config;
use strava_wrapped::routes::create_router;
use strava_wrapped::services::StravaClient;
use strava_wrapped::AppState;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Number of columns in a Strava `activities.csv` row.
const EXPORT_COLUMNS: usize = 32;

/// Header row; only its presence matters to the importer.
#[allow(dead_code)]
pub fn activities_header() -> String {
    let mut headers: Vec<String> = (0..EXPORT_COLUMNS).map(|i| format!("Column {}", i)).collect();
    headers[0] = "Activity ID".to_string();
    headers[1] = "Activity Date".to_string();
    headers[2] = "Activity Name".to_string();
    headers[3] = "Activity Type".to_string();
    headers[12] = "Filename".to_string();
    headers.join(",")
}

/// One `activities.csv` data row with the commonly used columns filled in.
#[allow(dead_code)]
pub fn activity_row(id: &str, date: &str, name: &str, sport: &str, km: &str, filename: &str) -> String {
    let mut fields = vec![String::new(); EXPORT_COLUMNS];
    fields[0] = id.to_string();
    fields[1] = date.to_string();
    fields[2] = name.to_string();
    fields[3] = sport.to_string();
    fields[6] = km.to_string();
    fields[12] = filename.to_string();
    fields[16] = "1800".to_string();
    fields
        .iter()
        .map(|f| {
            if f.contains(',') || f.contains('"') {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Build an in-memory ZIP archive.
#[allow(dead_code)]
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[allow(dead_code)]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A minimal GPX document with one track segment.
#[allow(dead_code)]
pub fn gpx(points: &[(f64, f64)]) -> String {
    let trkpts: String = points
        .iter()
        .map(|(lat, lon)| format!("<trkpt lat=\"{}\" lon=\"{}\"><ele>10</ele></trkpt>", lat, lon))
        .collect();
    format!(
        "<?xml version=\"1.0\"?><gpx version=\"1.1\"><trk><trkseg>{}</trkseg></trk></gpx>",
        trkpts
    )
}

/// Create a test app with the default configuration.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::default(), None)
}

/// Create a test app, optionally pointing the Strava client at a mock server.
#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    strava_base: Option<&str>,
) -> (axum::Router, Arc<AppState>) {
    let mut strava = StravaClient::new(
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    );
    if let Some(base) = strava_base {
        strava = strava.with_base_urls(format!("{}/api/v3", base), format!("{}/oauth", base));
    }

    let state = Arc::new(AppState { config, strava });
    (create_router(state.clone()), state)
}
