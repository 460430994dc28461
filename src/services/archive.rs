// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava bulk-export importer.
//!
//! Handles the core workflow:
//! 1. Read every ZIP entry once, collecting the activity table, profile data
//!    and raw track side-files
//! 2. Parse `activities.csv` and normalize each row
//! 3. Join rows to their side-files by file name and decode routes
//! 4. Build the athlete from `profile.csv` and the profile picture

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::models::{Activity, Athlete, LatLng};
use crate::services::normalize::{normalize_row, NormalizedRow};
use crate::services::table::parse_table;
use crate::services::track::{decode_track, TrackFormat};

const DEFAULT_FIRST_NAME: &str = "Strava";
const DEFAULT_LAST_NAME: &str = "Athlete";
const UTF8_BOM: char = '\u{feff}';

/// Result of importing an export archive.
#[derive(Debug, Clone)]
pub struct ParsedExport {
    pub activities: Vec<Activity>,
    pub athlete: Athlete,
}

/// Errors that abort an import. Messages are shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Could not read the ZIP file: {0}")]
    InvalidArchive(String),

    #[error("Could not find activities.csv in the ZIP file. Please make sure you uploaded a valid Strava export.")]
    MissingActivitiesTable,

    #[error("No activities found in the export file.")]
    NoActivities,
}

/// Import a Strava export archive.
pub fn import_archive(bytes: &[u8]) -> Result<ParsedExport, ImportError> {
    import_archive_at(bytes, Utc::now())
}

/// Import a Strava export archive, using `now` for synthesized dates and IDs.
pub fn import_archive_at(bytes: &[u8], now: DateTime<Utc>) -> Result<ParsedExport, ImportError> {
    let contents = ArchiveContents::extract(bytes)?;

    let table = contents
        .activities_csv
        .as_deref()
        .ok_or(ImportError::MissingActivitiesTable)?;

    let rows = parse_table(table);
    if rows.len() < 2 {
        return Err(ImportError::NoActivities);
    }

    let mut activities = Vec::with_capacity(rows.len() - 1);
    let mut rejected = 0usize;
    let mut with_route = 0usize;

    for (index, fields) in rows[1..].iter().enumerate() {
        let Some(NormalizedRow {
            mut activity,
            filename,
        }) = normalize_row(fields, index, now)
        else {
            rejected += 1;
            continue;
        };

        if let Some(coords) = filename.as_deref().and_then(|f| contents.side_files.decode(f)) {
            if activity.attach_route(&coords) {
                with_route += 1;
            }
        }

        activities.push(activity);
    }

    if activities.is_empty() {
        tracing::warn!(rejected, "Export contained no usable activity rows");
        return Err(ImportError::NoActivities);
    }

    let athlete = build_athlete(contents.profile_names, contents.profile_picture, now);

    tracing::info!(
        activities = activities.len(),
        rejected,
        with_route,
        side_files = contents.side_files.len(),
        "Imported Strava export"
    );

    Ok(ParsedExport {
        activities,
        athlete,
    })
}

/// Everything collected from one pass over the archive.
#[derive(Default)]
struct ArchiveContents {
    activities_csv: Option<String>,
    profile_names: ProfileNames,
    profile_picture: Option<String>,
    side_files: SideFiles,
}

/// What an archive entry is, judged by its lowercase file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    ActivitiesTable,
    ProfileTable,
    ProfileImage(&'static str),
    Track,
}

impl EntryKind {
    fn classify(lower_name: &str) -> Option<Self> {
        if lower_name.ends_with("activities.csv") {
            Some(EntryKind::ActivitiesTable)
        } else if lower_name.ends_with("profile.csv") {
            Some(EntryKind::ProfileTable)
        } else if lower_name.ends_with("profile.png") {
            Some(EntryKind::ProfileImage("image/png"))
        } else if lower_name.ends_with("profile.jpg") || lower_name.ends_with("profile.jpeg") {
            Some(EntryKind::ProfileImage("image/jpeg"))
        } else if TrackFormat::from_filename(lower_name).is_some() {
            Some(EntryKind::Track)
        } else {
            None
        }
    }
}

impl ArchiveContents {
    fn extract(bytes: &[u8]) -> Result<Self, ImportError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ImportError::InvalidArchive(e.to_string()))?;

        let mut contents = ArchiveContents::default();

        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(index = i, error = %e, "Skipping unreadable archive entry");
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let Some(kind) = EntryKind::classify(&name.to_ascii_lowercase()) else {
                continue;
            };

            let mut data = Vec::new();
            if let Err(e) = entry.read_to_end(&mut data) {
                tracing::warn!(file = %name, error = %e, "Failed to read archive entry");
                continue;
            }

            match kind {
                EntryKind::ActivitiesTable => {
                    contents.activities_csv = Some(decode_text(&data));
                }
                EntryKind::ProfileTable => {
                    contents.profile_names = ProfileNames::parse(&decode_text(&data));
                }
                EntryKind::ProfileImage(mime) => {
                    contents.profile_picture =
                        Some(format!("data:{};base64,{}", mime, STANDARD.encode(&data)));
                }
                EntryKind::Track => contents.side_files.insert(name, data),
            }
        }

        Ok(contents)
    }
}

fn decode_text(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.strip_prefix(UTF8_BOM).unwrap_or(&*text).to_string()
}

/// First and last name found in `profile.csv`.
#[derive(Debug, Default, Clone, PartialEq)]
struct ProfileNames {
    first: Option<String>,
    last: Option<String>,
}

impl ProfileNames {
    /// Locate name columns by case-insensitive header match.
    /// A malformed or empty table yields no names.
    fn parse(text: &str) -> Self {
        let rows = parse_table(text);
        let (Some(headers), Some(values)) = (rows.first(), rows.get(1)) else {
            return Self::default();
        };

        let find = |word: &str| {
            headers
                .iter()
                .position(|h| {
                    let h = h.to_lowercase();
                    h.contains(word) && h.contains("name")
                })
                .and_then(|idx| values.get(idx))
                .filter(|v| !v.is_empty())
                .cloned()
        };

        Self {
            first: find("first"),
            last: find("last"),
        }
    }
}

fn build_athlete(
    names: ProfileNames,
    profile_picture: Option<String>,
    now: DateTime<Utc>,
) -> Athlete {
    Athlete {
        id: now.timestamp_millis().unsigned_abs(),
        username: "athlete".to_string(),
        firstname: names
            .first
            .unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
        lastname: names.last.unwrap_or_else(|| DEFAULT_LAST_NAME.to_string()),
        profile_medium: profile_picture.clone(),
        profile: profile_picture,
    }
}

/// Raw track side-files keyed by archive entry name.
///
/// Written once while reading the archive and only read afterwards.
/// Decoding is deferred until a row references the file.
#[derive(Debug, Default)]
pub struct SideFiles {
    files: HashMap<String, Vec<u8>>,
}

impl SideFiles {
    pub fn insert(&mut self, name: String, data: Vec<u8>) {
        self.files.insert(name, data);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Look up a file by the name used in `activities.csv`, tolerating a
    /// leading slash on either side.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        let stripped = name.trim_start_matches('/');
        self.files
            .get(name)
            .or_else(|| self.files.get(&format!("/{}", name)))
            .or_else(|| self.files.get(stripped))
            .map(Vec::as_slice)
    }

    /// Decode the referenced side-file.
    ///
    /// Returns `None` if the file is missing or its format is unknown. A
    /// file that fails to decode yields an empty list.
    pub fn decode(&self, name: &str) -> Option<Vec<LatLng>> {
        let format = TrackFormat::from_filename(name)?;
        let Some(data) = self.get(name) else {
            tracing::debug!(file = %name, "Referenced track file not in archive");
            return None;
        };
        Some(decode_track(format, data))
    }
}
