use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::media::MediaFile;
use crate::sidecar::Sidecar;

/// Canonical form expected by the metadata writer
pub const CANONICAL_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Google's `photoTakenTime.formatted`, with and without the comma
const GOOGLE_FORMATS: &[&str] = &["%d %b %Y, %H:%M:%S", "%d %b %Y %H:%M:%S"];

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{4})([0-9]{2})([0-9]{2})_([0-9]{2})([0-9]{2})([0-9]{2})").unwrap()
});
static FOLDER_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(19|20)[0-9]{2}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    SidecarFormatted,
    SidecarTimestamp,
    Filename,
    Folder,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateSource::SidecarFormatted => "sidecar formatted time",
            DateSource::SidecarTimestamp => "sidecar timestamp",
            DateSource::Filename => "filename",
            DateSource::Folder => "folder name",
        };
        f.write_str(name)
    }
}

/// A capture date in `YYYY:MM:DD HH:MM:SS` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDate {
    value: String,
    source: DateSource,
}

impl ResolvedDate {
    fn new(value: String, source: DateSource) -> Self {
        ResolvedDate { value, source }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> DateSource {
        self.source
    }
}

impl fmt::Display for ResolvedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Parse `D Mon YYYY, HH:MM:SS` (an optional trailing `UTC` is ignored)
pub fn parse_google_formatted(date_str: &str) -> Option<String> {
    let trimmed = date_str.trim();
    let trimmed = trimmed.strip_suffix("UTC").unwrap_or(trimmed).trim_end();

    GOOGLE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
}

/// Render epoch seconds as a UTC canonical date
pub fn format_epoch(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.format(CANONICAL_FORMAT).to_string())
}

/// Look for an embedded `YYYYMMDD_HHMMSS` in the file stem
pub fn date_from_filename(media: &MediaFile) -> Option<String> {
    let stem = media.stem();
    let caps = FILENAME_RE.captures(&stem)?;
    Some(format!(
        "{}:{}:{} {}:{}:{}",
        &caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6]
    ))
}

/// A `19xx`/`20xx` year in the parent folder name becomes Jan 1st, noon
pub fn date_from_folder(media: &MediaFile) -> Option<String> {
    let folder = media.folder_name();
    FOLDER_YEAR_RE
        .find(&folder)
        .map(|m| format!("{}:01:01 12:00:00", m.as_str()))
}

fn date_from_sidecar(sidecar: &Sidecar) -> Option<ResolvedDate> {
    let taken = sidecar.photo_taken_time.as_ref()?;

    if let Some(formatted) = taken.formatted.as_deref().filter(|f| !f.is_empty()) {
        if let Some(date) = parse_google_formatted(formatted) {
            return Some(ResolvedDate::new(date, DateSource::SidecarFormatted));
        }
    }

    taken
        .timestamp
        .as_ref()
        .filter(|ts| ts.is_present())
        .and_then(|ts| ts.seconds())
        .and_then(format_epoch)
        .map(|date| ResolvedDate::new(date, DateSource::SidecarTimestamp))
}

/// Pick the capture date: sidecar, then filename, then folder name
pub fn resolve_date(sidecar: Option<&Sidecar>, media: &MediaFile) -> Option<ResolvedDate> {
    if let Some(date) = sidecar.and_then(date_from_sidecar) {
        return Some(date);
    }

    if let Some(date) = date_from_filename(media) {
        return Some(ResolvedDate::new(date, DateSource::Filename));
    }

    date_from_folder(media).map(|date| ResolvedDate::new(date, DateSource::Folder))
}
