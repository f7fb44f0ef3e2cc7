use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SidecarError;
use crate::media::is_json;

/// Export-time metadata stored next to a media file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    pub photo_taken_time: Option<PhotoTakenTime>,
    pub geo_data_exif: Option<GeoData>,
    pub geo_data: Option<GeoData>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoTakenTime {
    pub formatted: Option<String>,
    pub timestamp: Option<Timestamp>,
}

/// Epoch seconds, exported either as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Timestamp {
    /// Empty strings and zero count as absent
    pub fn is_present(&self) -> bool {
        match self {
            Timestamp::Int(v) => *v != 0,
            Timestamp::Float(v) => *v != 0.0,
            Timestamp::Text(s) => !s.is_empty(),
        }
    }

    pub fn seconds(&self) -> Option<i64> {
        match self {
            Timestamp::Int(v) => Some(*v),
            Timestamp::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Timestamp::Float(_) => None,
            Timestamp::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoData {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl GeoData {
    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none() && self.other.is_empty()
    }
}

impl Sidecar {
    /// Latitude and longitude, only when both are present and non-zero.
    /// `geoDataExif` wins over `geoData` whenever it is a non-empty object.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let geo = self
            .geo_data_exif
            .as_ref()
            .filter(|g| !g.is_empty())
            .or(self.geo_data.as_ref())?;

        match (geo.latitude, geo.longitude) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Read and decode a sidecar file. A JSON `null` body carries no data.
pub fn load_sidecar(path: &Path) -> Result<Option<Sidecar>, SidecarError> {
    let content = fs::read(path).map_err(|source| SidecarError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&content).map_err(|source| SidecarError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Find the first JSON file (by name) in the media file's own folder whose
/// name starts with the media file name, ignoring case.
pub fn find_matching_json(media_path: &Path) -> std::io::Result<Option<PathBuf>> {
    let base_name = match media_path.file_name() {
        Some(n) => n.to_string_lossy().trim().to_lowercase(),
        None => return Ok(None),
    };

    let dir = match media_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_json(&path) && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(candidates.into_iter().find(|candidate| {
        candidate
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase().starts_with(&base_name))
            .unwrap_or(false)
    }))
}
