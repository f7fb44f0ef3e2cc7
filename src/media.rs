use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A non-JSON file found under the root tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MediaFile { path: path.into() }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> Option<String> {
        get_extension(&self.path)
    }

    /// Name of the immediate parent folder, empty at the filesystem root
    pub fn folder_name(&self) -> String {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Get the file extension from a path
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// True for names ending in `.json` (a bare `.json` included), ignoring ASCII case
pub fn is_json(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(".json"))
        .unwrap_or(false)
}

/// Path the file is moved to when its content turns out to be a JPEG
pub fn jpg_path(path: &Path) -> PathBuf {
    path.with_extension("jpg")
}

/// New sidecar location after its media file was renamed: the media's new
/// stem with the sidecar's own extension, in the same folder.
pub fn follow_sidecar_path(new_media: &Path, sidecar: &Path) -> PathBuf {
    let stem = new_media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match sidecar.extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem,
    };
    new_media
        .parent()
        .map(|p| p.join(&name))
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Recursively collect every non-JSON file under `root`, including symlinks
/// that resolve to a regular file
pub fn collect_media_files(root: &Path) -> Vec<MediaFile> {
    let mut files = Vec::new();

    for entry_result in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                if let Some(path) = err.path() {
                    warn!("Failed to access {}: {}", path.display(), err);
                } else {
                    warn!("WalkDir error: {}", err);
                }
                continue;
            }
        };

        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let path = entry.path();
        if is_json(path) {
            continue;
        }

        files.push(MediaFile::new(path));
    }

    files
}
