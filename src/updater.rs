use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::date::resolve_date;
use crate::exiftool::{MetadataWriter, WriteFields, VALIDATION_TAG};
use crate::media::{follow_sidecar_path, jpg_path, MediaFile};
use crate::sidecar::Sidecar;

/// stderr markers for a file whose real container does not match its extension
const FORMAT_MISMATCH_MARKERS: &[&str] = &["Not a valid HEIC", "Not a valid JPEG"];

/// stderr marker treated as a skip whatever the exit code
const BENIGN_MARKER: &str = "OtherImageStart";

const MAX_RENAME_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Updated,
    Skipped,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Updated => "UPDATED",
            Status::Skipped => "SKIPPED",
            Status::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    /// Where the media file ended up (differs from the input after a rename)
    pub path: PathBuf,
    pub date: Option<String>,
    pub reason: Option<String>,
}

impl Outcome {
    fn new(status: Status, path: &Path, date: Option<&str>, reason: Option<String>) -> Self {
        Outcome {
            status,
            path: path.to_path_buf(),
            date: date.map(str::to_string),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    pub update_file_timestamp: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        UpdateOptions {
            update_file_timestamp: true,
        }
    }
}

fn is_format_mismatch(stderr: &str) -> bool {
    FORMAT_MISMATCH_MARKERS.iter().any(|m| stderr.contains(m))
}

/// Build the field assignments for one file from its resolved date and sidecar
fn build_fields(date: &str, sidecar: Option<&Sidecar>, options: &UpdateOptions) -> WriteFields {
    WriteFields {
        date: date.to_string(),
        file_modify_date: options.update_file_timestamp,
        gps: sidecar.and_then(Sidecar::coordinates),
        description: sidecar.and_then(Sidecar::description).map(str::to_string),
    }
}

/// Move the sidecar so it follows its renamed media file
fn move_sidecar(new_media: &Path, sidecar: &Path) -> Result<PathBuf> {
    let target = follow_sidecar_path(new_media, sidecar);
    if target == sidecar {
        return Ok(target);
    }
    if target.exists() {
        warn!(
            "Not moving sidecar {}: {} already exists",
            sidecar.display(),
            target.display()
        );
        return Ok(sidecar.to_path_buf());
    }

    fs::rename(sidecar, &target)
        .with_context(|| format!("Failed to move sidecar to {}", target.display()))?;
    info!("Moved sidecar {} -> {}", sidecar.display(), target.display());
    Ok(target)
}

/// Resolve a date for `media`, write it, and confirm the write by reading it back.
///
/// A format mismatch reported by the tool renames the file to `.jpg` (moving
/// the matched sidecar along) and retries once on the new path. Errors
/// returned here are filesystem or tool-launch failures; the caller counts
/// them as FAILED.
pub fn update_file<W: MetadataWriter + ?Sized>(
    writer: &mut W,
    media: &MediaFile,
    sidecar_path: Option<&Path>,
    sidecar: Option<&Sidecar>,
    options: &UpdateOptions,
) -> Result<Outcome> {
    let Some(date) = resolve_date(sidecar, media) else {
        return Ok(Outcome::new(
            Status::Skipped,
            &media.path,
            None,
            Some("No date available".to_string()),
        ));
    };
    debug!("{}: {} from {}", media.path.display(), date, date.source());

    let date = date.as_str();
    let fields = build_fields(date, sidecar, options);
    let mut path = media.path.clone();
    let mut sidecar_path = sidecar_path.map(Path::to_path_buf);
    let mut renames = 0;

    loop {
        let output = writer.write(&path, &fields)?;

        if is_format_mismatch(&output.stderr) {
            let target = jpg_path(&path);
            if renames >= MAX_RENAME_RETRIES || target == path {
                return Ok(Outcome::new(
                    Status::Failed,
                    &path,
                    Some(date),
                    Some(format!("Format mismatch not recoverable: {}", output.stderr)),
                ));
            }
            if target.exists() {
                return Ok(Outcome::new(
                    Status::Failed,
                    &path,
                    Some(date),
                    Some(format!("Cannot rename to {}: file exists", target.display())),
                ));
            }

            fs::rename(&path, &target)
                .with_context(|| format!("Failed to rename to {}", target.display()))?;
            info!("Renamed {} -> {}", path.display(), target.display());

            if let Some(old) = sidecar_path.take() {
                sidecar_path = Some(move_sidecar(&target, &old)?);
            }

            path = target;
            renames += 1;
            continue;
        }

        if output.stderr.contains(BENIGN_MARKER) {
            return Ok(Outcome::new(
                Status::Skipped,
                &path,
                Some(date),
                Some(output.stderr),
            ));
        }

        if !output.success {
            let reason = if output.stderr.is_empty() {
                "Exiftool failed".to_string()
            } else {
                output.stderr
            };
            return Ok(Outcome::new(Status::Failed, &path, Some(date), Some(reason)));
        }

        let actual = writer.read_back(&path, VALIDATION_TAG)?;
        if actual != date {
            return Ok(Outcome::new(
                Status::Failed,
                &path,
                Some(date),
                Some(format!("Validation mismatch (read {})", actual)),
            ));
        }

        return Ok(Outcome::new(Status::Updated, &path, Some(date), None));
    }
}
