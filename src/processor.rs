use anyhow::{bail, Context, Result};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

use crate::exiftool::MetadataWriter;
use crate::media::{collect_media_files, MediaFile};
use crate::sidecar::{find_matching_json, load_sidecar};
use crate::updater::{update_file, Outcome, Status, UpdateOptions};

pub struct Processor<W: MetadataWriter> {
    writer: W,
    options: UpdateOptions,
    stats: ProcessingStats,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ProcessingStats {
    fn record(&mut self, status: Status) {
        match status {
            Status::Updated => self.updated += 1,
            Status::Skipped => self.skipped += 1,
            Status::Failed => self.failed += 1,
        }
    }
}

/// Per-file result before it is counted
enum FileReport {
    Done(Outcome),
    /// The sidecar exists but could not be loaded; the media file is left alone
    BadSidecar(crate::error::SidecarError),
}

impl<W: MetadataWriter> Processor<W> {
    pub fn new(writer: W, options: UpdateOptions) -> Self {
        Processor {
            writer,
            options,
            stats: ProcessingStats::default(),
        }
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn process_directory(&mut self, root: &Path) -> Result<ProcessingStats> {
        if !root.is_dir() {
            bail!("Not a directory: {}", root.display());
        }

        let files = collect_media_files(root);
        let total_files = files.len();
        self.stats = ProcessingStats {
            total_files,
            ..Default::default()
        };
        println!();
        println!("Found {} non-JSON files to check", total_files);
        println!();

        for (idx, media) in files.iter().enumerate() {
            match self.process_file(media) {
                Ok(FileReport::Done(outcome)) => self.report(media, &outcome),
                Ok(FileReport::BadSidecar(err)) => {
                    self.stats.failed += 1;
                    println!("[FAILED] {} → {}", err.path().display(), err);
                }
                Err(e) => {
                    self.stats.failed += 1;
                    println!("[FAILED] {} → {:#}", media.path.display(), e);
                }
            }

            let done = idx + 1;
            let percent = done as f64 / total_files as f64 * 100.0;
            print!("Progress: {}/{} ({:.1}%)\r", done, total_files, percent);
            // best-effort; the progress line is cosmetic
            io::stdout().flush().ok();
        }

        self.print_summary();
        Ok(self.stats.clone())
    }

    fn process_file(&mut self, media: &MediaFile) -> Result<FileReport> {
        let sidecar_path = find_matching_json(&media.path)
            .with_context(|| format!("Failed to list sidecars for {}", media.path.display()))?;

        let sidecar = match &sidecar_path {
            Some(path) => {
                debug!("{}: sidecar {}", media.path.display(), path.display());
                match load_sidecar(path) {
                    Ok(sidecar) => sidecar,
                    Err(err) => return Ok(FileReport::BadSidecar(err)),
                }
            }
            None => None,
        };

        let outcome = update_file(
            &mut self.writer,
            media,
            sidecar_path.as_deref(),
            sidecar.as_ref(),
            &self.options,
        )?;
        Ok(FileReport::Done(outcome))
    }

    fn report(&mut self, media: &MediaFile, outcome: &Outcome) {
        self.stats.record(outcome.status);

        if outcome.status == Status::Updated {
            return;
        }
        println!(
            "[{}] {} → {}",
            outcome.status,
            media.path.display(),
            outcome.reason.as_deref().unwrap_or("")
        );
    }

    fn print_summary(&self) {
        println!();
        println!();
        println!("=== DONE ===");
        println!("Updated: {}", self.stats.updated);
        println!("Skipped: {}", self.stats.skipped);
        println!("Failed:  {}", self.stats.failed);
        println!("Total:   {}", self.stats.total_files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::exiftool::{ToolOutput, WriteFields};
    use crate::updater::tests::{err, FakeWriter};
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let year = dir.path().join("Photos 2019");
        let album = dir.path().join("Album");
        fs::create_dir(&year).unwrap();
        fs::create_dir(&album).unwrap();

        fs::write(year.join("IMG_1.jpg"), b"x").unwrap();
        fs::write(
            year.join("IMG_1.jpg.supplemental-metadata.json"),
            br#"{"photoTakenTime": {"timestamp": "1674765569", "formatted": "26 Jan 2023, 20:39:29 UTC"}}"#,
        )
        .unwrap();
        fs::write(year.join("scan.png"), b"x").unwrap();
        fs::write(album.join("x.png"), b"x").unwrap();
        fs::write(album.join("bad.jpg"), b"x").unwrap();
        fs::write(album.join("bad.jpg.json"), b"{oops").unwrap();
        dir
    }

    #[test]
    fn test_process_directory_counts() {
        let dir = fixture();
        let mut processor = Processor::new(FakeWriter::default(), UpdateOptions::default());
        let stats = processor.process_directory(dir.path()).unwrap();

        assert_eq!(
            stats,
            ProcessingStats {
                total_files: 4,
                updated: 2,
                skipped: 1,
                failed: 1,
            }
        );

        let written: Vec<(String, String)> = processor
            .writer()
            .writes
            .iter()
            .map(|(p, f)| {
                (
                    p.file_name().unwrap().to_string_lossy().into_owned(),
                    f.date.clone(),
                )
            })
            .collect();
        assert!(written.contains(&("IMG_1.jpg".to_string(), "2023:01:26 20:39:29".to_string())));
        assert!(written.contains(&("scan.png".to_string(), "2019:01:01 12:00:00".to_string())));
        assert_eq!(written.len(), 2);
    }

    #[test]
    fn test_tool_errors_do_not_abort_run() {
        struct Broken;
        impl MetadataWriter for Broken {
            fn write(&mut self, _: &Path, _: &WriteFields) -> Result<ToolOutput, ToolError> {
                Err(ToolError::NotFound {
                    program: "exiftool".to_string(),
                })
            }
            fn read_back(&mut self, _: &Path, _: &str) -> Result<String, ToolError> {
                Ok(String::new())
            }
        }

        let dir = fixture();
        let mut processor = Processor::new(Broken, UpdateOptions::default());
        let stats = processor.process_directory(dir.path()).unwrap();
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 3);
    }

    #[test]
    fn test_tool_failure_counts_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IMG_20230126_203929.jpg"), b"x").unwrap();

        let mut writer = FakeWriter::default();
        writer.outputs.push_back(err("Error: File format error"));
        let mut processor = Processor::new(writer, UpdateOptions::default());
        let stats = processor.process_directory(dir.path()).unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(processor.stats().failed, 1);
    }

    #[test]
    fn test_null_sidecar_falls_back_to_filename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("IMG_20230126_203929.jpg"), b"x").unwrap();
        fs::write(dir.path().join("IMG_20230126_203929.jpg.json"), b"null").unwrap();

        let mut processor = Processor::new(FakeWriter::default(), UpdateOptions::default());
        let stats = processor.process_directory(dir.path()).unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(processor.writer().writes[0].1.date, "2023:01:26 20:39:29");
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = Processor::new(FakeWriter::default(), UpdateOptions::default());
        let stats = processor.process_directory(dir.path()).unwrap();
        assert_eq!(stats, ProcessingStats::default());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut processor = Processor::new(FakeWriter::default(), UpdateOptions::default());
        assert!(processor.process_directory(&dir.path().join("nope")).is_err());
    }
}
