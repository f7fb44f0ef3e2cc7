use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::error::ToolError;

/// Tag read back after a write to confirm it landed
pub const VALIDATION_TAG: &str = "DateTimeOriginal";

/// Field assignments for one write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFields {
    pub date: String,
    pub file_modify_date: bool,
    pub gps: Option<(f64, f64)>,
    pub description: Option<String>,
}

impl WriteFields {
    /// Arguments preceding the file path
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-overwrite_original".to_string(),
            "-ignoreMinorErrors".to_string(),
            format!("-DateTimeOriginal={}", self.date),
            format!("-CreateDate={}", self.date),
            format!("-ModifyDate={}", self.date),
        ];

        if self.file_modify_date {
            args.push(format!("-FileModifyDate={}", self.date));
        }

        if let Some((lat, lon)) = self.gps {
            args.push(format!("-GPSLatitude={}", lat));
            args.push(format!("-GPSLongitude={}", lon));
        }

        if let Some(desc) = &self.description {
            args.push(format!("-ImageDescription={}", desc));
        }

        args
    }
}

/// What the tool reported for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// External metadata editor
pub trait MetadataWriter {
    fn write(&mut self, path: &Path, fields: &WriteFields) -> Result<ToolOutput, ToolError>;

    /// Bare value of `tag`, trimmed
    fn read_back(&mut self, path: &Path, tag: &str) -> Result<String, ToolError>;
}

/// Runs the `exiftool` binary once per call
#[derive(Debug, Clone)]
pub struct ExifToolCli {
    program: String,
}

impl Default for ExifToolCli {
    fn default() -> Self {
        ExifToolCli::new("exiftool")
    }
}

impl ExifToolCli {
    pub fn new(program: impl Into<String>) -> Self {
        ExifToolCli {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `-ver` and return the reported version
    pub fn check_available(&self) -> Result<String, ToolError> {
        let output = self.run(&["-ver".to_string()], None)?;
        if output.success {
            Ok(output.stdout.trim().to_string())
        } else {
            Err(ToolError::Spawn {
                program: self.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, output.stderr),
            })
        }
    }

    fn run(&self, args: &[String], path: Option<&Path>) -> Result<ToolOutput, ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(path) = path {
            cmd.arg(path);
        }
        debug!("Running {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| ToolError::from_io(&self.program, e))?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl MetadataWriter for ExifToolCli {
    fn write(&mut self, path: &Path, fields: &WriteFields) -> Result<ToolOutput, ToolError> {
        self.run(&fields.to_args(), Some(path))
    }

    fn read_back(&mut self, path: &Path, tag: &str) -> Result<String, ToolError> {
        let args = [
            "-ignoreMinorErrors".to_string(),
            format!("-{}", tag),
            "-s3".to_string(),
        ];
        let output = self.run(&args, Some(path))?;
        Ok(output.stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_args_minimal() {
        let fields = WriteFields {
            date: "2023:01:26 20:39:29".to_string(),
            file_modify_date: false,
            gps: None,
            description: None,
        };
        assert_eq!(
            fields.to_args(),
            vec![
                "-overwrite_original",
                "-ignoreMinorErrors",
                "-DateTimeOriginal=2023:01:26 20:39:29",
                "-CreateDate=2023:01:26 20:39:29",
                "-ModifyDate=2023:01:26 20:39:29",
            ]
        );
    }

    #[test]
    fn test_write_args_full() {
        let fields = WriteFields {
            date: "2019:01:01 12:00:00".to_string(),
            file_modify_date: true,
            gps: Some((37.7749, -122.4194)),
            description: Some("Golden Gate".to_string()),
        };
        let args = fields.to_args();
        assert_eq!(args.len(), 9);
        assert_eq!(args[5], "-FileModifyDate=2019:01:01 12:00:00");
        assert_eq!(args[6], "-GPSLatitude=37.7749");
        assert_eq!(args[7], "-GPSLongitude=-122.4194");
        assert_eq!(args[8], "-ImageDescription=Golden Gate");
    }

    #[test]
    fn test_integral_coordinates_render_plain() {
        let fields = WriteFields {
            date: "2019:01:01 12:00:00".to_string(),
            file_modify_date: false,
            gps: Some((45.0, 7.0)),
            description: None,
        };
        let args = fields.to_args();
        assert!(args.contains(&"-GPSLatitude=45".to_string()));
        assert!(args.contains(&"-GPSLongitude=7".to_string()));
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let tool = ExifToolCli::new("definitely-not-an-installed-exiftool");
        assert!(matches!(
            tool.check_available(),
            Err(ToolError::NotFound { .. })
        ));
    }
}
