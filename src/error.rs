use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load a sidecar JSON file
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("Failed to read sidecar: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid sidecar JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl SidecarError {
    pub fn path(&self) -> &Path {
        match self {
            SidecarError::Read { path, .. } | SidecarError::Parse { path, .. } => path,
        }
    }
}

/// Failure to run the external metadata tool at all
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{program} not found. Please install exiftool or pass --exiftool <PATH>.")]
    NotFound { program: String },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

impl ToolError {
    pub(crate) fn from_io(program: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound {
                program: program.to_string(),
            }
        } else {
            ToolError::Spawn {
                program: program.to_string(),
                source: err,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e = ToolError::from_io("exiftool", err);
        assert!(matches!(e, ToolError::NotFound { .. }));
        assert_eq!(
            e.to_string(),
            "exiftool not found. Please install exiftool or pass --exiftool <PATH>."
        );
    }

    #[test]
    fn test_tool_error_spawn() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e = ToolError::from_io("/opt/exiftool", err);
        assert_eq!(e.to_string(), "Failed to run /opt/exiftool: denied");
    }

    #[test]
    fn test_sidecar_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e = SidecarError::Parse {
            path: PathBuf::from("/takeout/a.jpg.json"),
            source,
        };
        assert!(e.to_string().starts_with("Invalid sidecar JSON: "));
        assert_eq!(e.path(), Path::new("/takeout/a.jpg.json"));
    }
}
