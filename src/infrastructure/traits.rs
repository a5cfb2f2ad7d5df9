//! I/O boundary traits for testability
//!
//! These traits abstract the collaborators the export logic talks to, allowing
//! services to be tested with mock implementations.

use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::ExportDescriptor;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// How the archival service hands the datasets to the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// Copy into the user's personal folder
    Normal,
    /// Build a zip archive for download
    Zip,
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveMode::Normal => f.write_str("normal"),
            ArchiveMode::Zip => f.write_str("zip"),
        }
    }
}

/// One call of the server-side dataset copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub experiment_id: String,
    #[serde(rename = "type")]
    pub type_code: String,
    pub identifier: String,
    pub specimen_name: String,
    pub mode: ArchiveMode,
}

impl ArchiveRequest {
    pub fn new(descriptor: &ExportDescriptor, mode: ArchiveMode) -> Self {
        Self {
            experiment_id: descriptor.experiment_id.clone(),
            type_code: descriptor.type_code.clone(),
            identifier: descriptor.identifier.clone(),
            specimen_name: descriptor.specimen_name.clone(),
            mode,
        }
    }
}

/// Server-side copy/zip of datasets into a user-accessible location.
///
/// Fire-and-forget from the caller's point of view: an `Ok` means the request
/// was handed over, not that the copy finished.
pub trait ArchivalService: Send + Sync {
    fn copy_datasets_to_user_dir(&self, request: &ArchiveRequest) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_descriptor_when_building_request_then_copies_fields() {
        let descriptor = ExportDescriptor {
            type_code: "LSR_FORTESSA_PLATE".into(),
            identifier: "/S/P/PLATE1".into(),
            specimen_name: "Specimen_A".into(),
            experiment_id: "/S/P/EXP1".into(),
        };
        let request = ArchiveRequest::new(&descriptor, ArchiveMode::Zip);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "LSR_FORTESSA_PLATE");
        assert_eq!(json["specimenName"], "Specimen_A");
        assert_eq!(json["experimentId"], "/S/P/EXP1");
        assert_eq!(json["mode"], "zip");
    }
}
