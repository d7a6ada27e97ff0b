//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::{Path, PathBuf};

use crate::application::ApplicationResult;
use crate::domain::{DefinitionPayload, FlatRecord};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Read raw file contents.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Entries of a directory, unordered.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Response export as delivered by an export source.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportPayload {
    /// Delimited export bytes, decoded by the normalizer.
    Bytes(Vec<u8>),
    /// Delimited export wrapped in a base64 envelope.
    Encoded(String),
    /// Rows that are already flat.
    Rows(Vec<FlatRecord>),
}

/// Supplier of survey definitions.
pub trait DefinitionSource: Send + Sync {
    /// Fetch the definition of `survey`.
    fn definitions(&self, survey: &str) -> ApplicationResult<DefinitionPayload>;
}

/// Supplier of raw response exports.
pub trait ExportSource: Send + Sync {
    /// Fetch the response export of `survey`.
    fn export(&self, survey: &str) -> ApplicationResult<ExportPayload>;
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

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}
