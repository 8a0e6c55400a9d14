//! Data folder scanning
//!
//! Lists the input files the index is built from. Hidden entries are skipped
//! and results are sorted so repeated scans merge in the same order.

use std::path::{Path, PathBuf};
use stridex_common::loader::is_supported_name;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Data folder scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Finds supported input files in a folder
#[derive(Debug, Clone, Copy, Default)]
pub struct DataFileScanner {
    recursive: bool,
}

impl DataFileScanner {
    /// Top-level files only
    pub fn new() -> Self {
        Self { recursive: false }
    }

    /// Descend into sub-folders as well
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Supported files under `folder`, sorted by path
    pub fn scan(&self, folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !folder.exists() {
            return Err(ScanError::PathNotFound(folder.to_path_buf()));
        }
        if !folder.is_dir() {
            return Err(ScanError::NotADirectory(folder.to_path_buf()));
        }

        let walker = WalkDir::new(folder)
            .follow_links(false)
            .max_depth(if self.recursive { usize::MAX } else { 1 })
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_supported_name(&entry.file_name().to_string_lossy()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => warn!("Error accessing entry: {}", e),
            }
        }
        files.sort();

        debug!(folder = %folder.display(), files = files.len(), "Scanned data folder");
        Ok(files)
    }

    /// Delete every supported file the scan would return
    ///
    /// Returns the removed file names.
    pub fn remove_all(&self, folder: &Path) -> Result<Vec<String>, ScanError> {
        let mut removed = Vec::new();
        for path in self.scan(folder)? {
            std::fs::remove_file(&path)?;
            removed.push(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        Ok(removed)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
