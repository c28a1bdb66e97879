//! Data file discovery
//!
//! Command line inputs may be files or directories. Files are kept when they
//! match the data file patterns; directories are walked one level deep, or
//! fully with `recursive`. Results from each directory are sorted.

use photokw_common::config::FilePatterns;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// File discovery errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a data file
    #[error("Not a data file: {0}")]
    NotADataFile(PathBuf),
}

/// Data file scanner
pub struct FileScanner {
    patterns: FilePatterns,
    recursive: bool,
    ignore_patterns: Vec<String>,
}

impl FileScanner {
    /// Create a scanner ignoring hidden system entries like `.DS_Store`
    pub fn new(patterns: FilePatterns, recursive: bool) -> Self {
        Self {
            patterns,
            recursive,
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
            ],
        }
    }

    /// Every data file named by `inputs`, in input order
    ///
    /// Problems with one input are logged and the remaining inputs are still
    /// scanned.
    pub fn collect(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for input in inputs {
            match self.scan(input) {
                Ok(found) => {
                    files.extend(found.into_iter().filter(|f| seen.insert(f.clone())));
                }
                Err(ScanError::NotADataFile(path)) => {
                    tracing::debug!("Skipping {}: not a data file", path.display());
                }
                Err(e) => tracing::error!("{}", e),
            }
        }

        tracing::debug!("Found {} data files", files.len());
        files
    }

    /// Data files below one input path
    pub fn scan(&self, path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !path.exists() {
            return Err(ScanError::PathNotFound(path.to_path_buf()));
        }

        if !path.is_dir() {
            return if self.patterns.is_data_file(path) {
                Ok(vec![path.to_path_buf()])
            } else {
                Err(ScanError::NotADataFile(path.to_path_buf()))
            };
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .max_depth(if self.recursive { usize::MAX } else { 1 })
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.patterns.is_data_file(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let file_name = entry.file_name().to_string_lossy();
        !self.ignore_patterns.iter().any(|p| file_name == p.as_str())
    }
}
