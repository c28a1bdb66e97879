//! Command implementations
//!
//! - file discovery for the batch commands
//! - batch processing (fix, keywords, find, dump)
//! - watch mode
//! - camera model remapping

pub mod file_scanner;
pub mod processor;
pub mod remap;
pub mod watcher;

pub use file_scanner::{FileScanner, ScanError};
pub use processor::{BatchReport, Processor, ReadOptions};
pub use remap::Remapper;
pub use watcher::{watch, PendingFiles};
