//! Configuration loading
//!
//! Settings come from a TOML file. Every field has a built-in default, so a
//! missing or unreadable file degrades to defaults instead of failing.
//!
//! # Config file location
//!
//! 1. Explicit path (command line)
//! 2. `<config dir>/photokw/config.toml` (e.g. `~/.config/photokw/config.toml`)
//! 3. Built-in defaults

use crate::{Error, Result};
use globset::{GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// File-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// First topic of event keywords
    pub event_prefix: String,

    /// Number of trailing event keyword topics that form the event string
    pub event_tag_count: usize,

    /// Joins event topics into the event string
    pub event_separator: String,

    /// First topic of people keywords
    pub people_prefix: String,

    /// First topic of the synthesized location keyword
    pub places_prefix: String,

    /// Second topic of placeholder keywords for unmapped faces
    pub people_unknown_prefix: String,

    pub keywords_event_included: bool,
    pub keywords_people_included: bool,

    /// Append the street-level location to the Places keyword
    pub keywords_location_included: bool,

    /// Keyword prefixes hidden from written keywords
    pub keywords_excluded: Vec<String>,

    /// Reverse geocoding backend: "none" or "google"
    pub geocode_backend: String,

    /// API key for the geocoding backend
    pub geocode_api_key: Option<String>,

    /// Radius in metres within which a cached geocode result is reused
    pub geocode_coalesce: f64,

    /// Minimum file age in seconds before watch mode touches a file
    pub update_delay: u64,

    /// Filename globs identifying data files
    pub file_patterns: Vec<String>,

    /// Keyword list exported from the catalog
    pub keywords_file: Option<PathBuf>,

    /// People keyword paths relative to the people prefix ("Family|Jane Doe")
    pub people: Vec<String>,

    /// Directory (relative to each file) receiving remapped copies
    pub fake_dir: String,

    /// Camera models rewritten by the remap command
    pub models: Vec<ModelMapping>,

    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            event_prefix: "Events".to_string(),
            event_tag_count: 1,
            event_separator: ", ".to_string(),
            people_prefix: "People".to_string(),
            places_prefix: "Places".to_string(),
            people_unknown_prefix: "Unknown".to_string(),
            keywords_event_included: true,
            keywords_people_included: true,
            keywords_location_included: true,
            keywords_excluded: Vec::new(),
            geocode_backend: "none".to_string(),
            geocode_api_key: None,
            geocode_coalesce: 250.0,
            update_delay: 5,
            file_patterns: default_file_patterns(),
            keywords_file: None,
            people: Vec::new(),
            fake_dir: "fake".to_string(),
            models: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_file_patterns() -> Vec<String> {
    ["*.xmp", "*.tif", "*.tiff", "*.jpg", "*.jpeg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Camera model rewrite entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMapping {
    /// Model as written by the camera (case-insensitive match)
    pub model: String,
    /// Make written to the copy
    pub make: String,
    /// Model written to the copy
    pub mapped_model: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file, failing on I/O or syntax errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))
    }
}

/// Load configuration, falling back to defaults on any problem
///
/// Returns the config together with the file it came from, if any.
pub fn load_or_default(explicit: Option<&Path>) -> (TomlConfig, Option<PathBuf>) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => {
                info!("No config file found, using built-in defaults");
                return (TomlConfig::default(), None);
            }
        },
    };

    match TomlConfig::load(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            (config, Some(path))
        }
        Err(e) => {
            error!("Failed to read config: {}", e);
            warn!("Using built-in defaults");
            (TomlConfig::default(), Some(path))
        }
    }
}

/// Platform config file path (`<config dir>/photokw/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("photokw").join("config.toml"))
}

/// Compiled data file globs
#[derive(Debug, Clone)]
pub struct FilePatterns {
    patterns: Vec<String>,
    set: GlobSet,
}

impl FilePatterns {
    /// Compile filename globs; matching ignores case and `*` crosses directories
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = globset::GlobBuilder::new(pattern)
                .literal_separator(false)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Pattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| Error::Pattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_data_file(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}
