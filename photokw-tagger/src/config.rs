//! Runtime settings for photokw-tagger
//!
//! Combines the TOML config, command line overrides and the keyword export
//! file into the state every command works from. Resolution happens once;
//! watch mode calls [`Settings::reload`] when the config or keyword file
//! changes.
//!
//! **Priority for the geocode API key:** ENV → TOML

use crate::error::TaggerResult;
use crate::geocode::{self, Geocoder};
use photokw_common::config::{load_or_default, FilePatterns, TomlConfig};
use photokw_common::keywords::indented::read_keyword_file;
use photokw_common::keywords::{ExclusionFilter, PeopleResolver};
use photokw_common::{KeywordPath, KeywordTree};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable holding the geocode API key
pub const GEOCODE_API_KEY_ENV: &str = "PHOTOKW_GEOCODE_API_KEY";

/// Command line values that override the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub keyword_file: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: u8,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: TomlConfig,
    pub config_file: Option<PathBuf>,
    pub keyword_file: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: u8,
    pub geocode_api_key: Option<String>,
    pub people: PeopleResolver,
    pub exclusions: ExclusionFilter,
    /// Keyword export file contents (empty without a keyword file)
    pub keywords: KeywordTree,
    pub file_patterns: FilePatterns,
    overrides: Overrides,
}

impl Settings {
    /// Load the config file (or defaults) and resolve it
    pub fn load(overrides: Overrides) -> TaggerResult<Self> {
        let (config, config_file) = load_or_default(overrides.config_file.as_deref());
        Self::resolve(config, config_file, overrides)
    }

    /// Resolve a parsed config against the command line overrides
    pub fn resolve(
        config: TomlConfig,
        config_file: Option<PathBuf>,
        overrides: Overrides,
    ) -> TaggerResult<Self> {
        let keyword_file = overrides
            .keyword_file
            .clone()
            .or_else(|| config.keywords_file.clone());

        let keywords = match &keyword_file {
            Some(path) => match read_keyword_file(path) {
                Ok(tree) => {
                    info!("Loaded keywords from {}", path.display());
                    tree
                }
                Err(e) => {
                    warn!("Ignoring keyword file: {}", e);
                    KeywordTree::new()
                }
            },
            None => KeywordTree::new(),
        };

        let people = build_people(&config, &keywords)?;
        let exclusions = ExclusionFilter::from_settings(
            &config.event_prefix,
            &config.people_prefix,
            config.keywords_event_included,
            config.keywords_people_included,
            &config.keywords_excluded,
        )?;
        let file_patterns = FilePatterns::new(&config.file_patterns)?;
        let geocode_api_key = resolve_geocode_api_key(&config);

        debug!(
            "Resolved settings: {} people, {} exclusions",
            people.len(),
            exclusions.patterns().len()
        );

        Ok(Self {
            config_file,
            keyword_file,
            dry_run: overrides.dry_run,
            verbose: overrides.verbose,
            geocode_api_key,
            people,
            exclusions,
            keywords,
            file_patterns,
            config,
            overrides,
        })
    }

    /// Re-read the config and keyword files with the original overrides
    pub fn reload(&mut self) -> TaggerResult<()> {
        info!("Reloading settings");
        let mut overrides = self.overrides.clone();
        if overrides.config_file.is_none() {
            overrides.config_file = self.config_file.clone();
        }
        *self = Self::load(overrides)?;
        Ok(())
    }

    /// Every keyword in the keyword export file
    pub fn known_keywords(&self) -> BTreeSet<KeywordPath> {
        self.keywords.to_paths()
    }

    pub fn is_data_file(&self, path: &Path) -> bool {
        self.file_patterns.is_data_file(path)
    }

    /// Whether `path` is the config file or the keyword file
    pub fn is_config_file(&self, path: &Path) -> bool {
        let same = |other: &Option<PathBuf>| match other {
            Some(other) => same_file(path, other),
            None => false,
        };
        same(&self.config_file) || same(&self.keyword_file)
    }

    /// Geocoder selected by the config
    pub fn geocoder(&self) -> Box<dyn Geocoder> {
        geocode::from_settings(
            &self.config.geocode_backend,
            self.geocode_api_key.as_deref(),
            self.config.geocode_coalesce,
        )
    }

    /// Human readable summary for the `config` command
    pub fn describe(&self) -> TaggerResult<String> {
        let mut out = String::new();
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        };
        let _ = writeln!(out, "# config file: {}", path(&self.config_file));
        let _ = writeln!(out, "# keyword file: {}", path(&self.keyword_file));
        let _ = writeln!(out, "# dry run: {}", self.dry_run);
        let _ = writeln!(
            out,
            "# geocode api key: {}",
            if self.geocode_api_key.is_some() { "set" } else { "not set" }
        );
        out.push('\n');
        out.push_str(&self.config.to_toml_string()?);

        out.push_str("\n# people\n");
        for (name, path) in self.people.entries() {
            let _ = writeln!(out, "#   {} -> {}", name, path);
        }
        out.push_str("\n# exclusions\n");
        for pattern in self.exclusions.patterns() {
            let _ = writeln!(out, "#   {}", pattern);
        }
        let _ = writeln!(out, "\n# {} known keywords", self.known_keywords().len());
        Ok(out)
    }
}

/// People mapping from the config's `people` list plus the keyword file's
/// people section
///
/// Entries filed below the unknown prefix are placeholders and are skipped.
fn build_people(config: &TomlConfig, keywords: &KeywordTree) -> TaggerResult<PeopleResolver> {
    let mut people = PeopleResolver::new(&config.people_prefix, &config.people_unknown_prefix);

    for entry in &config.people {
        match entry.parse::<KeywordPath>() {
            Ok(path) => people.add(&path)?,
            Err(e) => warn!("Skipping people entry '{}': {}", entry, e),
        }
    }

    if let Some(section) = keywords.subtree(&config.people_prefix) {
        for path in section.to_paths() {
            if path.len() > 1 && path.in_category(&config.people_unknown_prefix) {
                continue;
            }
            people.add(&path)?;
        }
    }

    Ok(people)
}

/// API key from the environment, then the TOML config
fn resolve_geocode_api_key(config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(GEOCODE_API_KEY_ENV)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = config
        .geocode_api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("Geocode API key found in environment and TOML. Using environment.");
    }

    if let Some(key) = env_key {
        info!("Geocode API key loaded from environment variable");
        return Some(key);
    }
    if let Some(key) = toml_key {
        info!("Geocode API key loaded from TOML config");
        return Some(key);
    }
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_people(people: &[&str]) -> TomlConfig {
        TomlConfig {
            people: people.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_people_from_config() {
        let config = config_with_people(&["Family|Jane Doe", "Friends|Bob", "bad||entry"]);
        let people = build_people(&config, &KeywordTree::new()).unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(
            people.lookup("jane doe").map(ToString::to_string).as_deref(),
            Some("People|Family|Jane Doe")
        );
    }

    #[test]
    fn test_people_from_keyword_file_skip_unknown() {
        let paths: Vec<KeywordPath> = ["People|Work|Alice", "People|Unknown|Carol", "Events|Trip"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let keywords = KeywordTree::from_paths(&paths);
        let people = build_people(&TomlConfig::default(), &keywords).unwrap();

        assert_eq!(people.len(), 1);
        assert!(people.lookup("alice").is_some());
        assert!(people.lookup("carol").is_none());
    }

    #[test]
    fn test_resolve_builds_exclusions() {
        let config = TomlConfig {
            keywords_event_included: false,
            keywords_excluded: vec!["Private".to_string()],
            ..Default::default()
        };
        let settings = Settings::resolve(config, None, Overrides::default()).unwrap();
        assert_eq!(settings.exclusions.patterns(), &["Events|*", "Private*"]);
        assert!(settings.known_keywords().is_empty());
    }

    #[test]
    fn test_resolve_with_glob_characters_in_prefix() {
        let config = TomlConfig {
            keywords_excluded: vec!["Old [draft".to_string()],
            ..Default::default()
        };
        let settings = Settings::resolve(config, None, Overrides::default()).unwrap();
        assert!(settings.exclusions.is_hidden_str("Old [draft|Scan"));
        assert!(!settings.exclusions.is_hidden_str("Old d|Scan"));
    }

    #[test]
    fn test_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key("   "));
        assert!(!is_valid_key(""));
    }
}
