//! Hidden keyword filtering
//!
//! A keyword is hidden when its serialized form matches any exclusion glob.
//! Globs come from three configuration sources:
//! 1. `"<event prefix>|*"` when event keywords are not included
//! 2. `"<people prefix>|*"` when people keywords are not included
//! 3. every configured excluded prefix with `*` appended
//!
//! Prefixes are matched literally; only the appended wildcard is a glob.

use super::KeywordPath;
use crate::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

/// Compiled set of exclusion globs
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

impl ExclusionFilter {
    /// Compile a filter from raw shell-style globs
    ///
    /// Globs that fail to compile are logged and left out.
    pub fn new(patterns: Vec<String>) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            match compile_glob(&pattern) {
                Ok(glob) => {
                    builder.add(glob);
                    kept.push(pattern);
                }
                Err(e) => warn!("Skipping exclusion: {}", e),
            }
        }
        let patterns = kept;
        let set = builder.build().map_err(|e| Error::Pattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;
        Ok(Self { patterns, set })
    }

    /// Build the exclusion globs from the visibility settings
    pub fn from_settings(
        event_prefix: &str,
        people_prefix: &str,
        events_included: bool,
        people_included: bool,
        excluded_prefixes: &[String],
    ) -> Result<Self> {
        let mut patterns = Vec::new();
        if !events_included {
            patterns.push(format!("{}|*", globset::escape(event_prefix)));
        }
        if !people_included {
            patterns.push(format!("{}|*", globset::escape(people_prefix)));
        }
        for prefix in excluded_prefixes {
            patterns.push(format!("{}*", globset::escape(prefix)));
        }
        Self::new(patterns)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_hidden(&self, path: &KeywordPath) -> bool {
        self.is_hidden_str(&path.to_string())
    }

    pub fn is_hidden_str(&self, keyword: &str) -> bool {
        !self.patterns.is_empty() && self.set.is_match(keyword)
    }

    /// Keep the paths that are not hidden, in their original order
    pub fn filter(&self, paths: Vec<KeywordPath>) -> Vec<KeywordPath> {
        paths.into_iter().filter(|p| !self.is_hidden(p)).collect()
    }
}

/// Compile one shell-style glob where `*` also matches `|` and `/`
pub(crate) fn compile_glob(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(false)
        .build()
        .map_err(|e| Error::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
