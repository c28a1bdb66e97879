//! Batch processing of data files
//!
//! Each command opens one [`MetadataRecord`] per file, in order. A failing
//! file is logged with its path and the batch moves on.

use crate::config::Settings;
use crate::error::TaggerResult;
use crate::geocode::Geocoder;
use crate::metadata::MetadataRecord;
use crate::tags::{Namespace, StoreProvider};
use photokw_common::keywords::{remove_duplicates, tidy_unknown_people, ResolverSession};
use photokw_common::{KeywordPath, KeywordTree};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Counts for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Options shared by the keyword reading commands
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Skip `fix_up` and use keywords as they are
    pub no_fix: bool,
    /// Skip reverse geocoding
    pub no_geo: bool,
}

pub struct Processor<'a> {
    settings: &'a Settings,
    provider: &'a dyn StoreProvider,
    geocoder: &'a dyn Geocoder,
    session: ResolverSession,
}

impl<'a> Processor<'a> {
    pub fn new(
        settings: &'a Settings,
        provider: &'a dyn StoreProvider,
        geocoder: &'a dyn Geocoder,
    ) -> Self {
        Self {
            settings,
            provider,
            geocoder,
            session: ResolverSession::new(),
        }
    }

    fn open(&mut self, path: &Path) -> TaggerResult<MetadataRecord<'a>> {
        MetadataRecord::open(path, self.provider, self.settings, &mut self.session)
    }

    /// Open a record and apply the requested fix-ups
    async fn prepare(&mut self, path: &Path, options: ReadOptions) -> TaggerResult<MetadataRecord<'a>> {
        let mut record = self.open(path)?;
        if self.settings.verbose > 0 {
            debug!("{}: created by {}", path.display(), record.get_creator());
        }
        if options.no_geo {
            debug!("Skipping GPS to location lookup");
        } else {
            record.fix_up_geo(self.geocoder).await;
        }
        if options.no_fix {
            debug!("Skipping tag fix");
        } else {
            record.fix_up();
        }
        Ok(record)
    }

    /// Fix one file and write its changes; returns whether it was written
    pub async fn fix_file(&mut self, path: &Path, no_geo: bool) -> TaggerResult<bool> {
        info!("{}: processing", path.display());
        let options = ReadOptions { no_fix: false, no_geo };
        let mut record = self.prepare(path, options).await?;
        let written = record.write_changes(false, self.settings.dry_run)?;
        record.close();
        Ok(written)
    }

    /// Fix every file
    pub async fn fix(&mut self, files: &[PathBuf], no_geo: bool) -> BatchReport {
        let mut report = BatchReport::default();
        for file in files {
            report.processed += 1;
            match self.fix_file(file, no_geo).await {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Problem reading {}: {}", file.display(), e);
                    report.failed += 1;
                }
            }
        }
        info!(
            "Processed {} files: {} updated, {} failed",
            report.processed, report.updated, report.failed
        );
        report
    }

    /// Union of every file's keywords merged with the keyword file,
    /// unknown people tidied
    pub async fn collect_keywords(&mut self, files: &[PathBuf], options: ReadOptions) -> KeywordTree {
        let mut all: Vec<KeywordPath> = Vec::new();
        for file in files {
            match self.prepare(file, options).await {
                Ok(record) => {
                    all.extend(record.get_all_keywords());
                    record.close();
                }
                Err(e) => error!("Problem reading {}: {}", file.display(), e),
            }
        }

        if self.settings.keyword_file.is_some() {
            all.extend(self.settings.known_keywords());
        }

        let config = &self.settings.config;
        let tidy = tidy_unknown_people(
            remove_duplicates(all),
            &config.people_prefix,
            &config.people_unknown_prefix,
        );
        KeywordTree::from_paths(&tidy)
    }

    /// Files having a keyword whose serialized form contains `needle`
    pub async fn find(&mut self, needle: &str, files: &[PathBuf]) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for file in files {
            match self.prepare(file, ReadOptions::default()).await {
                Ok(record) => {
                    if record
                        .get_all_keywords()
                        .iter()
                        .any(|keyword| keyword.to_string().contains(needle))
                    {
                        found.push(file.clone());
                    }
                    record.close();
                }
                Err(e) => error!("Problem reading {}: {}", file.display(), e),
            }
        }
        found
    }

    /// Raw XMP and/or EXIF tags of one file as JSON
    pub fn dump(&mut self, path: &Path, xmp: bool, exif: bool) -> TaggerResult<serde_json::Value> {
        let record = self.open(path)?;
        let mut value = json!({ "file": path.display().to_string() });
        if xmp {
            value["xmp"] = serde_json::to_value(record.tags(Namespace::Xmp))?;
        }
        if exif {
            value["exif"] = serde_json::to_value(record.tags(Namespace::Exif))?;
        }
        let place = record.get_place();
        if !place.is_empty() {
            value["place"] = serde_json::to_value(place)?;
        }
        record.close();
        Ok(value)
    }

    /// Dump every file, logging failures
    pub fn dump_all(&mut self, files: &[PathBuf], xmp: bool, exif: bool) -> Vec<serde_json::Value> {
        files
            .iter()
            .filter_map(|file| match self.dump(file, xmp, exif) {
                Ok(value) => Some(value),
                Err(e) => {
                    error!("Problem reading {}: {}", file.display(), e);
                    None
                }
            })
            .collect()
    }

    /// Face names without a people mapping seen in this batch, sorted
    pub fn unknown_people(&self) -> Vec<String> {
        let mut names: Vec<String> = self.session.unknown_names().cloned().collect();
        names.sort();
        names
    }
}
