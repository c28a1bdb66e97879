//! Camera model remapping
//!
//! RAW processors only apply camera-specific corrections to models they know.
//! Files shot with an unsupported model are copied into a sibling directory
//! (`fake_dir`) and the copy's make and model are rewritten to a supported
//! body.

use crate::config::Settings;
use crate::error::{TaggerError, TaggerResult};
use crate::metadata::MetadataRecord;
use crate::tags::StoreProvider;
use photokw_common::config::ModelMapping;
use photokw_common::keywords::ResolverSession;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub struct Remapper<'a> {
    settings: &'a Settings,
    provider: &'a dyn StoreProvider,
    session: ResolverSession,
}

impl<'a> Remapper<'a> {
    pub fn new(settings: &'a Settings, provider: &'a dyn StoreProvider) -> Self {
        Self {
            settings,
            provider,
            session: ResolverSession::new(),
        }
    }

    /// Configured mapping for `model`, ignoring case
    pub fn mapping_for(&self, model: &str) -> Option<&'a ModelMapping> {
        self.settings
            .config
            .models
            .iter()
            .find(|m| m.model.eq_ignore_ascii_case(model.trim()))
    }

    /// Where the copy of `path` goes
    pub fn target_path(&self, path: &Path) -> TaggerResult<PathBuf> {
        let file_name = path
            .file_name()
            .ok_or_else(|| TaggerError::PathNotFound(path.to_path_buf()))?;
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(&self.settings.config.fake_dir).join(file_name))
    }

    /// Copy and rewrite one file; returns the copy, if one was made
    pub fn remap_file(&mut self, path: &Path) -> TaggerResult<Option<PathBuf>> {
        let record = MetadataRecord::open(path, self.provider, self.settings, &mut self.session)?;
        let (_, model) = record.get_make_model();
        record.close();

        let Some(model) = model else {
            debug!("{}: no camera model", path.display());
            return Ok(None);
        };
        let Some(mapping) = self.mapping_for(&model) else {
            debug!("{}: {} not remapped", path.display(), model);
            return Ok(None);
        };

        let target = self.target_path(path)?;
        if self.settings.dry_run {
            info!("Would copy {} to {}", path.display(), target.display());
            info!("and replace {} with {}", model, mapping.mapped_model);
            return Ok(None);
        }

        if let Some(dir) = target.parent() {
            if !dir.exists() {
                info!("Creating {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }
        if target.exists() {
            info!("Copying {} over {}", path.display(), target.display());
        } else {
            info!("Copying {} to {}", path.display(), target.display());
        }
        std::fs::copy(path, &target)?;

        info!("Replacing '{}' with '{}'", model, mapping.mapped_model);
        let mut copy = MetadataRecord::open(&target, self.provider, self.settings, &mut self.session)?;
        copy.set_make_model(&mapping.make, &mapping.mapped_model);
        copy.write_changes(false, false)?;
        copy.close();

        Ok(Some(target))
    }

    /// Remap every file, logging failures; returns the copies made
    pub fn remap(&mut self, files: &[PathBuf]) -> Vec<PathBuf> {
        let settings = self.settings;
        let fake_dir = settings.config.fake_dir.as_str();
        files
            .iter()
            .filter(|file| {
                // never remap copies made by an earlier run
                file.parent()
                    .and_then(Path::file_name)
                    .map_or(true, |dir| dir != fake_dir)
            })
            .filter_map(|file| match self.remap_file(file) {
                Ok(copy) => copy,
                Err(e) => {
                    error!("Problem remapping {}: {}", file.display(), e);
                    None
                }
            })
            .collect()
    }
}
