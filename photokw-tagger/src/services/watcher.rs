//! Watch mode
//!
//! A `notify` watcher sends changed paths into a channel. Once per second the
//! loop drains the channel into the pending set and handles every file older
//! than `update_delay`; younger files stay pending for a later tick. Changes to
//! the config or keyword file reload the settings.

use crate::config::Settings;
use crate::error::TaggerResult;
use crate::services::processor::Processor;
use crate::tags::StoreProvider;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Changed files waiting to settle
#[derive(Debug, Default)]
pub struct PendingFiles {
    files: BTreeSet<PathBuf>,
}

impl PendingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf) {
        self.files.insert(path);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove and return files last modified at least `min_age` ago
    ///
    /// Files that no longer exist are dropped.
    pub fn take_ready(&mut self, min_age: Duration) -> Vec<PathBuf> {
        let mut ready = Vec::new();
        let mut young = BTreeSet::new();

        for path in std::mem::take(&mut self.files) {
            match file_age(&path) {
                Some(age) if age >= min_age => ready.push(path),
                Some(_) => {
                    trace!("{}: too young", path.display());
                    young.insert(path);
                }
                None => debug!("{}: gone", path.display()),
            }
        }

        self.files = young;
        ready
    }
}

/// Time since the last modification, `None` if the file cannot be read
pub fn file_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(SystemTime::now().duration_since(modified).unwrap_or_default())
}

fn is_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// Watch `base` until Ctrl+C, fixing data files as they settle
pub async fn watch(
    mut settings: Settings,
    provider: &dyn StoreProvider,
    base: &Path,
    no_geo: bool,
) -> TaggerResult<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| match result {
            Ok(event) if is_change(&event.kind) => {
                for path in event.paths {
                    if events_tx.send(path).is_err() {
                        error!("Unable to queue watcher event: channel closed");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => error!("Watch error: {}", e),
        },
        Config::default(),
    )?;

    watcher.watch(base, RecursiveMode::Recursive)?;
    for extra in [settings.config_file.clone(), settings.keyword_file.clone()]
        .into_iter()
        .flatten()
    {
        match watcher.watch(&extra, RecursiveMode::NonRecursive) {
            Ok(()) => info!("Watching {}", extra.display()),
            Err(e) => warn!("Cannot watch {}: {}", extra.display(), e),
        }
    }
    info!("Watching {}", base.display());

    let mut geocoder = settings.geocoder();
    let mut pending = PendingFiles::new();
    let mut interval = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }

        while let Ok(path) = events_rx.try_recv() {
            pending.insert(path);
        }
        if pending.is_empty() {
            continue;
        }

        let ready = pending.take_ready(Duration::from_secs(settings.config.update_delay));
        let (config_files, data_files): (Vec<PathBuf>, Vec<PathBuf>) =
            ready.into_iter().partition(|p| settings.is_config_file(p));

        if !config_files.is_empty() {
            match settings.reload() {
                Ok(()) => geocoder = settings.geocoder(),
                Err(e) => error!("Failed to reload settings: {}", e),
            }
        }

        let mut processor = Processor::new(&settings, provider, geocoder.as_ref());
        for file in data_files.iter().filter(|f| settings.is_data_file(f)) {
            debug!("Checking {}", file.display());
            if let Err(e) = processor.fix_file(file, no_geo).await {
                error!("{}: error ({})", file.display(), e);
            }
        }
    }

    Ok(())
}
