use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use sha2::{Digest, Sha256};

use crate::error::{ComptesError, Result};
use crate::staging::{is_valid_file, source_files};

pub fn compute_checksum(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Last seen content checksum per source file. Saving a workbook fires
/// several events, and some rewrite identical bytes.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    checksums: HashMap<PathBuf, String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current state of every source file in `dir`.
    pub fn prime(&mut self, dir: &Path) -> Result<()> {
        for path in source_files(dir)? {
            let sum = compute_checksum(&path)?;
            self.checksums.insert(path, sum);
        }
        Ok(())
    }

    /// True when `path` is a source file whose content differs from what
    /// was last seen. Unreadable files (mid-write, deleted) never count.
    pub fn has_changed(&mut self, path: &Path) -> bool {
        if !is_valid_file(path) {
            return false;
        }
        let sum = match compute_checksum(path) {
            Ok(sum) => sum,
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "skipping unreadable file");
                return false;
            }
        };
        match self.checksums.get(path) {
            Some(previous) if *previous == sum => false,
            _ => {
                self.checksums.insert(path.to_path_buf(), sum);
                true
            }
        }
    }
}

/// React to one debounced batch: call `on_change` once when any event in it
/// touches a changed source file. A failed run is logged and swallowed.
/// Returns whether a run was triggered.
pub fn handle_batch<F>(tracker: &mut ChangeTracker, events: &[DebouncedEvent], on_change: &mut F) -> bool
where
    F: FnMut() -> Result<()>,
{
    let changed: Vec<&Path> = events
        .iter()
        .filter(|e| e.kind == DebouncedEventKind::Any)
        .map(|e| e.path.as_path())
        .filter(|p| tracker.has_changed(p))
        .collect();
    if changed.is_empty() {
        return false;
    }
    for path in &changed {
        tracing::info!(file = %path.display(), "change detected");
    }
    if let Err(e) = on_change() {
        tracing::error!(error = %e, "refresh failed");
    }
    true
}

/// Block on `dir` and call `on_change` once per debounced batch that touches
/// a changed source file. Runs happen inside the receive loop, one at a time;
/// a failed run is logged and watching goes on.
pub fn watch<F>(dir: &Path, mut on_change: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let mut tracker = ChangeTracker::new();
    tracker.prime(dir)?;

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)
        .map_err(|e| ComptesError::Watch(format!("cannot create watcher: {e}")))?;
    debouncer
        .watcher()
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| ComptesError::Watch(format!("cannot watch {}: {e}", dir.display())))?;
    tracing::info!(dir = %dir.display(), "watching");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                handle_batch(&mut tracker, &events, &mut on_change);
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "watch error");
            }
            Err(e) => {
                return Err(ComptesError::Watch(format!("event channel closed: {e}")));
            }
        }
    }
}
