//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Filesystem-driven extension overrides.
//!
//! Every regular file under the watched directory contributes one
//! extension: the file's basename is the key and its contents, with
//! trailing whitespace removed, are the value. Names that are not valid
//! extension keys (`[a-z0-9]+`) are skipped with a warning.

use crate::event::{Event, is_valid_extension_key};
use notify::{EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Watches a directory and stamps its files onto events as extensions.
///
/// The first [`apply`](Self::apply) walks the directory; after that the map
/// is kept current by [`watch`](Self::watch).
#[derive(Debug)]
pub struct OverrideObserver {
    dir: PathBuf,
    overrides: Mutex<BTreeMap<String, String>>,
    walked: OnceLock<()>,
}

impl OverrideObserver {
    /// Creates an observer of `dir`. Nothing is read until first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overrides: Mutex::new(BTreeMap::new()),
            walked: OnceLock::new(),
        }
    }

    /// Returns the watched directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns a snapshot of the current overrides.
    #[must_use]
    pub fn overrides(&self) -> BTreeMap<String, String> {
        self.overrides.lock().clone()
    }

    /// Reads every file under the directory, replacing the override map.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory cannot be listed. The map is
    /// left unchanged.
    pub fn walk(&self) -> io::Result<()> {
        let mut fresh = BTreeMap::new();
        let mut pending = vec![self.dir.clone()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Some((key, value)) = read_override(&path) {
                    fresh.insert(key, value);
                }
            }
        }
        let count = fresh.len();
        *self.overrides.lock() = fresh;
        tracing::debug!(dir = %self.dir.display(), count, "overrides loaded");
        Ok(())
    }

    /// Sets every override as an extension on `event`.
    pub fn apply(&self, mut event: Event) -> Event {
        self.walked.get_or_init(|| {
            if let Err(err) = self.walk() {
                tracing::warn!(
                    dir = %self.dir.display(),
                    error = %err,
                    "failed to walk override directory"
                );
            }
        });
        let overrides = self.overrides.lock();
        for (key, value) in overrides.iter() {
            if let Err(err) = event.set_extension(key, value.as_str()) {
                tracing::warn!(%key, error = %err, "override not applied");
            }
        }
        event
    }

    /// Follows filesystem changes until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns the watcher error if the directory cannot be watched.
    pub async fn watch(&self, cancel: CancellationToken) -> notify::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |event| {
            let _ = tx.send(event);
        })?;
        watcher.watch(&self.dir, RecursiveMode::Recursive)?;
        tracing::info!(dir = %self.dir.display(), "watching overrides");
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                event = rx.recv() => event,
            };
            match event {
                Some(Ok(event)) => self.on_event(&event),
                Some(Err(err)) => tracing::warn!(error = %err, "override watch error"),
                None => break,
            }
        }
        tracing::debug!(dir = %self.dir.display(), "override watch stopped");
        Ok(())
    }

    fn on_event(&self, event: &notify::Event) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                for path in &event.paths {
                    self.refresh(path);
                }
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }
    }

    /// Re-reads `path`. Anything other than a file may hide nested
    /// overrides, so the whole directory is walked again.
    fn refresh(&self, path: &Path) {
        if !path.is_file() {
            self.resync();
            return;
        }
        if let Some((key, value)) = read_override(path) {
            tracing::debug!(%key, "override set");
            self.overrides.lock().insert(key, value);
        }
    }

    fn resync(&self) {
        if let Err(err) = self.walk() {
            tracing::warn!(dir = %self.dir.display(), error = %err, "override resync failed");
            if !self.dir.exists() {
                self.overrides.lock().clear();
            }
        }
    }
}

/// Reads one override file into its key and trimmed value.
fn read_override(path: &Path) -> Option<(String, String)> {
    let key = path.file_name().and_then(|name| name.to_str())?;
    if !is_valid_extension_key(key) {
        tracing::warn!(file = %path.display(), "ignoring override with invalid extension name");
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => Some((key.to_string(), contents.trim_end().to_string())),
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "failed to read override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SpecVersion;
    use serde_json::Value;

    #[test]
    fn test_first_apply_walks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo"), "bar\n").unwrap();
        let observer = OverrideObserver::new(dir.path());
        assert!(observer.overrides().is_empty());
        let event = observer.apply(Event::new(SpecVersion::V10));
        assert_eq!(event.extension("foo"), Some(&Value::String("bar".into())));
    }

    #[test]
    fn test_invalid_names_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad-name"), "x").unwrap();
        std::fs::write(dir.path().join("Upper"), "x").unwrap();
        std::fs::write(dir.path().join("ok1"), "y").unwrap();
        let observer = OverrideObserver::new(dir.path());
        observer.walk().unwrap();
        let overrides = observer.overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["ok1"], "y");
    }

    #[test]
    fn test_nested_files_use_basename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("region"), "eu").unwrap();
        let observer = OverrideObserver::new(dir.path());
        observer.walk().unwrap();
        assert_eq!(observer.overrides()["region"], "eu");
    }

    #[test]
    fn test_refresh_removes_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("foo");
        std::fs::write(&file, "bar").unwrap();
        let observer = OverrideObserver::new(dir.path());
        observer.walk().unwrap();
        std::fs::remove_file(&file).unwrap();
        observer.refresh(&file);
        assert!(observer.overrides().is_empty());
    }

    #[test]
    fn test_removed_subdirectory_drops_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir_all(sub.join("deeper")).unwrap();
        std::fs::write(sub.join("region"), "eu").unwrap();
        std::fs::write(sub.join("deeper").join("zone"), "a").unwrap();
        std::fs::write(dir.path().join("tenant"), "acme").unwrap();
        let observer = OverrideObserver::new(dir.path());
        observer.walk().unwrap();
        assert_eq!(observer.overrides().len(), 3);

        std::fs::remove_dir_all(&sub).unwrap();
        let removed = notify::Event::new(EventKind::Remove(notify::event::RemoveKind::Folder))
            .add_path(sub);
        observer.on_event(&removed);

        let overrides = observer.overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["tenant"], "acme");
    }

    #[test]
    fn test_removed_directory_clears_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("overrides");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("tenant"), "acme").unwrap();
        let observer = OverrideObserver::new(&root);
        observer.walk().unwrap();

        std::fs::remove_dir_all(&root).unwrap();
        observer.refresh(&root);
        assert!(observer.overrides().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let observer = OverrideObserver::new("/definitely/not/here");
        assert!(observer.walk().is_err());
        let event = observer.apply(Event::new(SpecVersion::V10));
        assert!(event.extensions().is_empty());
    }
}
