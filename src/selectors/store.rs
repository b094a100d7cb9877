//! File-backed selector store.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::{SelectorField, SelectorSet};
use crate::error::{Result, ScrapeError};
use crate::storage::{read_json, write_json_atomic, JsonRead};

/// Default selector filename inside the data directory.
pub const SELECTORS_FILENAME: &str = "selectors.json";

/// Selectors held in memory and written through to a JSON file on every change.
///
/// Single writer: nothing guards against another process editing the file.
#[derive(Debug, Clone)]
pub struct SelectorStore {
    path: PathBuf,
    selectors: SelectorSet,
}

impl SelectorStore {
    /// Load selectors from `path`.
    ///
    /// A missing or unreadable file yields unset selectors, which are written
    /// back so the next run finds a valid file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let selectors = match read_json::<SelectorSet>(&path) {
            JsonRead::Found(selectors) => {
                debug!("Loaded selectors from {}", path.display());
                return Self { path, selectors };
            }
            JsonRead::Missing => {
                info!("No selector file at {}, creating one", path.display());
                SelectorSet::default()
            }
            JsonRead::Corrupt(reason) => {
                warn!(
                    "Selector file {} is unreadable ({}), resetting to defaults",
                    path.display(),
                    reason
                );
                SelectorSet::default()
            }
        };

        let store = Self { path, selectors };
        store.persist_logged();
        store
    }

    /// Load from the default filename inside a data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::load(data_dir.join(SELECTORS_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    pub fn get(&self, field: SelectorField) -> Option<&str> {
        self.selectors.get(field)
    }

    /// Get a selector that must be set before scraping can proceed.
    pub fn require(&self, field: SelectorField) -> Result<&str> {
        self.get(field).ok_or(ScrapeError::SelectorUnset(field))
    }

    /// Update one selector and persist the whole set.
    pub fn set(&mut self, field: SelectorField, value: impl Into<String>) {
        let value = value.into();
        info!("Selector {} = {}", field, value);
        self.selectors.set(field, Some(value));
        self.persist_logged();
    }

    /// Write the current selectors to disk.
    pub fn persist(&self) -> io::Result<()> {
        write_json_atomic(&self.path, &self.selectors)
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            error!(
                "Failed to write selectors to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
