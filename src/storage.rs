//! Storage helpers for scraped replies on disk.
//!
//! Layout under the data directory:
//! `{data_dir}/{username}/{post_id}/raw.json` for scraped replies and
//! `{data_dir}/{username}/{post_id}/proposals.json` for extraction results.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{PostKey, ProposalResult, ScrapeResult};

const RAW_FILENAME: &str = "raw.json";
const PROPOSALS_FILENAME: &str = "proposals.json";

/// Serialize `value` as pretty JSON and move it into place with a rename,
/// so readers never observe a half-written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Outcome of reading a JSON file that may legitimately be absent.
#[derive(Debug)]
pub enum JsonRead<T> {
    Found(T),
    Missing,
    Corrupt(String),
}

/// Read and parse a JSON file, distinguishing absent from unreadable.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> JsonRead<T> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return JsonRead::Missing,
        Err(e) => return JsonRead::Corrupt(e.to_string()),
    };
    match serde_json::from_str(&contents) {
        Ok(value) => JsonRead::Found(value),
        Err(e) => JsonRead::Corrupt(e.to_string()),
    }
}

/// File-backed cache of scrape results, one directory per post.
#[derive(Debug, Clone)]
pub struct ReplyCache {
    root: PathBuf,
}

impl ReplyCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything stored for one post.
    pub fn post_dir(&self, key: &PostKey) -> PathBuf {
        self.root.join(&key.username).join(&key.post_id)
    }

    pub fn raw_path(&self, key: &PostKey) -> PathBuf {
        self.post_dir(key).join(RAW_FILENAME)
    }

    pub fn proposals_path(&self, key: &PostKey) -> PathBuf {
        self.post_dir(key).join(PROPOSALS_FILENAME)
    }

    /// Load cached replies for a post. Missing or unreadable files are a miss.
    pub fn load(&self, key: &PostKey) -> Option<ScrapeResult> {
        let path = self.raw_path(key);
        match read_json::<ScrapeResult>(&path) {
            JsonRead::Found(result) => {
                info!("Loaded {} cached replies for {}", result.len(), key);
                Some(result)
            }
            JsonRead::Missing => {
                debug!("No cached replies at {}", path.display());
                None
            }
            JsonRead::Corrupt(reason) => {
                warn!(
                    "Ignoring unreadable cache {} for {}: {}",
                    path.display(),
                    key,
                    reason
                );
                None
            }
        }
    }

    /// Persist replies for a post. Returns whether the write succeeded;
    /// failures are logged and never abort the caller.
    pub fn save(&self, key: &PostKey, result: &ScrapeResult) -> bool {
        let path = self.raw_path(key);
        match write_json_atomic(&path, result) {
            Ok(()) => {
                info!("Saved {} replies to {}", result.len(), path.display());
                true
            }
            Err(e) => {
                warn!("Failed to save replies for {} to {}: {}", key, path.display(), e);
                false
            }
        }
    }

    /// Persist extracted proposals next to the raw replies.
    pub fn save_proposals(&self, key: &PostKey, proposals: &ProposalResult) -> bool {
        let path = self.proposals_path(key);
        match write_json_atomic(&path, proposals) {
            Ok(()) => {
                info!("Saved {} proposals to {}", proposals.len(), path.display());
                true
            }
            Err(e) => {
                warn!(
                    "Failed to save proposals for {} to {}: {}",
                    key,
                    path.display(),
                    e
                );
                false
            }
        }
    }
}
