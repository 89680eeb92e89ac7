use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, types::Track, warning};

/// One reviewed track, keyed by the track and the album it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub track_id: String,
    pub album_id: String,
}

impl From<&Track> for LedgerEntry {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.id.clone(),
            album_id: track.album_id.clone(),
        }
    }
}

/// Persisted set of tracks that were already put up for review.
///
/// Stored as a CSV file with the columns `track_id,album_id`. Entries are
/// only ever appended; adding a pair that is already present is a no-op, so
/// the file never holds duplicates once written back.
pub struct ReviewLedger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
    seen: HashSet<LedgerEntry>,
    track_ids: HashSet<String>,
    album_ids: HashSet<String>,
}

impl ReviewLedger {
    /// Empty ledger that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            seen: HashSet::new(),
            track_ids: HashSet::new(),
            album_ids: HashSet::new(),
        }
    }

    /// Reads the ledger at `path`.
    ///
    /// A missing file yields an empty ledger that will be created on the first
    /// [`ReviewLedger::persist`]. Duplicate rows in the file are collapsed.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut ledger = Self::new(path);
        let content = match async_fs::read(&ledger.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warning!(
                    "No ledger found at {}, starting with an empty one.",
                    ledger.path.display()
                );
                return Ok(ledger);
            }
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::Reader::from_reader(content.as_slice());
        for row in reader.deserialize::<LedgerEntry>() {
            ledger.insert(row?);
        }
        tracing::debug!(path = %ledger.path.display(), entries = ledger.len(), "ledger loaded");
        Ok(ledger)
    }

    /// Writes the whole ledger back to its file, header included.
    ///
    /// The content goes to a sibling `.tmp` file first, which is then renamed
    /// over the ledger, so an interrupted write leaves the previous ledger in
    /// place.
    pub async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.entries.is_empty() {
            writer.write_record(["track_id", "album_id"])?;
        }
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let tmp_path = self.tmp_path();
        async_fs::write(&tmp_path, bytes).await?;
        async_fs::rename(&tmp_path, &self.path).await?;
        tracing::debug!(path = %self.path.display(), entries = self.len(), "ledger persisted");
        Ok(())
    }

    /// Adds an entry; returns `false` when the pair was already recorded.
    pub fn insert(&mut self, entry: LedgerEntry) -> bool {
        if !self.seen.insert(entry.clone()) {
            return false;
        }
        self.track_ids.insert(entry.track_id.clone());
        self.album_ids.insert(entry.album_id.clone());
        self.entries.push(entry);
        true
    }

    /// Adds every entry, returning how many were new.
    pub fn extend<I: IntoIterator<Item = LedgerEntry>>(&mut self, entries: I) -> usize {
        entries
            .into_iter()
            .map(|e| self.insert(e))
            .filter(|added| *added)
            .count()
    }

    /// Whether the track was recorded on any album.
    pub fn contains_track(&self, track_id: &str) -> bool {
        self.track_ids.contains(track_id)
    }

    /// Whether any track of the album was recorded.
    pub fn contains_album(&self, album_id: &str) -> bool {
        self.album_ids.contains(album_id)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File the ledger is loaded from and persisted to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staging file next to the ledger, e.g. `reviewed_tracks.csv.tmp`.
    pub fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
