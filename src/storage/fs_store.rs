use crate::consensus::snapshot::{BeaconSnapshot, SnapshotFile};
use crate::consensus::types::Slot;
use crate::storage::traits::SnapshotStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const FILE_PREFIX: &str = "slot-";
const FILE_SUFFIX: &str = ".json";

/// Decoded snapshots kept in memory by default.
pub const DEFAULT_DECODED_CAPACITY: usize = 64;

/// Snapshots kept as one JSON file per slot (`slot-<n>.json`) in a directory.
///
/// The slot index is built when the store is opened. Up to `decoded_capacity` decoded
/// snapshots are memoised; the lowest slot is evicted first.
pub struct FsSnapshotStore {
    dir: PathBuf,
    index: RwLock<BTreeMap<Slot, PathBuf>>,
    decoded: RwLock<BTreeMap<Slot, Arc<BeaconSnapshot>>>,
    decoded_capacity: usize,
}

impl FsSnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating snapshot dir {}", dir.display()))?;

        let mut index = BTreeMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().into_string().unwrap_or_default();
            if let Some(slot) = Self::slot_of_file(&name) {
                index.insert(slot, entry.path());
            }
        }
        debug!(dir = %dir.display(), snapshots = index.len(), "opened snapshot dir");

        Ok(Self {
            dir,
            index: RwLock::new(index),
            decoded: RwLock::new(BTreeMap::new()),
            decoded_capacity: DEFAULT_DECODED_CAPACITY,
        })
    }

    /// Change how many decoded snapshots are kept. Zero disables the memo.
    pub fn with_decoded_capacity(mut self, capacity: usize) -> Self {
        self.decoded_capacity = capacity;
        self
    }

    pub fn decoded_len(&self) -> usize {
        self.decoded.read().len()
    }

    fn remember(&self, slot: Slot, state: Arc<BeaconSnapshot>) {
        if self.decoded_capacity == 0 {
            return;
        }
        let mut decoded = self.decoded.write();
        decoded.insert(slot, state);
        while decoded.len() > self.decoded_capacity {
            decoded.pop_first();
        }
    }

    fn slot_of_file(name: &str) -> Option<Slot> {
        name.strip_prefix(FILE_PREFIX)?
            .strip_suffix(FILE_SUFFIX)?
            .parse()
            .ok()
    }

    fn file_path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}{}{}", FILE_PREFIX, slot, FILE_SUFFIX))
    }

    async fn load(&self, slot: Slot, path: &Path) -> Result<Arc<BeaconSnapshot>> {
        let cached = self.decoded.read().get(&slot).cloned();
        if let Some(state) = cached {
            return Ok(state);
        }
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let file: SnapshotFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("decoding snapshot {}", path.display()))?;
        if file.slot != slot {
            anyhow::bail!(
                "snapshot file {} holds slot {}, expected {}",
                path.display(),
                file.slot,
                slot
            );
        }
        let state = Arc::new(BeaconSnapshot::from(file));
        self.remember(slot, state.clone());
        Ok(state)
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    fn name(&self) -> String {
        "fs".into()
    }

    async fn put(&self, snapshot: BeaconSnapshot) -> Result<()> {
        let slot = snapshot.slot();
        let path = self.file_path(slot);
        let bytes = serde_json::to_vec(&snapshot.to_file())?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        self.index.write().insert(slot, path);
        self.remember(slot, Arc::new(snapshot));
        Ok(())
    }

    async fn state_by_slot(&self, slot: Slot) -> Result<Option<Arc<BeaconSnapshot>>> {
        let path = self.index.read().get(&slot).cloned();
        match path {
            Some(path) => self.load(slot, &path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn latest_state_in(&self, start: Slot, end: Slot) -> Result<Option<Arc<BeaconSnapshot>>> {
        if start > end {
            return Ok(None);
        }
        let latest = self
            .index
            .read()
            .range(start..=end)
            .next_back()
            .map(|(s, p)| (*s, p.clone()));
        match latest {
            Some((slot, path)) => self.load(slot, &path).await.map(Some),
            None => Ok(None),
        }
    }

    async fn delete(&self, slot: Slot) -> Result<()> {
        let path = self.index.write().remove(&slot);
        self.decoded.write().remove(&slot);
        if let Some(path) = path {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn slots(&self) -> Result<Vec<Slot>> {
        Ok(self.index.read().keys().copied().collect())
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.dir.clone())
    }
}
