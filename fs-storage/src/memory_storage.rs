use std::sync::{Arc, RwLock};

use data_error::{GameaidError, Result};

use crate::base_storage::{BaseStorage, Snapshot};

/// In-process substrate. Handles created with [`MemoryStorage::handle`]
/// share one slot, the way two tabs share one browser profile.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    label: String,
    slot: Arc<RwLock<Snapshot>>,
    /// Largest blob accepted by a write, if any.
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            slot: Arc::new(RwLock::new(Snapshot::empty())),
            quota: None,
        }
    }

    /// Reject writes of blobs larger than `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Another writer onto the same slot.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    /// Overwrite the slot without a version check, as data written by
    /// some other program would appear.
    pub fn put_raw(&self, blob: &[u8]) -> Result<u64> {
        let mut slot = self.slot.write().map_err(|_| self.poisoned())?;
        slot.version += 1;
        slot.data = Some(blob.to_vec());
        Ok(slot.version)
    }

    fn poisoned(&self) -> GameaidError {
        GameaidError::Storage(self.label.clone(), "Slot lock poisoned".to_owned())
    }
}

impl BaseStorage for MemoryStorage {
    fn label(&self) -> &str {
        &self.label
    }

    fn load(&self) -> Result<Snapshot> {
        let slot = self.slot.read().map_err(|_| self.poisoned())?;
        Ok(slot.clone())
    }

    fn compare_and_swap(
        &mut self,
        current: &Snapshot,
        blob: &[u8],
    ) -> Result<u64> {
        if let Some(quota) = self.quota {
            if blob.len() > quota {
                return Err(GameaidError::Storage(
                    self.label.clone(),
                    format!("Quota of {} bytes exceeded", quota),
                ));
            }
        }

        let mut slot = self.slot.write().map_err(|_| self.poisoned())?;
        if slot.version != current.version {
            return Err(GameaidError::Conflict(self.label.clone()));
        }
        slot.version += 1;
        slot.data = Some(blob.to_vec());
        Ok(slot.version)
    }

    fn erase(&mut self) -> Result<()> {
        let mut slot = self.slot.write().map_err(|_| self.poisoned())?;
        // Keep counting so that snapshots taken before the erase go stale.
        slot.version += 1;
        slot.data = None;
        Ok(())
    }
}
