mod file;

use std::io::{ErrorKind, Write};
use std::path::Path;

use data_error::{GameaidError, Result};

use crate::base_storage::{modify, BaseStorage, Snapshot};
use crate::device_id;

pub use file::{AtomicFile, ReadOnlyFile, TmpFile, MAX_VERSION_FILES};

/// Substrate backed by an [`AtomicFile`]: every write publishes a new
/// version file, so concurrent writers in other processes are detected.
pub struct AtomicStorage {
    label: String,
    file: AtomicFile,
}

impl AtomicStorage {
    /// Open (or create) the versioned storage folder at `directory`.
    pub fn new(label: String, directory: &Path) -> Result<Self> {
        std::fs::create_dir_all(directory)?;
        let device = device_id::load(directory)?;
        let file = AtomicFile::new(directory, &device)?;
        Ok(Self { label, file })
    }

    pub fn directory(&self) -> &Path {
        &self.file.directory
    }
}

impl BaseStorage for AtomicStorage {
    fn label(&self) -> &str {
        &self.label
    }

    fn load(&self) -> Result<Snapshot> {
        let latest = self.file.load()?;
        Ok(Snapshot {
            version: latest.version as u64,
            // An empty version file is what `erase` leaves behind
            data: latest
                .read_content()?
                .filter(|content| !content.is_empty()),
        })
    }

    fn compare_and_swap(
        &mut self,
        current: &Snapshot,
        blob: &[u8],
    ) -> Result<u64> {
        let version = current.version as usize;
        let current = ReadOnlyFile {
            version,
            path: self.file.path(version),
        };
        let temp = self.file.make_temp()?;
        (&temp).write_all(blob)?;
        (&temp).flush()?;

        match self.file.compare_and_swap(&current, temp) {
            Ok(()) => Ok(version as u64 + 1),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(GameaidError::Conflict(self.label.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Publish an empty version, then drop every older one. The version
    /// keeps counting so that snapshots taken before the erase go stale.
    fn erase(&mut self) -> Result<()> {
        modify(self, |_| Ok((Vec::new(), ())))?;
        let (latest, _) = self.file.latest_version()?;
        let removed = self.file.remove_older_than(latest)?;
        log::info!(
            "{}: erased {} version files, now at version {}",
            self.label,
            removed,
            latest
        );
        Ok(())
    }
}
