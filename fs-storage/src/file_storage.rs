use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::atomic::TmpFile;
use crate::base_storage::{BaseStorage, Snapshot};
use data_error::{GameaidError, Result};

/*
Note on `FileStorage` layout:

The file starts with a `generation: N` header line followed by the blob.
The generation is bumped on every write and serves as the snapshot version.

A file without the header (for example a raw JSON export of the browser
storage slot) is read as generation 0, and the first write adds the header.
An erased storage is a header-only file.
*/
const GENERATION_PREFIX: &str = "generation: ";

/// Single-file substrate.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never sees a half-written blob. The generation check and the
/// rename are two steps: concurrent writers in other processes are
/// detected in most cases but not excluded. Use
/// [`AtomicStorage`](crate::AtomicStorage) when that matters.
pub struct FileStorage {
    label: String,
    path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with a diagnostic label and file path
    pub fn new(label: String, path: &Path) -> Self {
        Self {
            label,
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `generation` and `blob` to a temporary file and rename it
    /// over the storage file.
    fn publish(&self, generation: u64, blob: &[u8]) -> Result<()> {
        let parent_dir = self.path.parent().ok_or_else(|| {
            GameaidError::Storage(
                self.label.clone(),
                "Failed to get parent directory".to_owned(),
            )
        })?;
        fs::create_dir_all(parent_dir)?;

        let temp = TmpFile::create_in(parent_dir)?;
        (&temp).write_all(
            format!("{}{}\n", GENERATION_PREFIX, generation).as_bytes(),
        )?;
        (&temp).write_all(blob)?;
        (&temp).flush()?;
        temp.persist(&self.path)?;
        Ok(())
    }

    fn parse(&self, content: Vec<u8>) -> Result<Snapshot> {
        if !content.starts_with(GENERATION_PREFIX.as_bytes()) {
            log::info!(
                "{}: no generation header in {}, reading as generation 0",
                self.label,
                self.path.display()
            );
            let data = if content.is_empty() { None } else { Some(content) };
            return Ok(Snapshot { version: 0, data });
        }

        let header_end = content
            .iter()
            .position(|byte| *byte == b'\n')
            .unwrap_or(content.len());
        let version = std::str::from_utf8(
            &content[GENERATION_PREFIX.len()..header_end],
        )
        .ok()
        .and_then(|header| header.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            GameaidError::Storage(
                self.label.clone(),
                "Malformed generation header".to_owned(),
            )
        })?;

        let body = content
            .get(header_end + 1..)
            .unwrap_or_default();
        let data = if body.is_empty() {
            None
        } else {
            Some(body.to_vec())
        };
        Ok(Snapshot { version, data })
    }
}

impl BaseStorage for FileStorage {
    fn label(&self) -> &str {
        &self.label
    }

    /// Read the blob from the storage file
    fn load(&self) -> Result<Snapshot> {
        match fs::read(&self.path) {
            Ok(content) => self.parse(content),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Ok(Snapshot::empty())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write the blob to the storage file if nobody wrote since `current`
    fn compare_and_swap(
        &mut self,
        current: &Snapshot,
        blob: &[u8],
    ) -> Result<u64> {
        let latest = self.load()?;
        if latest.version != current.version {
            return Err(GameaidError::Conflict(self.label.clone()));
        }

        let generation = current.version + 1;
        self.publish(generation, blob)?;

        log::info!(
            "{}: generation {} has been written ({} bytes)",
            self.label,
            generation,
            blob.len()
        );
        Ok(generation)
    }

    /// Drop the blob but keep a header-only file, so that the generation
    /// keeps counting and snapshots taken before the erase go stale.
    fn erase(&mut self) -> Result<()> {
        let latest = match self.load() {
            Ok(latest) => latest,
            Err(err) => {
                log::warn!(
                    "{}: removing unreadable {}: {}",
                    self.label,
                    self.path.display(),
                    err
                );
                return fs::remove_file(&self.path).map_err(|err| {
                    GameaidError::Storage(self.label.clone(), err.to_string())
                });
            }
        };
        if latest == Snapshot::empty() {
            return Ok(());
        }

        let generation = latest.version + 1;
        self.publish(generation, &[])?;
        log::info!("{}: erased at generation {}", self.label, generation);
        Ok(())
    }
}
