use std::fs::{self, File};
use std::io::{Error, ErrorKind, Read, Result};
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Versions older than the latest by this many files are pruned.
pub const MAX_VERSION_FILES: usize = 10;

/// Scratch file removed on drop unless it has been persisted.
pub struct TmpFile {
    file: File,
    path: PathBuf,
}

impl TmpFile {
    pub fn create_in(temp_dir: impl AsRef<Path>) -> Result<Self> {
        let filename: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(10)
            .collect();
        let path = temp_dir.as_ref().join(filename);
        let file = File::create(&path)?;
        Ok(Self { file, path })
    }

    /// Flush to disk and move the file over `dest`.
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<()> {
        self.file.sync_all()?;
        fs::rename(&self.path, dest)
    }
}

impl std::io::Write for &TmpFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (&self.file).write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (&self.file).flush()
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// One version of an [`AtomicFile`]. Version `0` has no file behind it.
#[derive(Clone, Debug)]
pub struct ReadOnlyFile {
    pub version: usize,
    pub path: PathBuf,
}

impl ReadOnlyFile {
    /// `Ok(None)` means no version of the file has been written yet.
    pub fn open(&self) -> Result<Option<File>> {
        if self.version != 0 {
            Ok(Some(File::open(&self.path)?))
        } else {
            Ok(None)
        }
    }

    pub fn read_content(&self) -> Result<Option<Vec<u8>>> {
        match self.open()? {
            None => Ok(None),
            Some(mut file) => {
                let mut buf = vec![];
                file.read_to_end(&mut buf)?;
                Ok(Some(buf))
            }
        }
    }
}

/// A file stored as a series of `<dir>_<device>.<version>` files, where a
/// new version only appears if nobody else created it first.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AtomicFile {
    pub directory: PathBuf,
    pub prefix: String,
}

pub(crate) fn parse_version(filename: Option<&str>) -> Option<usize> {
    let (_, version) = filename?.rsplit_once('.')?;
    version.parse().ok()
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>, device_id: &str) -> Result<Self> {
        let directory = path.into();
        fs::create_dir_all(&directory)?;
        let name = directory
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidInput,
                    "`path` must specify a directory name",
                )
            })?;
        let prefix = format!("{}_{}.", name, device_id);
        Ok(Self { directory, prefix })
    }

    /// The latest version together with every file carrying it. Several
    /// devices syncing one folder can produce the same version at once.
    pub fn latest_version(&self) -> Result<(usize, Vec<ReadOnlyFile>)> {
        let mut latest = 0;
        let mut files = vec![];
        for entry in fs::read_dir(&self.directory)?.flatten() {
            let Some(version) = parse_version(entry.file_name().to_str())
            else {
                continue;
            };
            if version > latest {
                latest = version;
                files.clear();
            }
            if version == latest {
                files.push(ReadOnlyFile {
                    version,
                    path: entry.path(),
                });
            }
        }
        Ok((latest, files))
    }

    pub fn path(&self, version: usize) -> PathBuf {
        self.directory
            .join(format!("{}{version}", self.prefix))
    }

    pub fn load(&self) -> Result<ReadOnlyFile> {
        let (version, mut files) = self.latest_version()?;
        let file = match files.len() {
            0 => ReadOnlyFile {
                version,
                path: self.path(version),
            },
            1 => files.remove(0),
            _ => {
                log::warn!(
                    "There are multiple files with the version {version}"
                );
                files
                    .into_iter()
                    .find(|file| {
                        file.path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .map_or(false, |name| name.starts_with(&self.prefix))
                    })
                    .ok_or_else(|| {
                        Error::new(
                            ErrorKind::NotFound,
                            "File not found with correct version",
                        )
                    })?
            }
        };
        Ok(file)
    }

    pub fn make_temp(&self) -> Result<TmpFile> {
        TmpFile::create_in(&self.directory)
    }

    /// Publish `new` as version `current.version + 1` if `current` is still
    /// the latest version.
    ///
    /// # Errors
    /// `ErrorKind::AlreadyExists` means a newer version appeared and the
    /// write must be redone from it. Other I/O errors are forwarded.
    pub fn compare_and_swap(
        &self,
        current: &ReadOnlyFile,
        new: TmpFile,
    ) -> Result<()> {
        let new_path = self.path(current.version + 1);
        new.file.sync_data()?;
        let (latest_version, _) = self.latest_version()?;
        if latest_version > current.version {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                "the `current` file is not the latest version",
            ));
        }
        // `link(2)` fails with EEXIST if someone published this version
        // between the check above and now.
        if let Err(err) = fs::hard_link(&new.path, new_path) {
            // Per open(2), a link that reports failure may still have
            // succeeded; the link count of the source tells.
            #[cfg(unix)]
            if new.path.metadata()?.nlink() != 2 {
                return Err(err);
            }
            #[cfg(not(unix))]
            return Err(err);
        }

        let pruned = self.prune_old_versions(current.version + 1);
        log::debug!("pruned {} old version files", pruned);
        Ok(())
    }

    /// Remove every version file below `version`, whatever device wrote
    /// it.
    pub fn remove_older_than(&self, version: usize) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.directory)?.flatten() {
            match parse_version(entry.file_name().to_str()) {
                Some(found) if found < version => {
                    fs::remove_file(entry.path())?;
                    removed += 1;
                }
                _ => {}
            }
        }
        Ok(removed)
    }

    fn prune_old_versions(&self, latest: usize) -> usize {
        let mut deleted = 0;
        if let Ok(iterator) = fs::read_dir(&self.directory) {
            for entry in iterator.flatten() {
                if let Some(version) = parse_version(entry.file_name().to_str())
                {
                    if version + MAX_VERSION_FILES <= latest
                        && fs::remove_file(entry.path()).is_ok()
                    {
                        deleted += 1;
                    }
                }
            }
        }
        deleted
    }
}
