use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use data_user::UserStore;
use fs_storage::{AtomicStorage, BaseStorage, FileStorage};

use crate::error::AppError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// One JSON file rewritten on every change
    #[default]
    File,
    /// A folder of versioned files, safe for concurrent writers
    Atomic,
}

impl StorageType {
    /// Default store location below the `.gameaid` folder.
    pub fn default_path(&self, root: &Path) -> PathBuf {
        match self {
            StorageType::File => root.join(fs_storage::USER_STORAGE_FILE),
            StorageType::Atomic => root.join(fs_storage::USER_STORAGE_FOLDER),
        }
    }
}

pub type Store = UserStore<Box<dyn BaseStorage>>;

pub fn open_store(
    path: &Path,
    storage_type: StorageType,
) -> Result<Store, AppError> {
    let label = "users".to_owned();
    let storage: Box<dyn BaseStorage> = match storage_type {
        StorageType::File => Box::new(FileStorage::new(label, path)),
        StorageType::Atomic => {
            Box::new(AtomicStorage::new(label, path).map_err(|e| {
                AppError::StorageCreationError(format!(
                    "{}: {}",
                    path.display(),
                    e
                ))
            })?)
        }
    };
    log::debug!(
        "Opened {:?} user store at {}",
        storage_type,
        path.display()
    );
    Ok(UserStore::new(storage))
}
