pub mod atomic;
pub mod base_storage;
pub mod device_id;
pub mod file_storage;
pub mod memory_storage;
pub mod monoid;

pub use atomic::AtomicStorage;
pub use base_storage::{modify, BaseStorage, Snapshot, MAX_MODIFY_ATTEMPTS};
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

pub const GAMEAID_FOLDER: &str = ".gameaid";

// Single-file substrate, one JSON blob with a generation header
pub const USER_STORAGE_FILE: &str = "users.json";

// Versioned substrate, one file per generation
pub const USER_STORAGE_FOLDER: &str = "users";
