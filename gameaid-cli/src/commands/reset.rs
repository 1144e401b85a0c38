use fs_storage::BaseStorage;

use crate::error::AppError;
use crate::models::storage::Store;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "reset", about = "Delete all user profiles")]
pub struct Reset {
    #[clap(long, action, help = "Also erase the storage substrate")]
    purge: bool,
}

impl Reset {
    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        store.reset()?;
        if self.purge {
            store.storage_mut().erase()?;
            println!("User storage erased");
        } else {
            println!("All users have been reset");
        }
        Ok(())
    }
}
