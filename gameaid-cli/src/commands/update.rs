use data_user::UserPatch;

use crate::error::AppError;
use crate::models::storage::Store;
use crate::util::format_record;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "update", about = "Change profile fields of a user")]
pub struct Update {
    #[clap(help = "Email of the user")]
    email: String,
    #[clap(long, short, help = "Display name")]
    username: Option<String>,
    #[clap(long, short, help = "In-game player id")]
    game_id: Option<String>,
    #[clap(long, help = "Stats provider API key")]
    api_key: Option<String>,
    #[clap(long = "weapon", help = "Favorite weapons (replaces the list)")]
    favorite_weapons: Option<Vec<String>>,
    #[clap(long = "map", help = "Favorite maps (replaces the list)")]
    favorite_maps: Option<Vec<String>>,
    #[clap(
        long,
        help = "Fail if the profile changed since this revision was shown"
    )]
    revision: Option<u64>,
}

impl Update {
    fn patch(&self) -> UserPatch {
        UserPatch {
            username: self.username.clone(),
            game_id: self.game_id.clone(),
            api_key: self.api_key.clone(),
            favorite_weapons: self.favorite_weapons.clone(),
            favorite_maps: self.favorite_maps.clone(),
            ..Default::default()
        }
    }

    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        let patch = self.patch();
        if patch.is_empty() {
            return Err(AppError::EmptyUpdate);
        }

        let record = match self.revision {
            Some(revision) => {
                store.update_fields_checked(&self.email, revision, patch)?
            }
            None => store.update_fields(&self.email, patch)?,
        };

        println!("{}", format_record(&record)?);
        Ok(())
    }
}
