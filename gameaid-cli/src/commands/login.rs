use data_user::UserPatch;

use crate::error::AppError;
use crate::models::storage::Store;
use crate::util::format_record;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "login", about = "Register a user or record another login")]
pub struct Login {
    #[clap(help = "Email of the user")]
    email: String,
    #[clap(long, short, help = "Display name")]
    username: Option<String>,
    #[clap(long, short, help = "In-game player id")]
    game_id: Option<String>,
}

impl Login {
    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        let patch = UserPatch {
            username: self.username.clone(),
            game_id: self.game_id.clone(),
            ..UserPatch::for_email(&self.email)
        };
        let record = store.upsert_on_login(patch)?;

        println!("{}", format_record(&record)?);
        Ok(())
    }
}
