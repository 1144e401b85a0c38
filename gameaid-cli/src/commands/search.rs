use crate::error::AppError;
use crate::models::storage::Store;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "search", about = "Remember a player search of a user")]
pub struct Search {
    #[clap(help = "Email of the user")]
    email: String,
    #[clap(help = "Searched player name")]
    player: String,
}

impl Search {
    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        let record = store.record_search(&self.email, &self.player)?;

        for (index, search) in record.recent_searches.iter().enumerate() {
            println!("{:>2}. {}", index + 1, search);
        }
        Ok(())
    }
}
