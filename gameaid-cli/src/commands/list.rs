use crate::error::AppError;
use crate::models::storage::Store;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "list", about = "List registered users")]
pub struct List {
    #[clap(long, short, action, help = "Show login counts and display names")]
    verbose: bool,
}

impl List {
    pub fn run(&self, store: &Store) -> Result<(), AppError> {
        let records = store.load_records()?;
        if records.is_empty() {
            println!("No users registered");
            return Ok(());
        }

        for (email, record) in records {
            if self.verbose {
                println!(
                    "{}\t{}\t{} logins",
                    email, record.username, record.login_count
                );
            } else {
                println!("{}", email);
            }
        }
        Ok(())
    }
}
