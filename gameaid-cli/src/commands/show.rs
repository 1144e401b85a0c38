use crate::error::AppError;
use crate::models::storage::Store;
use crate::util::format_record;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "show", about = "Print the profile of a user")]
pub struct Show {
    #[clap(help = "Email of the user")]
    email: String,
}

impl Show {
    pub fn run(&self, store: &Store) -> Result<(), AppError> {
        let record = store
            .get_record(&self.email)
            .ok_or_else(|| AppError::UserNotFound(self.email.clone()))?;

        println!("{}", format_record(&record)?);
        Ok(())
    }
}
