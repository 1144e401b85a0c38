use data_user::LinkedAccounts;

use crate::error::AppError;
use crate::models::storage::Store;
use crate::models::LinkedAccount;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "link", about = "Link or unlink external accounts")]
pub struct Link {
    #[clap(help = "Email of the user")]
    email: String,
    #[clap(
        required = true,
        help = "Accounts as provider[=true|false], e.g. discord facebook=false"
    )]
    accounts: Vec<LinkedAccount>,
}

impl Link {
    pub fn run(&self, store: &mut Store) -> Result<(), AppError> {
        let accounts: LinkedAccounts = self
            .accounts
            .iter()
            .map(|account| (account.provider.clone(), account.linked))
            .collect();
        let record = store.update_linked_accounts(&self.email, accounts)?;

        for (provider, linked) in &record.linked_accounts {
            let state = if *linked { "linked" } else { "not linked" };
            println!("{}: {}", provider, state);
        }
        Ok(())
    }
}
