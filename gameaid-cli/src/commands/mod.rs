use clap::Subcommand;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::storage::{open_store, Store};

mod attach;
mod link;
mod list;
mod login;
mod reset;
mod search;
mod show;
mod update;

#[derive(Debug, Subcommand)]
pub enum Commands {
    Login(login::Login),
    Show(show::Show),
    List(list::List),
    Update(update::Update),
    Search(search::Search),
    Link(link::Link),
    AttachPhoto(attach::AttachPhoto),
    AttachVoice(attach::AttachVoice),
    Reset(reset::Reset),
}

impl Commands {
    pub fn run(&self, config: &AppConfig) -> Result<(), AppError> {
        let mut store = provide_store(config)?;
        match self {
            Commands::Login(login) => login.run(&mut store),
            Commands::Show(show) => show.run(&store),
            Commands::List(list) => list.run(&store),
            Commands::Update(update) => update.run(&mut store),
            Commands::Search(search) => search.run(&mut store),
            Commands::Link(link) => link.run(&mut store),
            Commands::AttachPhoto(attach) => attach.run(&mut store),
            Commands::AttachVoice(attach) => attach.run(&mut store),
            Commands::Reset(reset) => reset.run(&mut store),
        }
    }
}

fn provide_store(config: &AppConfig) -> Result<Store, AppError> {
    let path = config.store_path()?;
    open_store(&path, config.backend())
}
