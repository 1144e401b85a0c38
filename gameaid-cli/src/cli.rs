use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;
use crate::models::storage::StorageType;

#[derive(Parser, Debug)]
#[clap(name = "gameaid-cli")]
#[clap(about = "Manage GameAid user profiles", long_about = None)]
pub struct Cli {
    #[clap(
        long,
        global = true,
        value_parser,
        help = "Path of the user store (file or folder, depending on the backend)"
    )]
    pub store: Option<PathBuf>,
    #[clap(long, global = true, value_enum, help = "Storage backend")]
    pub backend: Option<StorageType>,
    #[clap(subcommand)]
    pub command: Commands,
}
