use clap::Parser;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::AppError;

mod cli;
mod commands;
mod config;
mod error;
mod models;
mod util;

fn main() {
    env_logger::init();

    let args = Cli::parse();

    if let Err(err) = run(args) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), AppError> {
    let config = AppConfig::load()?.with_overrides(args.store, args.backend);
    log::debug!("Using configuration {:?}", config);

    args.command.run(&config)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::models::storage::{open_store, StorageType};
    use data_error::GameaidError;
    use rstest::rstest;
    use tempdir::TempDir;

    fn gameaid(
        store: &Path,
        backend: &str,
        args: &[&str],
    ) -> Result<(), AppError> {
        let store = store.to_str().unwrap();
        let argv = ["gameaid-cli", "--store", store, "--backend", backend]
            .into_iter()
            .chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        let config =
            AppConfig::default().with_overrides(cli.store, cli.backend);
        cli.command.run(&config)
    }

    #[rstest]
    #[case::file("file", StorageType::File)]
    #[case::atomic("atomic", StorageType::Atomic)]
    fn profile_lifecycle(
        #[case] backend: &str,
        #[case] storage_type: StorageType,
    ) {
        let dir = TempDir::new("gameaid-cli").unwrap();
        let path = storage_type.default_path(dir.path());
        let run = |args: &[&str]| gameaid(&path, backend, args).unwrap();

        run(&["login", "a@x.com", "--username", "Neo"]);
        run(&["login", "a@x.com", "--game-id", "G1"]);
        run(&["search", "a@x.com", "Alice"]);
        run(&["link", "a@x.com", "discord", "facebook=false"]);
        run(&["update", "a@x.com", "--weapon", "M416", "--weapon", "AKM"]);

        let record = open_store(&path, storage_type)
            .unwrap()
            .get_record("a@x.com")
            .unwrap();
        assert_eq!(record.username, "Neo");
        assert_eq!(record.game_id.as_deref(), Some("G1"));
        assert_eq!(record.login_count, 2);
        assert_eq!(record.recent_searches, vec!["Alice"]);
        assert_eq!(record.linked_accounts.get("discord"), Some(&true));
        assert_eq!(record.linked_accounts.get("facebook"), Some(&false));
        assert_eq!(record.favorite_weapons, vec!["M416", "AKM"]);

        run(&["reset"]);
        assert!(open_store(&path, storage_type).unwrap().is_empty());
    }

    #[test]
    fn unknown_user_is_reported() {
        let dir = TempDir::new("gameaid-cli").unwrap();
        let path = dir.path().join("users.json");

        let result =
            gameaid(&path, "file", &["update", "nobody@x.com", "-g", "X"]);
        assert!(matches!(
            result,
            Err(AppError::UserNotFound(email)) if email == "nobody@x.com"
        ));

        let result = gameaid(&path, "file", &["update", "nobody@x.com"]);
        assert!(matches!(result, Err(AppError::EmptyUpdate)));
    }

    #[test]
    fn stale_revision_is_refused() {
        let dir = TempDir::new("gameaid-cli").unwrap();
        let path = dir.path().join("users.json");
        gameaid(&path, "file", &["login", "a@x.com"]).unwrap();
        gameaid(&path, "file", &["search", "a@x.com", "Alice"]).unwrap();

        let result = gameaid(
            &path,
            "file",
            &["update", "a@x.com", "--username", "Neo", "--revision", "1"],
        );

        assert!(matches!(
            result,
            Err(AppError::GameaidError(GameaidError::RevisionMismatch {
                expected: 1,
                found: 2
            }))
        ));
    }
}
