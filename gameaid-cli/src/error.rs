use std::io;

use data_error::GameaidError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not open user store: {0}")]
    StorageCreationError(String),

    #[error("No user registered with email {0}")]
    UserNotFound(String),

    #[error("Nothing to update, pass at least one field")]
    EmptyUpdate,

    #[error("Unsupported {expected} file: {path}")]
    UnsupportedMedia { expected: String, path: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] anyhow::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),

    #[error(transparent)]
    GameaidError(GameaidError),
}

impl From<GameaidError> for AppError {
    fn from(err: GameaidError) -> Self {
        match err {
            GameaidError::NotFound(email) => AppError::UserNotFound(email),
            other => AppError::GameaidError(other),
        }
    }
}
