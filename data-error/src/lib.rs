use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameaidError>;

#[derive(Error, Debug)]
pub enum GameaidError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error: {0}")]
    Parse(String),
    #[error("Storage error: {0} {1}")]
    Storage(String, String),
    #[error("No record for {0}")]
    NotFound(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// The substrate moved past the snapshot a write was computed from.
    #[error("Storage {0} was modified concurrently")]
    Conflict(String),
    #[error("Record revision mismatch: expected {expected}, found {found}")]
    RevisionMismatch { expected: u64, found: u64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GameaidError {
    /// Whether the failed operation can be retried on fresher data.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<serde_json::Error> for GameaidError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_parse_errors() {
        let err: GameaidError = serde_json::from_str::<u32>("nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, GameaidError::Parse(_)));
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(GameaidError::Conflict("users".to_owned()).is_conflict());
        assert!(!GameaidError::NotFound("a@x.com".to_owned()).is_conflict());
        assert!(!GameaidError::RevisionMismatch {
            expected: 1,
            found: 2
        }
        .is_conflict());
    }
}
