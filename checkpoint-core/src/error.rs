use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Failure kinds surfaced by the store and the service.
///
/// Every variant leaves the database exactly as it was before the failing
/// operation started.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint '{0}' not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Checkpoint name must be unique: {0}")]
    UniquenessConflict(String),

    #[error("Database error: {0}")]
    Backend(rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid stored timestamp: {0}")]
    Timestamp(String),

    #[error("Failed to render checkpoint: {0}")]
    Render(#[from] serde_yaml::Error),
}

impl CheckpointError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Process exit status for this failure kind. 1 is left to the CLI for
    /// usage and input errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound(_) => 3,
            Self::UniquenessConflict(_) => 4,
            Self::Backend(_) | Self::Io(_) | Self::Timestamp(_) | Self::Render(_) => 5,
        }
    }
}

impl From<rusqlite::Error> for CheckpointError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::UniquenessConflict(
                    message.clone().unwrap_or_else(|| code.to_string()),
                )
            }
            other => Self::Backend(other),
        }
    }
}
