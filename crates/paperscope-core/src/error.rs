use thiserror::Error;

/// All errors that can occur in paperscope-core.
#[derive(Debug, Error)]
pub enum PaperscopeError {
    #[error("Unknown entity kind: {0}")]
    UnknownEntity(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Process exit codes used by the `paperscope` binary.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArgs = 3,
    StorageError = 4,
    NetworkError = 6,
}

pub type Result<T> = std::result::Result<T, PaperscopeError>;
