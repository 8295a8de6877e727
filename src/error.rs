//! Error types shared by the configuration loader and the store bootstrapper.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    ParseError,
    ImmutabilityViolation,
    ConfigIo,
    InvalidConfig,

    // Store errors
    ConstraintViolation,
    StoreIo,
    DatabaseError,
    MigrationFailed,
}

/// Errors raised while loading configuration or bootstrapping the store.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration document is not YAML, or its root is not a mapping.
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Write attempted on the frozen configuration tree.
    #[error("Configuration is immutable: cannot modify '{key}'")]
    ImmutabilityViolation { key: String },

    /// A configuration file exists but could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The frozen configuration does not fit the requested type.
    #[error("Invalid configuration: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// Primary-key, uniqueness or foreign-key violation reported by the store.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(rusqlite::Error),

    /// The store file or its directory cannot be created or opened.
    #[error("Cannot open store at {}: {source}", .path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other store failure.
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    /// A migration batch failed and was rolled back.
    #[error("Migration failed: {0}")]
    Migration(#[from] refinery::Error),
}

impl Error {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn immutable(key: impl Into<String>) -> Self {
        Self::ImmutabilityViolation { key: key.into() }
    }

    pub fn store_io(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StoreIo {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Parse { .. } => ErrorCode::ParseError,
            Error::ImmutabilityViolation { .. } => ErrorCode::ImmutabilityViolation,
            Error::Io { .. } => ErrorCode::ConfigIo,
            Error::Deserialize(_) => ErrorCode::InvalidConfig,
            Error::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            Error::StoreIo { .. } => ErrorCode::StoreIo,
            Error::Database(_) => ErrorCode::DatabaseError,
            Error::Migration(_) => ErrorCode::MigrationFailed,
        }
    }

    /// True for store-level constraint violations.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(_))
    }
}

/// Check whether a SQLite error is a constraint failure (PK, UNIQUE, FK, ...).
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if is_constraint_violation(&err) {
            Error::ConstraintViolation(err)
        } else {
            Error::Database(err)
        }
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;
