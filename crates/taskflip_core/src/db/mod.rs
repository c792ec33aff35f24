//! Durable backing for `SqliteKeyValueStore`.
//!
//! # Responsibility
//! - Hand out connections whose `kv_entries` table is ready for upserts.
//! - Report connection and schema failures as one typed `DbError`.
//!
//! # Invariants
//! - The `kv_entries` layout is versioned through `PRAGMA user_version`.
//! - A file written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure opening or upgrading the key-value database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused a statement or could not open the file.
    Sqlite(rusqlite::Error),
    /// The file's `kv_entries` layout is newer than this build understands.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "key-value database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "kv_entries schema v{db_version} was written by a newer build; this build reads up to v{latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
