//! SQLite storage bootstrap, schema migrations and connection sharing.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the durable backend.
//! - Apply schema migrations in deterministic order.
//! - Hand one connection to several repositories behind a mutex.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write catalog data before migrations succeed.
//! - Every statement issued through `SharedConnection` runs under its lock.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A thread panicked while holding the shared connection.
    ConnectionPoisoned,
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::ConnectionPoisoned => write!(f, "shared sqlite connection is poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::ConnectionPoisoned => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Migrated connection shared by all SQLite-backed stores of one catalog.
///
/// Cloning is cheap and yields a handle to the same connection.
#[derive(Clone)]
pub struct SharedConnection {
    inner: Arc<Mutex<Connection>>,
}

impl SharedConnection {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conn)),
        }
    }

    /// Acquires exclusive access for one statement or transaction.
    pub fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.inner.lock().map_err(|_| DbError::ConnectionPoisoned)
    }
}

impl std::fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedConnection")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
