//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contracts consumed by services: entity stores,
//!   the friendship edge store and the like store.
//! - Provide two interchangeable backends: in-memory maps and SQLite tables.
//!
//! # Invariants
//! - Repositories assume validated input; validation lives in services.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Every mutating call is atomic with respect to other calls on the same
//!   store instance.

use crate::db::migrations::{current_user_version, latest_version, REQUIRED_TABLES};
use crate::db::DbError;
use crate::model::{Entity, EntityKind};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod film_repo;
pub mod friendship_repo;
pub mod like_repo;
pub mod memory;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        kind: EntityKind,
        id: i64,
    },
    /// Persisted data cannot be converted to a valid domain value.
    InvalidData(String),
    /// In-memory store lock was poisoned by a panicking writer.
    LockPoisoned(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::LockPoisoned(store) => write!(f, "{store} lock is poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::FromSqlConversionFailure(column, _, err) => {
                Self::InvalidData(format!("column {column}: {err}"))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Generic key-value store for one entity type.
///
/// Implemented by `InMemoryEntityRepository<T>` for both entity types and by
/// `SqliteUserRepository` / `SqliteFilmRepository` for the durable backend.
pub trait EntityRepository<T: Entity>: Send + Sync {
    /// Mints a fresh handle, persists the entity and returns the stored value.
    fn add(&self, entity: &T) -> RepoResult<T>;
    /// Returns `Ok(None)` for unknown handles.
    fn get_by_id(&self, id: i64) -> RepoResult<Option<T>>;
    /// Replaces the entity keyed by its handle; `NotFound` when unknown.
    fn update(&self, entity: &T) -> RepoResult<T>;
    /// Returns every stored entity in ascending handle order.
    fn get_all(&self) -> RepoResult<Vec<T>>;
}

/// Verifies that a connection went through `open_db` before use.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn not_found<T: Entity>(id: i64) -> RepoError {
    RepoError::NotFound {
        kind: T::KIND,
        id,
    }
}
