//! Film like store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-film sets of user handles.
//! - Provide per-film and catalog-wide like counts for ranking.
//!
//! # Invariants
//! - A user appears at most once in a film's like set.
//! - Films without likes are absent from `like_counts` (count 0).

use crate::db::SharedConnection;
use crate::model::film::FilmId;
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::params;
use std::collections::{BTreeMap, BTreeSet};

/// Storage for film like sets.
pub trait LikeStore: Send + Sync {
    /// Adds `user_id` to the film's like set. Returns `false` when already present.
    fn add_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool>;
    /// Removes `user_id` from the film's like set. Returns `false` when absent.
    fn remove_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool>;
    /// Users who like the film, ascending.
    fn likes_of(&self, film_id: FilmId) -> RepoResult<BTreeSet<UserId>>;
    fn like_count(&self, film_id: FilmId) -> RepoResult<usize>;
    /// Like counts of every film with at least one like.
    fn like_counts(&self) -> RepoResult<BTreeMap<FilmId, usize>>;
}

/// SQLite-backed like store over the `film_likes` table.
pub struct SqliteLikeStore {
    conn: SharedConnection,
}

impl SqliteLikeStore {
    /// Creates the store from a migrated connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        {
            let guard = conn.lock()?;
            ensure_connection_ready(&guard)?;
        }
        Ok(Self { conn })
    }
}

impl LikeStore for SqliteLikeStore {
    fn add_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        let conn = self.conn.lock()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO film_likes (film_id, user_id)
             VALUES (?1, ?2);",
            params![film_id, user_id],
        )?;
        Ok(changed == 1)
    }

    fn remove_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        let conn = self.conn.lock()?;
        let changed = conn.execute(
            "DELETE FROM film_likes
             WHERE film_id = ?1
               AND user_id = ?2;",
            params![film_id, user_id],
        )?;
        Ok(changed == 1)
    }

    fn likes_of(&self, film_id: FilmId) -> RepoResult<BTreeSet<UserId>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT user_id
             FROM film_likes
             WHERE film_id = ?1;",
        )?;
        let mut rows = stmt.query([film_id])?;
        let mut users = BTreeSet::new();
        while let Some(row) = rows.next()? {
            users.insert(row.get::<_, UserId>(0)?);
        }
        Ok(users)
    }

    fn like_count(&self, film_id: FilmId) -> RepoResult<usize> {
        let conn = self.conn.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM film_likes WHERE film_id = ?1;",
            [film_id],
            |row| row.get(0),
        )?;
        to_count(count)
    }

    fn like_counts(&self) -> RepoResult<BTreeMap<FilmId, usize>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT film_id, COUNT(*) AS likes
             FROM film_likes
             GROUP BY film_id;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let film_id: FilmId = row.get("film_id")?;
            counts.insert(film_id, to_count(row.get("likes")?)?);
        }
        Ok(counts)
    }
}

fn to_count(value: i64) -> RepoResult<usize> {
    usize::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid like count `{value}`")))
}
