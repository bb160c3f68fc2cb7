//! Friendship edge store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist directed `(user_id, friend_id) -> status` edges.
//! - Expose a transactional edge table so the ledger can run its
//!   read-check-write sequence as one critical section.
//!
//! # Invariants
//! - At most one edge per ordered pair.
//! - No edge points from a user to itself (enforced by schema `CHECK`).
//! - Writes made inside `transaction` are visible to later reads in the same
//!   transaction and are discarded entirely when the work closure fails.

use crate::db::SharedConnection;
use crate::model::friendship::FriendshipStatus;
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;

/// Edge operations available inside one store transaction.
pub trait EdgeTable {
    /// Point lookup of `rel(user_id, friend_id)`.
    fn edge(&self, user_id: UserId, friend_id: UserId) -> RepoResult<Option<FriendshipStatus>>;
    /// Inserts or overwrites `rel(user_id, friend_id)`.
    fn upsert_edge(
        &mut self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> RepoResult<()>;
    /// Deletes `rel(user_id, friend_id)`. Returns whether an edge existed.
    fn delete_edge(&mut self, user_id: UserId, friend_id: UserId) -> RepoResult<bool>;
}

/// Storage for directed friendship edges.
pub trait FriendshipStore: Send + Sync {
    /// Runs `work` atomically: all of its writes commit together or not at all.
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn EdgeTable) -> RepoResult<()>,
    ) -> RepoResult<()>;
    /// Point lookup outside any transaction.
    fn edge(&self, user_id: UserId, friend_id: UserId) -> RepoResult<Option<FriendshipStatus>>;
    /// All edges owned by `user_id`, keyed by peer.
    fn edges_from(&self, user_id: UserId) -> RepoResult<BTreeMap<UserId, FriendshipStatus>>;
}

/// SQLite-backed friendship store over the `friendships` table.
pub struct SqliteFriendshipStore {
    conn: SharedConnection,
}

impl SqliteFriendshipStore {
    /// Creates the store from a migrated connection.
    pub fn try_new(conn: SharedConnection) -> RepoResult<Self> {
        {
            let guard = conn.lock()?;
            ensure_connection_ready(&guard)?;
        }
        Ok(Self { conn })
    }
}

impl FriendshipStore for SqliteFriendshipStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn EdgeTable) -> RepoResult<()>,
    ) -> RepoResult<()> {
        let mut conn = self.conn.lock()?;
        // Reciprocal check and dependent writes hold the write lock together,
        // also against other processes sharing the file.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        work(&mut SqliteEdgeTable { conn: &tx })?;
        tx.commit()?;
        Ok(())
    }

    fn edge(&self, user_id: UserId, friend_id: UserId) -> RepoResult<Option<FriendshipStatus>> {
        let conn = self.conn.lock()?;
        load_edge(&conn, user_id, friend_id)
    }

    fn edges_from(&self, user_id: UserId) -> RepoResult<BTreeMap<UserId, FriendshipStatus>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT friend_id, status
             FROM friendships
             WHERE user_id = ?1
             ORDER BY friend_id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut edges = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let friend_id: UserId = row.get("friend_id")?;
            let status_text: String = row.get("status")?;
            edges.insert(friend_id, parse_status(&status_text)?);
        }
        Ok(edges)
    }
}

struct SqliteEdgeTable<'conn> {
    conn: &'conn Connection,
}

impl EdgeTable for SqliteEdgeTable<'_> {
    fn edge(&self, user_id: UserId, friend_id: UserId) -> RepoResult<Option<FriendshipStatus>> {
        load_edge(self.conn, user_id, friend_id)
    }

    fn upsert_edge(
        &mut self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO friendships (user_id, friend_id, status)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, friend_id) DO UPDATE
             SET status = excluded.status,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id, friend_id, status.as_str()],
        )?;
        Ok(())
    }

    fn delete_edge(&mut self, user_id: UserId, friend_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM friendships
             WHERE user_id = ?1
               AND friend_id = ?2;",
            params![user_id, friend_id],
        )?;
        Ok(changed > 0)
    }
}

fn load_edge(
    conn: &Connection,
    user_id: UserId,
    friend_id: UserId,
) -> RepoResult<Option<FriendshipStatus>> {
    let status_text: Option<String> = conn
        .query_row(
            "SELECT status
             FROM friendships
             WHERE user_id = ?1
               AND friend_id = ?2;",
            params![user_id, friend_id],
            |row| row.get(0),
        )
        .optional()?;
    status_text.as_deref().map(parse_status).transpose()
}

fn parse_status(value: &str) -> RepoResult<FriendshipStatus> {
    FriendshipStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid friendship status `{value}` in friendships.status"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db_in_memory;

    fn store_with_two_users() -> SqliteFriendshipStore {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO users (email, login, name, birthday)
             VALUES ('a@example.com', 'a', 'a', '2000-01-01'),
                    ('b@example.com', 'b', 'b', '2000-01-01');",
        )
        .unwrap();
        SqliteFriendshipStore::try_new(SharedConnection::new(conn)).unwrap()
    }

    #[test]
    fn failed_transaction_rolls_back_sqlite_edges() {
        let store = store_with_two_users();
        let result = store.transaction(&mut |edges| {
            edges.upsert_edge(1, 2, FriendshipStatus::Requested)?;
            assert_eq!(edges.edge(1, 2)?, Some(FriendshipStatus::Requested));
            edges.upsert_edge(2, 1, FriendshipStatus::Confirmed)?;
            Err(RepoError::InvalidData("simulated failure".to_string()))
        });

        assert!(matches!(result, Err(RepoError::InvalidData(_))));
        assert_eq!(store.edge(1, 2).unwrap(), None);
        assert_eq!(store.edge(2, 1).unwrap(), None);
        assert!(store.edges_from(1).unwrap().is_empty());
    }

    #[test]
    fn successful_transaction_commits_every_write() {
        let store = store_with_two_users();
        store
            .transaction(&mut |edges| {
                edges.upsert_edge(1, 2, FriendshipStatus::Confirmed)?;
                edges.upsert_edge(2, 1, FriendshipStatus::Confirmed)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.edge(1, 2).unwrap(), Some(FriendshipStatus::Confirmed));
        assert_eq!(store.edge(2, 1).unwrap(), Some(FriendshipStatus::Confirmed));

        // The store stays usable after a rolled back transaction.
        let _ = store.transaction(&mut |edges| {
            edges.delete_edge(1, 2)?;
            Err(RepoError::InvalidData("simulated failure".to_string()))
        });
        assert_eq!(store.edge(1, 2).unwrap(), Some(FriendshipStatus::Confirmed));
    }
}
