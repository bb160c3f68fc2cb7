//! Volatile, map-backed implementations of every storage contract.
//!
//! # Responsibility
//! - Mirror the SQLite backend's observable behavior without a database.
//! - Serve as the default backend for tests and short-lived processes.
//!
//! # Invariants
//! - One `Mutex` per store; every call holds it for its whole duration.
//! - Handles come from a monotonic counter and are never reused.
//! - Friendship transactions stage writes and apply them only on success.

use crate::model::film::FilmId;
use crate::model::friendship::FriendshipStatus;
use crate::model::user::UserId;
use crate::model::Entity;
use crate::repo::friendship_repo::{EdgeTable, FriendshipStore};
use crate::repo::like_repo::LikeStore;
use crate::repo::{not_found, EntityRepository, RepoError, RepoResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Map-backed entity store usable for both `User` and `Film`.
pub struct InMemoryEntityRepository<T> {
    state: Mutex<EntityTable<T>>,
}

struct EntityTable<T> {
    last_id: i64,
    records: BTreeMap<i64, T>,
}

impl<T: Entity> InMemoryEntityRepository<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EntityTable {
                last_id: 0,
                records: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, EntityTable<T>>> {
        self.state
            .lock()
            .map_err(|_| RepoError::LockPoisoned(T::KIND.as_str()))
    }
}

impl<T: Entity> Default for InMemoryEntityRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityRepository<T> for InMemoryEntityRepository<T> {
    fn add(&self, entity: &T) -> RepoResult<T> {
        let mut table = self.lock()?;
        table.last_id += 1;
        let mut stored = entity.clone();
        stored.set_id(table.last_id);
        table.records.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    fn get_by_id(&self, id: i64) -> RepoResult<Option<T>> {
        Ok(self.lock()?.records.get(&id).cloned())
    }

    fn update(&self, entity: &T) -> RepoResult<T> {
        let mut table = self.lock()?;
        match table.records.get_mut(&entity.id()) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity.clone())
            }
            None => Err(not_found::<T>(entity.id())),
        }
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        Ok(self.lock()?.records.values().cloned().collect())
    }
}

type EdgeKey = (UserId, UserId);

/// Map-backed friendship edge store keyed by ordered `(owner, peer)` pairs.
#[derive(Default)]
pub struct InMemoryFriendshipStore {
    edges: Mutex<BTreeMap<EdgeKey, FriendshipStatus>>,
}

impl InMemoryFriendshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, BTreeMap<EdgeKey, FriendshipStatus>>> {
        self.edges
            .lock()
            .map_err(|_| RepoError::LockPoisoned("friendship"))
    }
}

impl FriendshipStore for InMemoryFriendshipStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn EdgeTable) -> RepoResult<()>,
    ) -> RepoResult<()> {
        let mut edges = self.lock()?;
        let mut staged = StagedEdges {
            committed: &edges,
            pending: BTreeMap::new(),
        };
        work(&mut staged)?;

        let pending = staged.pending;
        for (key, change) in pending {
            match change {
                Some(status) => edges.insert(key, status),
                None => edges.remove(&key),
            };
        }
        Ok(())
    }

    fn edge(&self, user_id: UserId, friend_id: UserId) -> RepoResult<Option<FriendshipStatus>> {
        Ok(self.lock()?.get(&(user_id, friend_id)).copied())
    }

    fn edges_from(&self, user_id: UserId) -> RepoResult<BTreeMap<UserId, FriendshipStatus>> {
        let edges = self.lock()?;
        Ok(edges
            .range((user_id, UserId::MIN)..=(user_id, UserId::MAX))
            .map(|(&(_, friend_id), &status)| (friend_id, status))
            .collect())
    }
}

/// Write journal over the committed edge map; `None` marks a deletion.
struct StagedEdges<'a> {
    committed: &'a BTreeMap<EdgeKey, FriendshipStatus>,
    pending: BTreeMap<EdgeKey, Option<FriendshipStatus>>,
}

impl EdgeTable for StagedEdges<'_> {
    fn edge(&self, user_id: UserId, friend_id: UserId) -> RepoResult<Option<FriendshipStatus>> {
        let key = (user_id, friend_id);
        Ok(match self.pending.get(&key) {
            Some(change) => *change,
            None => self.committed.get(&key).copied(),
        })
    }

    fn upsert_edge(
        &mut self,
        user_id: UserId,
        friend_id: UserId,
        status: FriendshipStatus,
    ) -> RepoResult<()> {
        self.pending.insert((user_id, friend_id), Some(status));
        Ok(())
    }

    fn delete_edge(&mut self, user_id: UserId, friend_id: UserId) -> RepoResult<bool> {
        let existed = self.edge(user_id, friend_id)?.is_some();
        self.pending.insert((user_id, friend_id), None);
        Ok(existed)
    }
}

/// Map-backed like store.
#[derive(Default)]
pub struct InMemoryLikeStore {
    likes: Mutex<BTreeMap<FilmId, BTreeSet<UserId>>>,
}

impl InMemoryLikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, BTreeMap<FilmId, BTreeSet<UserId>>>> {
        self.likes.lock().map_err(|_| RepoError::LockPoisoned("like"))
    }
}

impl LikeStore for InMemoryLikeStore {
    fn add_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        Ok(self.lock()?.entry(film_id).or_default().insert(user_id))
    }

    fn remove_like(&self, film_id: FilmId, user_id: UserId) -> RepoResult<bool> {
        let mut likes = self.lock()?;
        let Some(users) = likes.get_mut(&film_id) else {
            return Ok(false);
        };
        let removed = users.remove(&user_id);
        if users.is_empty() {
            likes.remove(&film_id);
        }
        Ok(removed)
    }

    fn likes_of(&self, film_id: FilmId) -> RepoResult<BTreeSet<UserId>> {
        Ok(self.lock()?.get(&film_id).cloned().unwrap_or_default())
    }

    fn like_count(&self, film_id: FilmId) -> RepoResult<usize> {
        Ok(self.lock()?.get(&film_id).map_or(0, BTreeSet::len))
    }

    fn like_counts(&self) -> RepoResult<BTreeMap<FilmId, usize>> {
        Ok(self
            .lock()?
            .iter()
            .map(|(&film_id, users)| (film_id, users.len()))
            .collect())
    }
}
