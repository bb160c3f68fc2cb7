//! Friendship state machine.
//!
//! # Responsibility
//! - Own every transition of directed friendship edges.
//! - Answer friend and mutual-friend queries.
//!
//! # Invariants
//! - `rel(a, b) = Confirmed` implies `rel(b, a) = Confirmed`.
//! - Two opposite `Requested` edges never survive a request that observes
//!   both; they are promoted to `Confirmed` together.
//! - Each mutation runs inside one `FriendshipStore::transaction`.
//!
//! Transitions per ordered pair `(a, b)`:
//!
//! | from        | event              | to          |
//! |-------------|--------------------|-------------|
//! | absent      | `a` requests `b`   | `Requested` |
//! | `Requested` | `b` requests `a`   | `Confirmed` |
//! | `Confirmed` | `b` removes `a`    | `Requested` |
//! | any         | `a` removes `b`    | absent      |

use crate::model::friendship::FriendshipStatus;
use crate::model::user::{User, UserId};
use crate::repo::friendship_repo::{EdgeTable, FriendshipStore};
use crate::repo::{EntityRepository, RepoResult};
use crate::service::error::{require, ServiceError, ServiceResult};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Relationship ledger over a user store and an edge store.
#[derive(Clone)]
pub struct FriendshipLedger {
    users: Arc<dyn EntityRepository<User>>,
    edges: Arc<dyn FriendshipStore>,
}

impl FriendshipLedger {
    pub fn new(users: Arc<dyn EntityRepository<User>>, edges: Arc<dyn FriendshipStore>) -> Self {
        Self { users, edges }
    }

    /// Records that `user_id` asks `friend_id` for friendship.
    ///
    /// Returns the resulting status of `rel(user_id, friend_id)`:
    /// `Confirmed` when `friend_id` had already asked, `Requested` otherwise.
    ///
    /// # Errors
    /// - `SelfFriendship` when both handles are equal.
    /// - `NotFound` when either user does not exist.
    pub fn request_friendship(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> ServiceResult<FriendshipStatus> {
        self.resolve_pair(user_id, friend_id)?;

        let mut outcome = FriendshipStatus::Requested;
        let result = self.edges.transaction(&mut |edges| {
            outcome = apply_request(edges, user_id, friend_id)?;
            Ok(())
        });
        if let Err(err) = result {
            warn!(
                "event=friendship_request module=ledger status=error user_id={user_id} friend_id={friend_id} error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=friendship_request module=ledger status=ok user_id={user_id} friend_id={friend_id} outcome={outcome}"
        );
        Ok(outcome)
    }

    /// Withdraws `user_id`'s side of the relationship with `friend_id`.
    ///
    /// A confirmed reverse edge falls back to `Requested`: the peer's own
    /// request still stands. Missing edges are a no-op.
    pub fn remove_friendship(&self, user_id: UserId, friend_id: UserId) -> ServiceResult<()> {
        self.resolve_pair(user_id, friend_id)?;

        let mut removed = false;
        let result = self.edges.transaction(&mut |edges| {
            removed = apply_removal(edges, user_id, friend_id)?;
            Ok(())
        });
        if let Err(err) = result {
            warn!(
                "event=friendship_remove module=ledger status=error user_id={user_id} friend_id={friend_id} error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=friendship_remove module=ledger status=ok user_id={user_id} friend_id={friend_id} removed={removed}"
        );
        Ok(())
    }

    /// Every peer `user_id` has an edge to, requested or confirmed.
    pub fn friends_of(&self, user_id: UserId) -> ServiceResult<BTreeSet<UserId>> {
        Ok(self.relationships_of(user_id)?.into_keys().collect())
    }

    /// Peers confirmed with both users.
    pub fn mutual_friends_of(
        &self,
        user_id: UserId,
        other_id: UserId,
    ) -> ServiceResult<BTreeSet<UserId>> {
        let mine = confirmed_peers(self.relationships_of(user_id)?);
        let theirs = confirmed_peers(self.relationships_of(other_id)?);
        Ok(mine.intersection(&theirs).copied().collect())
    }

    /// Point read of `rel(user_id, friend_id)`.
    pub fn relationship(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> ServiceResult<Option<FriendshipStatus>> {
        require(self.users.as_ref(), user_id)?;
        require(self.users.as_ref(), friend_id)?;
        Ok(self.edges.edge(user_id, friend_id)?)
    }

    /// The full relationship map owned by `user_id`.
    pub fn relationships_of(
        &self,
        user_id: UserId,
    ) -> ServiceResult<BTreeMap<UserId, FriendshipStatus>> {
        require(self.users.as_ref(), user_id)?;
        Ok(self.edges.edges_from(user_id)?)
    }

    fn resolve_pair(&self, user_id: UserId, friend_id: UserId) -> ServiceResult<()> {
        if user_id == friend_id {
            return Err(ServiceError::SelfFriendship(user_id));
        }
        require(self.users.as_ref(), user_id)?;
        require(self.users.as_ref(), friend_id)?;
        Ok(())
    }
}

fn apply_request(
    edges: &mut dyn EdgeTable,
    user_id: UserId,
    friend_id: UserId,
) -> RepoResult<FriendshipStatus> {
    let forward = match edges.edge(user_id, friend_id)? {
        Some(status) => status,
        None => {
            edges.upsert_edge(user_id, friend_id, FriendshipStatus::Requested)?;
            FriendshipStatus::Requested
        }
    };

    match edges.edge(friend_id, user_id)? {
        // Reciprocation: both sides have asked.
        Some(FriendshipStatus::Requested) => {
            edges.upsert_edge(user_id, friend_id, FriendshipStatus::Confirmed)?;
            edges.upsert_edge(friend_id, user_id, FriendshipStatus::Confirmed)?;
            Ok(FriendshipStatus::Confirmed)
        }
        Some(FriendshipStatus::Confirmed) => {
            if forward != FriendshipStatus::Confirmed {
                edges.upsert_edge(user_id, friend_id, FriendshipStatus::Confirmed)?;
            }
            Ok(FriendshipStatus::Confirmed)
        }
        None => Ok(forward),
    }
}

fn apply_removal(edges: &mut dyn EdgeTable, user_id: UserId, friend_id: UserId) -> RepoResult<bool> {
    let removed = edges.delete_edge(user_id, friend_id)?;
    if edges.edge(friend_id, user_id)? == Some(FriendshipStatus::Confirmed) {
        edges.upsert_edge(friend_id, user_id, FriendshipStatus::Requested)?;
    }
    Ok(removed)
}

fn confirmed_peers(edges: BTreeMap<UserId, FriendshipStatus>) -> BTreeSet<UserId> {
    edges
        .into_iter()
        .filter(|(_, status)| status.is_confirmed())
        .map(|(peer, _)| peer)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::FriendshipLedger;
    use crate::model::friendship::FriendshipStatus;
    use crate::model::user::{User, UserId};
    use crate::model::EntityKind;
    use crate::repo::memory::{InMemoryEntityRepository, InMemoryFriendshipStore};
    use crate::repo::EntityRepository;
    use crate::service::error::ServiceError;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn ledger_with_users(count: usize) -> (FriendshipLedger, Vec<UserId>) {
        let users: Arc<InMemoryEntityRepository<User>> = Arc::new(InMemoryEntityRepository::new());
        let birthday = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let ids = (0..count)
            .map(|index| {
                let login = format!("user{index}");
                users
                    .add(&User::new(format!("{login}@example.com"), login, "", birthday))
                    .unwrap()
                    .id
            })
            .collect();
        let ledger = FriendshipLedger::new(users, Arc::new(InMemoryFriendshipStore::new()));
        (ledger, ids)
    }

    #[test]
    fn one_sided_request_stays_requested() {
        let (ledger, ids) = ledger_with_users(2);
        let status = ledger.request_friendship(ids[0], ids[1]).unwrap();

        assert_eq!(status, FriendshipStatus::Requested);
        assert_eq!(
            ledger.relationship(ids[0], ids[1]).unwrap(),
            Some(FriendshipStatus::Requested)
        );
        assert_eq!(ledger.relationship(ids[1], ids[0]).unwrap(), None);
    }

    #[test]
    fn reciprocal_request_confirms_both_sides() {
        let (ledger, ids) = ledger_with_users(2);
        ledger.request_friendship(ids[0], ids[1]).unwrap();
        let status = ledger.request_friendship(ids[1], ids[0]).unwrap();

        assert_eq!(status, FriendshipStatus::Confirmed);
        assert_eq!(
            ledger.relationship(ids[0], ids[1]).unwrap(),
            Some(FriendshipStatus::Confirmed)
        );
        assert_eq!(
            ledger.relationship(ids[1], ids[0]).unwrap(),
            Some(FriendshipStatus::Confirmed)
        );
    }

    #[test]
    fn removal_demotes_reverse_edge() {
        let (ledger, ids) = ledger_with_users(2);
        ledger.request_friendship(ids[0], ids[1]).unwrap();
        ledger.request_friendship(ids[1], ids[0]).unwrap();
        ledger.remove_friendship(ids[0], ids[1]).unwrap();

        assert_eq!(ledger.relationship(ids[0], ids[1]).unwrap(), None);
        assert_eq!(
            ledger.relationship(ids[1], ids[0]).unwrap(),
            Some(FriendshipStatus::Requested)
        );
    }

    #[test]
    fn self_friendship_is_rejected_before_lookup() {
        let (ledger, _) = ledger_with_users(0);
        let err = ledger.request_friendship(42, 42).unwrap_err();
        assert!(matches!(err, ServiceError::SelfFriendship(42)));
    }

    #[test]
    fn unknown_peer_is_not_found() {
        let (ledger, ids) = ledger_with_users(1);
        let err = ledger.request_friendship(ids[0], 999).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                kind: EntityKind::User,
                id: 999
            }
        ));
        assert!(ledger.friends_of(ids[0]).unwrap().is_empty());
    }
}
