//! User use-case service.
//!
//! # Responsibility
//! - Validate and persist users.
//! - Expose friendship use-cases that return full user records.
//!
//! # Invariants
//! - No user reaches the store without passing `User::validate`.
//! - Stored users always carry a non-blank display name.
//! - Friendship mutations go through `FriendshipLedger` only.

use crate::model::friendship::FriendshipStatus;
use crate::model::user::{User, UserId};
use crate::repo::EntityRepository;
use crate::service::error::{require, ServiceResult};
use crate::service::friendship_ledger::FriendshipLedger;
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Source of "today" for birthday validation.
pub type Clock = fn() -> NaiveDate;

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// User service facade over the user store and the friendship ledger.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn EntityRepository<User>>,
    ledger: FriendshipLedger,
    today: Clock,
}

impl UserService {
    pub fn new(users: Arc<dyn EntityRepository<User>>, ledger: FriendshipLedger) -> Self {
        Self {
            users,
            ledger,
            today: local_today,
        }
    }

    /// Replaces the calendar used for birthday checks.
    pub fn with_clock(mut self, today: Clock) -> Self {
        self.today = today;
        self
    }

    pub fn ledger(&self) -> &FriendshipLedger {
        &self.ledger
    }

    /// Validates and stores a new user; the returned value carries its handle.
    pub fn add_user(&self, mut user: User) -> ServiceResult<User> {
        self.prepare(&mut user)?;
        let stored = self.users.add(&user)?;
        info!("event=user_add module=users status=ok user_id={}", stored.id);
        Ok(stored)
    }

    /// Validates and replaces an existing user.
    pub fn update_user(&self, mut user: User) -> ServiceResult<User> {
        self.prepare(&mut user)?;
        let stored = self.users.update(&user)?;
        info!("event=user_update module=users status=ok user_id={}", stored.id);
        Ok(stored)
    }

    pub fn get_user(&self, user_id: UserId) -> ServiceResult<User> {
        require(self.users.as_ref(), user_id)
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.get_all()?)
    }

    pub fn request_friendship(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> ServiceResult<FriendshipStatus> {
        self.ledger.request_friendship(user_id, friend_id)
    }

    pub fn remove_friendship(&self, user_id: UserId, friend_id: UserId) -> ServiceResult<()> {
        self.ledger.remove_friendship(user_id, friend_id)
    }

    /// Users `user_id` has an edge to, ascending by handle.
    pub fn friends(&self, user_id: UserId) -> ServiceResult<Vec<User>> {
        let ids = self.ledger.friends_of(user_id)?;
        self.load_all(&ids)
    }

    /// Users confirmed with both `user_id` and `other_id`, ascending by handle.
    pub fn common_friends(&self, user_id: UserId, other_id: UserId) -> ServiceResult<Vec<User>> {
        let ids = self.ledger.mutual_friends_of(user_id, other_id)?;
        self.load_all(&ids)
    }

    fn prepare(&self, user: &mut User) -> ServiceResult<()> {
        user.normalize_name();
        if let Err(err) = user.validate((self.today)()) {
            warn!(
                "event=user_validate module=users status=error user_id={} error={}",
                user.id, err
            );
            return Err(err.into());
        }
        Ok(())
    }

    fn load_all(&self, ids: &BTreeSet<UserId>) -> ServiceResult<Vec<User>> {
        ids.iter()
            .map(|&id| require(self.users.as_ref(), id))
            .collect()
    }
}
