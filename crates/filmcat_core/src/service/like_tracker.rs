//! Film like tracking.
//!
//! # Responsibility
//! - Record and withdraw likes after checking both endpoints exist.
//! - Expose per-film like sets and counts to the ranking engine.
//!
//! # Invariants
//! - A like is only written when film and user both exist at write time.
//! - Recording and withdrawing are idempotent.

use crate::model::film::{Film, FilmId};
use crate::model::user::{User, UserId};
use crate::repo::like_repo::LikeStore;
use crate::repo::EntityRepository;
use crate::service::error::{require, ServiceResult};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Affinity tracker over film, user and like stores.
#[derive(Clone)]
pub struct LikeTracker {
    films: Arc<dyn EntityRepository<Film>>,
    users: Arc<dyn EntityRepository<User>>,
    likes: Arc<dyn LikeStore>,
}

impl LikeTracker {
    pub fn new(
        films: Arc<dyn EntityRepository<Film>>,
        users: Arc<dyn EntityRepository<User>>,
        likes: Arc<dyn LikeStore>,
    ) -> Self {
        Self {
            films,
            users,
            likes,
        }
    }

    pub fn record_like(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        self.resolve(film_id, user_id)?;
        let added = self.likes.add_like(film_id, user_id)?;
        info!("event=like_record module=likes status=ok film_id={film_id} user_id={user_id} changed={added}");
        Ok(())
    }

    pub fn withdraw_like(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        self.resolve(film_id, user_id)?;
        let removed = self.likes.remove_like(film_id, user_id)?;
        info!("event=like_withdraw module=likes status=ok film_id={film_id} user_id={user_id} changed={removed}");
        Ok(())
    }

    pub fn like_count(&self, film_id: FilmId) -> ServiceResult<usize> {
        require(self.films.as_ref(), film_id)?;
        Ok(self.likes.like_count(film_id)?)
    }

    /// Handles of users who like the film.
    pub fn likers_of(&self, film_id: FilmId) -> ServiceResult<BTreeSet<UserId>> {
        require(self.films.as_ref(), film_id)?;
        Ok(self.likes.likes_of(film_id)?)
    }

    /// Like counts for every film with at least one like.
    pub fn like_counts(&self) -> ServiceResult<BTreeMap<FilmId, usize>> {
        Ok(self.likes.like_counts()?)
    }

    fn resolve(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        require(self.films.as_ref(), film_id)?;
        require(self.users.as_ref(), user_id)?;
        Ok(())
    }
}
