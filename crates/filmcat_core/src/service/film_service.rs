//! Film use-case service.
//!
//! # Responsibility
//! - Validate and persist films.
//! - Expose like and popularity use-cases.
//!
//! # Invariants
//! - No film reaches the store without passing `Film::validate`.
//! - Popularity always goes through `ranking::rank_films`, whatever backend
//!   holds the likes.

use crate::model::film::{Film, FilmId};
use crate::model::user::UserId;
use crate::repo::EntityRepository;
use crate::service::error::{require, ServiceResult};
use crate::service::like_tracker::LikeTracker;
use crate::service::ranking::{rank_films, RankedFilm, DEFAULT_POPULAR_COUNT};
use log::{info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Film service facade over the film store and the like tracker.
#[derive(Clone)]
pub struct FilmService {
    films: Arc<dyn EntityRepository<Film>>,
    likes: LikeTracker,
}

impl FilmService {
    pub fn new(films: Arc<dyn EntityRepository<Film>>, likes: LikeTracker) -> Self {
        Self { films, likes }
    }

    pub fn likes(&self) -> &LikeTracker {
        &self.likes
    }

    pub fn add_film(&self, film: Film) -> ServiceResult<Film> {
        validate(&film)?;
        let stored = self.films.add(&film)?;
        info!("event=film_add module=films status=ok film_id={}", stored.id);
        Ok(stored)
    }

    pub fn update_film(&self, film: Film) -> ServiceResult<Film> {
        validate(&film)?;
        let stored = self.films.update(&film)?;
        info!("event=film_update module=films status=ok film_id={}", stored.id);
        Ok(stored)
    }

    pub fn get_film(&self, film_id: FilmId) -> ServiceResult<Film> {
        require(self.films.as_ref(), film_id)
    }

    pub fn list_films(&self) -> ServiceResult<Vec<Film>> {
        Ok(self.films.get_all()?)
    }

    pub fn add_like(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        self.likes.record_like(film_id, user_id)
    }

    pub fn remove_like(&self, film_id: FilmId, user_id: UserId) -> ServiceResult<()> {
        self.likes.withdraw_like(film_id, user_id)
    }

    pub fn likers(&self, film_id: FilmId) -> ServiceResult<BTreeSet<UserId>> {
        self.likes.likers_of(film_id)
    }

    /// Most liked films; `None` means `DEFAULT_POPULAR_COUNT`.
    pub fn popular(&self, count: Option<i64>) -> ServiceResult<Vec<Film>> {
        Ok(self
            .popular_ranked(count)?
            .into_iter()
            .map(|ranked| ranked.film)
            .collect())
    }

    /// Most liked films with the counts they were ranked by.
    pub fn popular_ranked(&self, count: Option<i64>) -> ServiceResult<Vec<RankedFilm>> {
        let films = self.films.get_all()?;
        let counts = self.likes.like_counts()?;
        Ok(rank_films(
            films,
            &counts,
            count.unwrap_or(DEFAULT_POPULAR_COUNT),
        ))
    }
}

fn validate(film: &Film) -> ServiceResult<()> {
    if let Err(err) = film.validate() {
        warn!(
            "event=film_validate module=films status=error film_id={} error={}",
            film.id, err
        );
        return Err(err.into());
    }
    Ok(())
}
