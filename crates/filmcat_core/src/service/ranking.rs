//! Popularity ranking.
//!
//! Pure over its inputs so both storage backends rank identically.
//! Order: like count descending, then handle ascending.

use crate::model::film::{Film, FilmId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of films returned when the caller does not ask for a count.
pub const DEFAULT_POPULAR_COUNT: i64 = 10;

/// Film paired with the like count it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedFilm {
    #[serde(flatten)]
    pub film: Film,
    pub likes: usize,
}

/// Ranks `films` by like count and keeps the first `limit`.
///
/// Films missing from `like_counts` count as zero likes. `limit <= 0`
/// yields an empty list; a limit above the film count yields every film.
pub fn rank_films(
    films: Vec<Film>,
    like_counts: &BTreeMap<FilmId, usize>,
    limit: i64,
) -> Vec<RankedFilm> {
    let Ok(limit) = usize::try_from(limit) else {
        return Vec::new();
    };

    let mut ranked: Vec<RankedFilm> = films
        .into_iter()
        .map(|film| RankedFilm {
            likes: like_counts.get(&film.id).copied().unwrap_or(0),
            film,
        })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .likes
            .cmp(&left.likes)
            .then_with(|| left.film.id.cmp(&right.film.id))
    });
    ranked.truncate(limit);
    ranked
}

/// Same ordering as `rank_films`, without the counts.
pub fn top_films(films: Vec<Film>, like_counts: &BTreeMap<FilmId, usize>, limit: i64) -> Vec<Film> {
    rank_films(films, like_counts, limit)
        .into_iter()
        .map(|ranked| ranked.film)
        .collect()
}
