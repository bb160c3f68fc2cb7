//! Film domain model and its static classification tables.
//!
//! # Responsibility
//! - Define the canonical film record, genres and MPA ratings.
//! - Validate film fields before any store write.
//!
//! # Invariants
//! - `description` never exceeds 200 UTF-16 code units.
//! - `release_date` is never earlier than 1895-12-28.
//! - `duration` is strictly positive (minutes).

use crate::model::{Entity, EntityKind};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned film handle.
pub type FilmId = i64;

/// Maximum description length, counted in UTF-16 code units.
pub const MAX_DESCRIPTION_UNITS: usize = 200;

static EARLIEST_RELEASE_DATE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1895, 12, 28).expect("valid calendar date"));

/// First public film screening; no release may predate it.
pub fn earliest_release_date() -> NaiveDate {
    *EARLIEST_RELEASE_DATE
}

/// Film genre tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genre {
    Comedy,
    Drama,
    Cartoon,
    Action,
    Thriller,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Comedy,
        Genre::Drama,
        Genre::Cartoon,
        Genre::Action,
        Genre::Thriller,
    ];

    /// Stable numeric id used by the relational schema.
    pub fn id(self) -> i64 {
        match self {
            Self::Comedy => 1,
            Self::Drama => 2,
            Self::Cartoon => 3,
            Self::Action => 4,
            Self::Thriller => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Comedy => "Comedy",
            Self::Drama => "Drama",
            Self::Cartoon => "Cartoon",
            Self::Action => "Action",
            Self::Thriller => "Thriller",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|genre| genre.id() == id)
    }
}

/// MPA age classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MpaRating {
    #[serde(rename = "G")]
    G,
    #[serde(rename = "PG")]
    Pg,
    #[serde(rename = "PG-13")]
    Pg13,
    #[serde(rename = "R")]
    R,
    #[serde(rename = "NC-17")]
    Nc17,
}

impl MpaRating {
    pub const ALL: [MpaRating; 5] = [
        MpaRating::G,
        MpaRating::Pg,
        MpaRating::Pg13,
        MpaRating::R,
        MpaRating::Nc17,
    ];

    /// Stable numeric id used by the relational schema.
    pub fn id(self) -> i64 {
        match self {
            Self::G => 1,
            Self::Pg => 2,
            Self::Pg13 => 3,
            Self::R => 4,
            Self::Nc17 => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::G => "G",
            Self::Pg => "PG",
            Self::Pg13 => "PG-13",
            Self::R => "R",
            Self::Nc17 => "NC-17",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|rating| rating.id() == id)
    }
}

/// Canonical film record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    /// Handle minted by the store; ignored on create.
    #[serde(default)]
    pub id: FilmId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: NaiveDate,
    /// Running time in minutes.
    pub duration: i64,
    #[serde(default)]
    pub mpa: Option<MpaRating>,
    #[serde(default)]
    pub genres: BTreeSet<Genre>,
}

impl Film {
    /// Creates an unsaved film (handle `0`) without rating or genres.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        release_date: NaiveDate,
        duration: i64,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            release_date,
            duration,
            mpa: None,
            genres: BTreeSet::new(),
        }
    }

    /// Checks field constraints.
    ///
    /// Description length is measured in UTF-16 code units so that limits
    /// agree with clients that count that way.
    pub fn validate(&self) -> Result<(), FilmValidationError> {
        if self.name.trim().is_empty() {
            return Err(FilmValidationError::EmptyName);
        }
        let units = self.description.encode_utf16().count();
        if units > MAX_DESCRIPTION_UNITS {
            return Err(FilmValidationError::DescriptionTooLong { units });
        }
        if self.release_date < earliest_release_date() {
            return Err(FilmValidationError::ReleaseDateTooEarly(self.release_date));
        }
        if self.duration <= 0 {
            return Err(FilmValidationError::NonPositiveDuration(self.duration));
        }
        Ok(())
    }
}

impl Entity for Film {
    const KIND: EntityKind = EntityKind::Film;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Field-level rejection reasons for film input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilmValidationError {
    EmptyName,
    DescriptionTooLong { units: usize },
    ReleaseDateTooEarly(NaiveDate),
    NonPositiveDuration(i64),
}

impl Display for FilmValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "film name cannot be empty"),
            Self::DescriptionTooLong { units } => write!(
                f,
                "description is {units} units long; maximum is {MAX_DESCRIPTION_UNITS}"
            ),
            Self::ReleaseDateTooEarly(date) => write!(
                f,
                "release date {date} is earlier than {}",
                earliest_release_date()
            ),
            Self::NonPositiveDuration(value) => {
                write!(f, "duration must be positive, got {value}")
            }
        }
    }
}

impl Error for FilmValidationError {}

#[cfg(test)]
mod tests {
    use super::{earliest_release_date, Film, FilmValidationError, Genre, MpaRating};
    use chrono::NaiveDate;

    fn sample() -> Film {
        Film::new(
            "Arrival of a Train",
            "short",
            NaiveDate::from_ymd_opt(1896, 1, 25).unwrap(),
            1,
        )
    }

    #[test]
    fn release_date_boundary_is_inclusive() {
        let mut film = sample();
        film.release_date = earliest_release_date();
        assert!(film.validate().is_ok());

        film.release_date = earliest_release_date().pred_opt().unwrap();
        assert!(matches!(
            film.validate(),
            Err(FilmValidationError::ReleaseDateTooEarly(_))
        ));
    }

    #[test]
    fn description_counts_utf16_units() {
        let mut film = sample();
        film.description = "a".repeat(200);
        assert!(film.validate().is_ok());

        // Each emoji is two UTF-16 units.
        film.description = "\u{1F3AC}".repeat(101);
        assert_eq!(
            film.validate(),
            Err(FilmValidationError::DescriptionTooLong { units: 202 })
        );
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut film = sample();
        film.duration = 0;
        assert_eq!(
            film.validate(),
            Err(FilmValidationError::NonPositiveDuration(0))
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut film = sample();
        film.name = "   ".to_string();
        assert_eq!(film.validate(), Err(FilmValidationError::EmptyName));
    }

    #[test]
    fn lookup_ids_round_trip() {
        for genre in Genre::ALL {
            assert_eq!(Genre::from_id(genre.id()), Some(genre));
        }
        for rating in MpaRating::ALL {
            assert_eq!(MpaRating::from_id(rating.id()), Some(rating));
        }
        assert_eq!(Genre::from_id(99), None);
        assert_eq!(MpaRating::from_id(0), None);
    }
}
