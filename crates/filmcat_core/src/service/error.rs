//! Service-level error surfaced to transport callers.

use crate::model::film::FilmValidationError;
use crate::model::user::{UserId, UserValidationError};
use crate::model::{Entity, EntityKind};
use crate::repo::{EntityRepository, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Transport-facing classification of a `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input; nothing was mutated.
    BadRequest,
    /// A referenced handle does not exist.
    MissingResource,
    /// Storage failure.
    Internal,
}

/// Error returned by catalog use-cases.
#[derive(Debug)]
pub enum ServiceError {
    InvalidUser(UserValidationError),
    InvalidFilm(FilmValidationError),
    /// A user tried to befriend (or unfriend) themselves.
    SelfFriendship(UserId),
    NotFound { kind: EntityKind, id: i64 },
    Repo(RepoError),
}

impl ServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidUser(_) | Self::InvalidFilm(_) | Self::SelfFriendship(_) => {
                ErrorClass::BadRequest
            }
            Self::NotFound { .. } => ErrorClass::MissingResource,
            Self::Repo(_) => ErrorClass::Internal,
        }
    }

    /// Short stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUser(_) => "invalid_user",
            Self::InvalidFilm(_) => "invalid_film",
            Self::SelfFriendship(_) => "self_friendship",
            Self::NotFound { .. } => "not_found",
            Self::Repo(_) => "storage_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUser(err) => write!(f, "invalid user: {err}"),
            Self::InvalidFilm(err) => write!(f, "invalid film: {err}"),
            Self::SelfFriendship(id) => write!(f, "user {id} cannot befriend themselves"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUser(err) => Some(err),
            Self::InvalidFilm(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::SelfFriendship(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationError> for ServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUser(value)
    }
}

impl From<FilmValidationError> for ServiceError {
    fn from(value: FilmValidationError) -> Self {
        Self::InvalidFilm(value)
    }
}

/// Loads an entity or reports it as missing.
pub(crate) fn require<T: Entity>(repo: &dyn EntityRepository<T>, id: i64) -> ServiceResult<T> {
    repo.get_by_id(id)?.ok_or(ServiceError::NotFound { kind: T::KIND, id })
}
