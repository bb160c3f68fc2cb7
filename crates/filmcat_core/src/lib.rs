//! Core domain logic for the film catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use catalog::Catalog;
pub use config::{CatalogConfig, ConfigError, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingConfig};
pub use model::film::{Film, FilmId, FilmValidationError, Genre, MpaRating};
pub use model::friendship::FriendshipStatus;
pub use model::user::{User, UserId, UserValidationError};
pub use model::{Entity, EntityKind};
pub use repo::{EntityRepository, RepoError, RepoResult};
pub use service::error::{ErrorClass, ServiceError, ServiceResult};
pub use service::film_service::FilmService;
pub use service::friendship_ledger::FriendshipLedger;
pub use service::like_tracker::LikeTracker;
pub use service::ranking::{RankedFilm, DEFAULT_POPULAR_COUNT};
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
