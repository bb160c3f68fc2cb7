//! Composition root wiring stores into services.

use crate::config::{CatalogConfig, StorageBackend};
use crate::db::{open_db, SharedConnection};
use crate::model::film::Film;
use crate::model::user::User;
use crate::repo::film_repo::SqliteFilmRepository;
use crate::repo::friendship_repo::{FriendshipStore, SqliteFriendshipStore};
use crate::repo::like_repo::{LikeStore, SqliteLikeStore};
use crate::repo::memory::{InMemoryEntityRepository, InMemoryFriendshipStore, InMemoryLikeStore};
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::{EntityRepository, RepoResult};
use crate::service::film_service::FilmService;
use crate::service::friendship_ledger::FriendshipLedger;
use crate::service::like_tracker::LikeTracker;
use crate::service::user_service::UserService;
use log::info;
use rusqlite::Connection;
use std::sync::Arc;

/// User and film services sharing one set of stores.
#[derive(Clone)]
pub struct Catalog {
    pub users: UserService,
    pub films: FilmService,
}

impl Catalog {
    pub fn in_memory() -> Self {
        Self::assemble(
            Arc::new(InMemoryEntityRepository::<User>::new()),
            Arc::new(InMemoryEntityRepository::<Film>::new()),
            Arc::new(InMemoryFriendshipStore::new()),
            Arc::new(InMemoryLikeStore::new()),
        )
    }

    /// Builds a catalog over a migrated connection (see `db::open_db`).
    ///
    /// # Errors
    /// - `UninitializedConnection` / `MissingRequiredTable` when the schema
    ///   is not fully migrated.
    pub fn sqlite(conn: Connection) -> RepoResult<Self> {
        let shared = SharedConnection::new(conn);
        Ok(Self::assemble(
            Arc::new(SqliteUserRepository::try_new(shared.clone())?),
            Arc::new(SqliteFilmRepository::try_new(shared.clone())?),
            Arc::new(SqliteFriendshipStore::try_new(shared.clone())?),
            Arc::new(SqliteLikeStore::try_new(shared)?),
        ))
    }

    pub fn open(config: &CatalogConfig) -> RepoResult<Self> {
        info!(
            "event=catalog_open module=catalog status=start backend={}",
            config.backend.as_str()
        );
        match config.backend {
            StorageBackend::Memory => Ok(Self::in_memory()),
            StorageBackend::Sqlite => Self::sqlite(open_db(&config.db_path)?),
        }
    }

    fn assemble(
        users: Arc<dyn EntityRepository<User>>,
        films: Arc<dyn EntityRepository<Film>>,
        edges: Arc<dyn FriendshipStore>,
        likes: Arc<dyn LikeStore>,
    ) -> Self {
        let ledger = FriendshipLedger::new(users.clone(), edges);
        let tracker = LikeTracker::new(films.clone(), users.clone(), likes);
        Self {
            users: UserService::new(users, ledger),
            films: FilmService::new(films, tracker),
        }
    }
}
