//! Domain model for the film catalog.
//!
//! # Responsibility
//! - Define canonical `User` and `Film` records and their field validation.
//! - Define the tagged friendship status shared by every storage backend.
//!
//! # Invariants
//! - Every stored entity is identified by a store-assigned integer handle.
//! - Handles are immutable after creation and never reused.

use std::fmt::{Display, Formatter};

pub mod film;
pub mod friendship;
pub mod user;

/// Entity category used in not-found reporting and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Film,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Film => "film",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record persisted by an entity repository.
///
/// The handle is owned by the store: `add` overwrites whatever value the
/// caller passed, `update` uses it as the lookup key.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Kind reported in `NotFound` errors.
    const KIND: EntityKind;

    /// Current handle. `0` means "not yet stored".
    fn id(&self) -> i64;

    /// Assigns the store-minted handle.
    fn set_id(&mut self, id: i64);
}
