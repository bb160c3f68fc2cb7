//! Catalog use-case services.
//!
//! # Responsibility
//! - Validate input and resolve entity existence before delegating.
//! - Own the friendship state machine, like tracking and ranking.
//! - Keep callers decoupled from the storage backend in use.

pub mod error;
pub mod film_service;
pub mod friendship_ledger;
pub mod like_tracker;
pub mod ranking;
pub mod user_service;
