//! User domain model.
//!
//! # Responsibility
//! - Define the canonical user record.
//! - Validate user fields before any store write.
//!
//! # Invariants
//! - `id` is assigned by the user store and never changes afterwards.
//! - A persisted user always has a non-empty display name (falls back to login).

use crate::model::{Entity, EntityKind};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned user handle.
pub type UserId = i64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Canonical user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Handle minted by the store; ignored on create.
    #[serde(default)]
    pub id: UserId,
    pub email: String,
    pub login: String,
    /// Display name. Blank input is replaced by `login` in the service layer.
    #[serde(default)]
    pub name: String,
    pub birthday: NaiveDate,
}

impl User {
    /// Creates an unsaved user (handle `0`).
    pub fn new(
        email: impl Into<String>,
        login: impl Into<String>,
        name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            email: email.into(),
            login: login.into(),
            name: name.into(),
            birthday,
        }
    }

    /// Replaces a blank display name with the login.
    pub fn normalize_name(&mut self) {
        if self.name.trim().is_empty() {
            self.name = self.login.clone();
        }
    }

    /// Checks field constraints against the given calendar day.
    ///
    /// # Errors
    /// - `InvalidEmail` when email is blank or not shaped `local@domain`.
    /// - `EmptyLogin` / `LoginContainsWhitespace` for unusable logins.
    /// - `BirthdayInFuture` when `birthday` is after `today`.
    pub fn validate(&self, today: NaiveDate) -> Result<(), UserValidationError> {
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        if self.login.trim().is_empty() {
            return Err(UserValidationError::EmptyLogin);
        }
        if self.login.chars().any(char::is_whitespace) {
            return Err(UserValidationError::LoginContainsWhitespace(
                self.login.clone(),
            ));
        }
        if self.birthday > today {
            return Err(UserValidationError::BirthdayInFuture {
                birthday: self.birthday,
                today,
            });
        }
        Ok(())
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Field-level rejection reasons for user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidEmail(String),
    EmptyLogin,
    LoginContainsWhitespace(String),
    BirthdayInFuture { birthday: NaiveDate, today: NaiveDate },
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail(value) => write!(f, "email must look like `name@domain`, got `{value}`"),
            Self::EmptyLogin => write!(f, "login cannot be empty"),
            Self::LoginContainsWhitespace(value) => {
                write!(f, "login cannot contain whitespace, got `{value}`")
            }
            Self::BirthdayInFuture { birthday, today } => {
                write!(f, "birthday {birthday} is in the future (today is {today})")
            }
        }
    }
}

impl Error for UserValidationError {}
