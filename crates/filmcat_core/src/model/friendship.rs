//! Friendship edge status.
//!
//! A directed edge `owner -> peer` is either absent, `Requested` (owner asked,
//! peer has not reciprocated) or `Confirmed` (both sides asked). There is no
//! rejected state; withdrawing deletes the edge.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Status of one directed friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Requested,
    Confirmed,
}

impl FriendshipStatus {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Confirmed => "confirmed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "requested" => Some(Self::Requested),
            "confirmed" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

impl Display for FriendshipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
