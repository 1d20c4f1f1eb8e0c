use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::credentials::StoredCredentials;
use super::watchlist::Watchlist;

/// Role of a token holder.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// A registered user with stored credentials.
    #[default]
    User,
    /// A visitor holding an unpersisted, non-refreshable token.
    Anonymous,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: Uuid,
    /// Login email address; empty for anonymous users.
    pub email: String,
    /// Role of the user.
    pub role: Role,
    /// Watchlists of the user, oldest first.
    pub watchlists: Vec<Watchlist>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl User {
    /// Creates a registered user with no watchlists.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            role: Role::User,
            watchlists: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Creates an anonymous user with the default watchlist.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: String::new(),
            role: Role::Anonymous,
            watchlists: vec![Watchlist::default_watchlist()],
            created_at: Timestamp::now(),
        }
    }
}

/// A user together with its stored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The user.
    pub user: User,
    /// The user's encrypted credentials.
    pub credentials: StoredCredentials,
}

impl Account {
    /// Returns the account id, which is the user id.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}
