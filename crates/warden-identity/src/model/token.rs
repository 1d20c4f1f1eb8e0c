use serde::{Deserialize, Serialize};

use super::user::User;

/// Access token, refresh token and user handed back on login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Signed access token.
    pub token: String,
    /// Single-use refresh token; empty for anonymous tokens.
    pub refresh_token: String,
    /// The user the token was issued to.
    pub user: User,
}
