use std::borrow::Cow;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Role, User};

/// The user an access token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenUser {
    /// User identifier.
    pub id: Uuid,
    /// Role of the user.
    pub role: Role,
}

impl From<&User> for TokenUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}

/// Claims of a warden access token.
///
/// Timestamps are encoded as Unix seconds. Claims are never changed after
/// issuance; a refresh issues a new token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Issuer (who created the token).
    #[serde(rename = "iss")]
    issued_by: Cow<'static, str>,
    /// Audience (who the token is intended for).
    #[serde(rename = "aud")]
    audience: Cow<'static, str>,

    /// Subject: the session the token belongs to.
    #[serde(rename = "sub")]
    pub session_id: Uuid,
    /// The user the token was issued to.
    pub user: TokenUser,

    /// Issued at.
    #[serde(rename = "iat", with = "jiff::fmt::serde::timestamp::second::required")]
    pub issued_at: Timestamp,
    /// Expiration time.
    #[serde(rename = "exp", with = "jiff::fmt::serde::timestamp::second::required")]
    pub expires_at: Timestamp,
}

impl AuthClaims {
    /// JWT audience of every access token.
    pub const JWT_AUDIENCE: &str = "warden:identity";
    /// JWT issuer of every access token.
    pub const JWT_ISSUER: &str = "warden";

    pub(crate) fn new(
        session_id: Uuid,
        user: TokenUser,
        issued_at: Timestamp,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            issued_by: Cow::Borrowed(Self::JWT_ISSUER),
            audience: Cow::Borrowed(Self::JWT_AUDIENCE),
            session_id,
            user,
            issued_at,
            expires_at,
        }
    }

    /// Returns the issuer claim.
    #[inline]
    pub fn issuer(&self) -> &str {
        &self.issued_by
    }

    /// Returns the audience claim.
    #[inline]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Returns how long ago the token was issued.
    #[inline]
    pub fn age(&self, now: Timestamp) -> SignedDuration {
        now.duration_since(self.issued_at)
    }
}
