use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Header, encode};
use uuid::Uuid;

use super::claims::{AuthClaims, TokenUser};
use crate::service::security::{SIGNING_ALGORITHM, SessionKeys};
use crate::tracing_targets::TRACING_TARGET_TOKENS as TRACING_TARGET;
use crate::{Error, Result};

/// Issues signed access tokens.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    keys: SessionKeys,
    lifetime: SignedDuration,
}

impl TokenSigner {
    /// Creates a signer whose tokens expire `lifetime` after issuance.
    pub fn new(keys: SessionKeys, lifetime: SignedDuration) -> Self {
        Self { keys, lifetime }
    }

    /// Returns the lifetime of issued tokens.
    #[inline]
    pub fn lifetime(&self) -> SignedDuration {
        self.lifetime
    }

    /// Signs a token for `subject` issued now.
    pub fn sign(&self, subject: Uuid, user: TokenUser) -> Result<String> {
        self.sign_at(subject, user, Timestamp::now())
    }

    pub(crate) fn sign_at(
        &self,
        subject: Uuid,
        user: TokenUser,
        issued_at: Timestamp,
    ) -> Result<String> {
        let expires_at = issued_at
            .checked_add(self.lifetime)
            .map_err(|e| Error::internal("Token expiry is out of range").with_source(e))?;

        let claims = AuthClaims::new(subject, user, issued_at, expires_at);
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            self.keys.encoding_key(),
        )
        .map_err(|e| {
            tracing::error!(target: TRACING_TARGET, error = %e, "Failed to sign access token");
            Error::internal("Failed to sign access token").with_source(e)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            session_id = %subject,
            user_id = %user.id,
            role = %user.role,
            "Access token signed"
        );

        Ok(token)
    }
}
