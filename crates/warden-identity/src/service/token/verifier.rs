use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Validation, decode};

use super::claims::AuthClaims;
use crate::service::security::{SIGNING_ALGORITHM, SessionKeys};
use crate::tracing_targets::TRACING_TARGET_TOKENS as TRACING_TARGET;
use crate::{ErrorKind, Result};

/// Verifies access tokens under an age policy.
///
/// The signature, issuer, audience and presence of every claim are always
/// checked first. Only then is the token's age compared to the policy's
/// maximum.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: SessionKeys,
    max_age: Option<SignedDuration>,
}

impl TokenVerifier {
    /// Accepts tokens no older than the access token lifetime.
    ///
    /// Used to admit requests.
    pub fn strict(keys: SessionKeys, access_lifetime: SignedDuration) -> Self {
        Self {
            keys,
            max_age: Some(access_lifetime),
        }
    }

    /// Accepts tokens no older than the session lifetime.
    ///
    /// Used when refreshing, where the access token has usually expired.
    pub fn lenient(keys: SessionKeys, session_lifetime: SignedDuration) -> Self {
        Self {
            keys,
            max_age: Some(session_lifetime),
        }
    }

    /// Accepts any correctly signed token regardless of age.
    pub fn signature_only(keys: SessionKeys) -> Self {
        Self { keys, max_age: None }
    }

    /// Returns the maximum accepted age, if any.
    #[inline]
    pub fn max_age(&self) -> Option<SignedDuration> {
        self.max_age
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidSignature`] if the token is malformed, not signed
    ///   with the session keys, or has the wrong issuer or audience
    /// - [`ErrorKind::ExpiredToken`] if the token is older than the maximum age
    pub fn verify(&self, token: &str) -> Result<AuthClaims> {
        self.verify_at(token, Timestamp::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: Timestamp) -> Result<AuthClaims> {
        let claims = decode::<AuthClaims>(token, self.keys.decoding_key(), &validation())
            .map_err(|e| {
                tracing::debug!(target: TRACING_TARGET, error = %e, "Token failed verification");
                ErrorKind::InvalidSignature
                    .with_message("Token signature is invalid")
                    .with_source(e)
            })?
            .claims;

        if let Some(max_age) = self.max_age
            && claims.age(now) > max_age
        {
            tracing::debug!(
                target: TRACING_TARGET,
                session_id = %claims.session_id,
                "Token is older than the verifier permits"
            );
            return Err(ErrorKind::ExpiredToken.with_message("Token has expired"));
        }

        Ok(claims)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_issuer(&[AuthClaims::JWT_ISSUER]);
    validation.set_audience(&[AuthClaims::JWT_AUDIENCE]);
    validation.set_required_spec_claims(&["iss", "aud", "sub", "iat", "exp"]);
    validation
}
