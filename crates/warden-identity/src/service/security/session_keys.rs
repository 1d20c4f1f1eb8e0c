//! Token signing keys derived from the operator token secret.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::tracing_targets::TRACING_TARGET_SESSION_KEYS as TRACING_TARGET;
use crate::{Error, Result};

/// Algorithm used to sign every access token.
pub(crate) const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Symmetric keys for signing and verifying access tokens.
///
/// Cloning is cheap; all clones share the same keys.
#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<SessionKeysInner>,
}

struct SessionKeysInner {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
}

impl SessionKeys {
    /// Creates keys from the operator token secret.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Config`] if the secret is empty.
    ///
    /// [`ErrorKind::Config`]: crate::ErrorKind::Config
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::config("Token secret cannot be empty"));
        }

        let inner = SessionKeysInner {
            decoding_key: DecodingKey::from_secret(secret),
            encoding_key: EncodingKey::from_secret(secret),
        };

        tracing::debug!(target: TRACING_TARGET, "Session keys created");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the key used to verify tokens.
    #[inline]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.inner.decoding_key
    }

    /// Returns the key used to sign tokens.
    #[inline]
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.inner.encoding_key
    }

    /// Signs and verifies a throwaway token to check the keys work together.
    pub fn validate_keys(&self) -> Result<()> {
        #[derive(Serialize, Deserialize)]
        struct ProbeClaims {
            sub: String,
        }

        let probe = ProbeClaims {
            sub: "probe".to_owned(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &probe, self.encoding_key())
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET, error = %e, "Key validation failed during encoding");
                Error::config("Session key validation failed").with_source(e)
            })?;

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<ProbeClaims>(&token, self.decoding_key(), &validation).map_err(|e| {
            tracing::error!(target: TRACING_TARGET, error = %e, "Key validation failed during decoding");
            Error::config("Session key validation failed").with_source(e)
        })?;

        Ok(())
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn keys_from_secret_validate() -> anyhow::Result<()> {
        let keys = SessionKeys::from_secret("token-secret")?;
        keys.validate_keys()?;

        assert!(format!("{keys:?}").contains("REDACTED"));
        Ok(())
    }

    #[test]
    fn empty_secret_is_rejected() {
        let error = SessionKeys::from_secret("").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Config);
    }
}
