//! Peppered password hashing and verification using Argon2id.

use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::tracing_targets::TRACING_TARGET_PASSWORD_HASHER as TRACING_TARGET;
use crate::{Error, ErrorKind, Result};

/// Number of random bytes in the Argon2 salt embedded in each hash.
const ARGON2_SALT_BYTES: usize = 16;

/// Argon2id password hasher keyed with a server-side pepper.
///
/// The pepper is passed to Argon2 as its secret parameter, so a hash can only
/// be verified by a hasher holding the same pepper.
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: Arc<[u8]>,
    /// Hash of a random password, verified against when there is no account.
    dummy_hash: Option<Arc<str>>,
    #[cfg(test)]
    argon2_passes: Arc<AtomicUsize>,
}

impl PasswordHasher {
    /// Creates a hasher keyed with the given pepper.
    ///
    /// Hashes one random password up front for [`verify_dummy_password`].
    ///
    /// [`verify_dummy_password`]: PasswordHasher::verify_dummy_password
    pub fn new(pepper: impl AsRef<[u8]>) -> Self {
        let mut hasher = Self {
            pepper: Arc::from(pepper.as_ref()),
            dummy_hash: None,
            #[cfg(test)]
            argon2_passes: Arc::default(),
        };

        let mut dummy = [0u8; ARGON2_SALT_BYTES];
        OsRng.fill_bytes(&mut dummy);
        hasher.dummy_hash = hasher.hash_password(&hex::encode(dummy)).ok().map(Arc::from);
        hasher
    }

    /// Returns how many Argon2 computations this hasher and its clones ran.
    #[cfg(test)]
    pub(crate) fn argon2_passes(&self) -> usize {
        self.argon2_passes.load(Ordering::SeqCst)
    }

    fn argon2(&self) -> Result<Argon2<'_>> {
        #[cfg(test)]
        self.argon2_passes.fetch_add(1, Ordering::SeqCst);

        Argon2::new_with_secret(
            &self.pepper,
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| {
            tracing::error!(target: TRACING_TARGET, error = %e, "Invalid password hasher pepper");
            Error::config("Password pepper is not usable as an Argon2 secret")
        })
    }

    /// Hashes a password and returns the PHC string.
    ///
    /// Each call embeds a fresh random Argon2 salt, so hashing the same input
    /// twice yields different strings.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let mut salt_bytes = [0u8; ARGON2_SALT_BYTES];
        OsRng.fill_bytes(&mut salt_bytes);

        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            tracing::error!(target: TRACING_TARGET, error = %e, "Failed to encode password salt");
            Error::internal("Password processing failed")
        })?;

        let password_hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET, error = %e, "Password hashing failed");
                Error::internal("Password processing failed")
            })?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a PHC string produced by [`hash_password`].
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidCredentials`] if the password does not match
    /// - [`ErrorKind::Decoding`] if the stored hash is not a PHC string
    /// - [`ErrorKind::Internal`] for any other verification failure
    ///
    /// [`hash_password`]: PasswordHasher::hash_password
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::warn!(target: TRACING_TARGET, error = %e, "Stored password hash is malformed");
            ErrorKind::Decoding.with_message("Stored password hash is malformed")
        })?;

        match self.argon2()?.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(ArgonError::Password) => {
                tracing::debug!(target: TRACING_TARGET, "Password does not match stored hash");
                Err(Error::invalid_credentials())
            }
            Err(e) => {
                tracing::error!(target: TRACING_TARGET, error = %e, "Password verification failed");
                Err(Error::internal("Password verification failed"))
            }
        }
    }

    /// Spends the time of one real verification without an account to verify.
    ///
    /// Used when an account does not exist, so response times do not reveal
    /// which emails are registered. Always returns `false`.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        if let Some(dummy_hash) = &self.dummy_hash {
            let _ = self.verify_password(password, dummy_hash);
        }

        false
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("pepper", &"[REDACTED]")
            .finish()
    }
}
