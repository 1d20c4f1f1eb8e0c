//! Creation and verification of stored credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use warden_core::EncryptionScheme;

use super::IdentityConfig;
use super::security::PasswordHasher;
use crate::model::{Account, Credentials, StoredCredentials};
use crate::store::AccountStore;
use crate::tracing_targets::TRACING_TARGET_CREDENTIALS as TRACING_TARGET;
use crate::{ErrorKind, Result};

/// Number of random bytes in a credential salt.
const SALT_BYTES: usize = 32;

/// Turns plaintext passwords into encrypted credential records and checks
/// candidate passwords against them.
///
/// A record is produced by salting the password (`hex(SHA-256(password ||
/// salt))`), hashing the salted password with the peppered Argon2id hasher,
/// and encrypting the hash and the salt independently.
#[derive(Debug, Clone)]
pub struct CredentialService<A> {
    accounts: A,
    hasher: PasswordHasher,
    scheme: EncryptionScheme,
}

impl<A: AccountStore> CredentialService<A> {
    /// Creates the service from the identity configuration.
    pub fn new(config: &IdentityConfig, accounts: A) -> Result<Self> {
        Ok(Self {
            accounts,
            hasher: config.password_hasher(),
            scheme: config.encryption_scheme()?,
        })
    }

    /// Returns the account store credentials are looked up in.
    #[inline]
    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    /// Creates a stored credential record for the given credentials.
    ///
    /// Uses a fresh random salt, so two calls never produce the same record.
    pub fn create(&self, credentials: &Credentials) -> Result<StoredCredentials> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = STANDARD.encode(salt_bytes);

        let hash = self
            .hasher
            .hash_password(&salt_password(&credentials.password, &salt))?;

        Ok(StoredCredentials {
            email: credentials.email.clone(),
            password: self.scheme.encrypt(&hash)?,
            salt: self.scheme.encrypt(&salt)?,
        })
    }

    /// Checks the credentials against the stored record for their email.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidCredentials`] if the password does not match
    /// - [`ErrorKind::NotFound`] if no account has the email
    /// - any lookup, decoding or decryption error, unchanged
    pub async fn verify(&self, credentials: &Credentials) -> Result<()> {
        self.verify_account(credentials).await.map(|_| ())
    }

    /// Checks the credentials and returns the account they belong to.
    pub(crate) async fn verify_account(&self, credentials: &Credentials) -> Result<Account> {
        let account = match self.accounts.find_account_by_email(&credentials.email).await {
            Ok(account) => account,
            Err(e) => {
                if e.is(ErrorKind::NotFound) {
                    self.hasher.verify_dummy_password(&credentials.password);
                }
                return Err(e);
            }
        };

        self.check_password(&account.credentials, &credentials.password)
            .inspect_err(|e| {
                tracing::debug!(
                    target: TRACING_TARGET,
                    account_id = %account.id(),
                    kind = %e.kind(),
                    "Credential verification failed"
                );
            })?;

        Ok(account)
    }

    /// Verifies the old credentials, then creates a record for the new
    /// password under the same email.
    ///
    /// Storage is not touched; the caller persists the returned record.
    pub async fn change_password(
        &self,
        new_password: &str,
        old_credentials: &Credentials,
    ) -> Result<StoredCredentials> {
        self.verify(old_credentials).await?;
        self.create(&Credentials::new(old_credentials.email.clone(), new_password))
    }

    fn check_password(&self, stored: &StoredCredentials, password: &str) -> Result<()> {
        let hash = self.scheme.decrypt(&stored.password)?;
        let salt = self.scheme.decrypt(&stored.salt)?;

        self.hasher
            .verify_password(&salt_password(password, &salt), &hash)
    }
}

/// Returns `hex(SHA-256(password || salt))`.
fn salt_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;
    use crate::service::test_config;
    use crate::store::MemoryStore;

    async fn service_with(
        credentials: &Credentials,
    ) -> anyhow::Result<CredentialService<MemoryStore>> {
        let service = CredentialService::new(&test_config(), MemoryStore::new())?;
        let stored = service.create(credentials)?;

        service
            .accounts()
            .save_account(&Account {
                user: User::new(&credentials.email),
                credentials: stored,
            })
            .await?;

        Ok(service)
    }

    #[test]
    fn salted_password_is_hex_sha256() {
        let salted = salt_password("password", "salt");

        assert_eq!(salted.len(), 64);
        assert_eq!(salted, hex::encode(Sha256::digest(b"passwordsalt")));
    }

    #[test]
    fn create_is_not_deterministic() -> anyhow::Result<()> {
        let service = CredentialService::new(&test_config(), MemoryStore::new())?;
        let credentials = Credentials::new("ada@example.com", "correct horse");

        let first = service.create(&credentials)?;
        let second = service.create(&credentials)?;

        assert_eq!(first.email, "ada@example.com");
        assert_ne!(first.password, second.password);
        assert_ne!(first.salt, second.salt);
        assert!(!first.password.contains("argon2"));
        Ok(())
    }

    #[tokio::test]
    async fn verify_after_create() -> anyhow::Result<()> {
        let credentials = Credentials::new("ada@example.com", "correct horse");
        let service = service_with(&credentials).await?;

        service.verify(&credentials).await?;
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() -> anyhow::Result<()> {
        let service = service_with(&Credentials::new("ada@example.com", "correct horse")).await?;

        let error = service
            .verify(&Credentials::new("ada@example.com", "battery staple"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidCredentials);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() -> anyhow::Result<()> {
        let service = service_with(&Credentials::new("ada@example.com", "correct horse")).await?;

        let error = service
            .verify(&Credentials::new("bob@example.com", "correct horse"))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_costs_the_same_as_wrong_password() -> anyhow::Result<()> {
        let service = service_with(&Credentials::new("ada@example.com", "correct horse")).await?;

        let before = service.hasher.argon2_passes();
        let wrong_password = service
            .verify(&Credentials::new("ada@example.com", "battery staple"))
            .await;
        let known = service.hasher.argon2_passes() - before;

        let before = service.hasher.argon2_passes();
        let unknown_email = service
            .verify(&Credentials::new("bob@example.com", "battery staple"))
            .await;
        let unknown = service.hasher.argon2_passes() - before;

        assert!(wrong_password.is_err() && unknown_email.is_err());
        assert_eq!(known, 1);
        assert_eq!(unknown, known);
        Ok(())
    }

    #[tokio::test]
    async fn corrupted_record_is_not_a_mismatch()-> anyhow::Result<()> {
        let credentials = Credentials::new("ada@example.com", "correct horse");
        let service = service_with(&credentials).await?;

        let mut account = service.accounts().find_account_by_email(&credentials.email).await?;
        account.credentials.salt = "not base64!".to_owned();
        service.accounts().save_account(&account).await?;

        let error = service.verify(&credentials).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Decoding);
        Ok(())
    }

    #[tokio::test]
    async fn record_from_another_key_is_a_crypto_error() -> anyhow::Result<()> {
        let credentials = Credentials::new("ada@example.com", "correct horse");
        let service = service_with(&credentials).await?;

        let mut config = test_config();
        config.password_encryption_key = "another-encryption-key".to_owned();
        let other = CredentialService::new(&config, service.accounts().clone())?;

        let error = other.verify(&credentials).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Crypto);
        Ok(())
    }

    #[tokio::test]
    async fn change_password_requires_old_password() -> anyhow::Result<()> {
        let credentials = Credentials::new("ada@example.com", "correct horse");
        let service = service_with(&credentials).await?;

        let stored = service.change_password("battery staple", &credentials).await?;
        assert_eq!(stored.email, credentials.email);

        let error = service
            .change_password(
                "battery staple",
                &Credentials::new("ada@example.com", "wrong"),
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidCredentials);
        Ok(())
    }
}
