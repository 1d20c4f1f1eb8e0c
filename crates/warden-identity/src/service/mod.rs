//! Identity services.
//!
//! [`SessionManager`] is the entry point: it orchestrates the
//! [`CredentialService`], the token codec and the account and session stores.

mod config;
mod credentials;
pub mod security;
mod sessions;
pub mod token;

pub use config::{IdentityConfig, IdentityConfigBuilder, IdentityConfigBuilderError};
pub use credentials::CredentialService;
pub use sessions::SessionManager;
pub use token::{AuthClaims, TokenSigner, TokenUser, TokenVerifier};

#[cfg(test)]
pub(crate) fn test_config() -> IdentityConfig {
    IdentityConfig::builder()
        .with_password_pepper("test-pepper")
        .with_password_encryption_key("test-encryption-key")
        .with_token_secret("test-token-secret")
        .build()
        .expect("test configuration is valid")
}
