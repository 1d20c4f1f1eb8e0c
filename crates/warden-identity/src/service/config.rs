use std::fmt;

#[cfg(any(test, feature = "config"))]
use clap::Args;
use derive_builder::Builder;
use jiff::SignedDuration;
use serde::{Deserialize, Serialize};
use warden_core::EncryptionScheme;

use super::security::{PasswordHasher, SessionKeys};
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Access tokens are accepted for a day after issuance.
    pub const ACCESS_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

    /// Sessions can be refreshed for a year after creation.
    pub const SESSION_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

    /// Upper bound for either lifetime.
    pub const MAX_LIFETIME_SECS: u64 = 10 * SESSION_LIFETIME_SECS;
}

/// Secrets and lifetimes of the identity services.
///
/// Constructed once at startup and handed by reference to the services that
/// need it. `Debug` output redacts every secret.
#[derive(Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(any(test, feature = "config"), derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct IdentityConfig {
    /// Server-side pepper mixed into every password hash.
    #[cfg_attr(any(test, feature = "config"), arg(long, env = "PASSWORD_PEPPER"))]
    pub password_pepper: String,

    /// Secret the credential encryption key is derived from.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "PASSWORD_ENCRYPTION_KEY")
    )]
    pub password_encryption_key: String,

    /// Secret access tokens are signed with.
    #[cfg_attr(any(test, feature = "config"), arg(long, env = "TOKEN_SECRET"))]
    pub token_secret: String,

    /// Lifetime of access tokens in seconds.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "ACCESS_TOKEN_LIFETIME_SECS", default_value_t = defaults::ACCESS_TOKEN_LIFETIME_SECS)
    )]
    #[builder(default = "defaults::ACCESS_TOKEN_LIFETIME_SECS")]
    #[serde(default = "IdentityConfig::default_access_token_lifetime_secs")]
    pub access_token_lifetime_secs: u64,

    /// Absolute lifetime of a session, and so of its refresh token, in seconds.
    #[cfg_attr(
        any(test, feature = "config"),
        arg(long, env = "SESSION_LIFETIME_SECS", default_value_t = defaults::SESSION_LIFETIME_SECS)
    )]
    #[builder(default = "defaults::SESSION_LIFETIME_SECS")]
    #[serde(default = "IdentityConfig::default_session_lifetime_secs")]
    pub session_lifetime_secs: u64,
}

impl IdentityConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> IdentityConfigBuilder {
        IdentityConfigBuilder::default()
    }

    fn default_access_token_lifetime_secs() -> u64 {
        defaults::ACCESS_TOKEN_LIFETIME_SECS
    }

    fn default_session_lifetime_secs() -> u64 {
        defaults::SESSION_LIFETIME_SECS
    }

    /// Returns the access token lifetime.
    #[inline]
    pub fn access_token_lifetime(&self) -> SignedDuration {
        seconds(self.access_token_lifetime_secs)
    }

    /// Returns the absolute session lifetime.
    #[inline]
    pub fn session_lifetime(&self) -> SignedDuration {
        seconds(self.session_lifetime_secs)
    }

    /// Creates the password hasher keyed with the pepper.
    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(&self.password_pepper)
    }

    /// Derives the credential encryption scheme.
    pub fn encryption_scheme(&self) -> Result<EncryptionScheme> {
        EncryptionScheme::from_secret(&self.password_encryption_key).map_err(|e| {
            Error::config("Failed to derive the credential encryption key").with_source(e)
        })
    }

    /// Creates and checks the token signing keys.
    pub fn session_keys(&self) -> Result<SessionKeys> {
        let keys = SessionKeys::from_secret(&self.token_secret)?;
        keys.validate_keys()?;
        Ok(keys)
    }
}

fn seconds(secs: u64) -> SignedDuration {
    SignedDuration::from_secs(i64::try_from(secs).unwrap_or(i64::MAX))
}

impl IdentityConfigBuilder {
    fn validate(builder: &IdentityConfigBuilder) -> Result<(), String> {
        let secrets = [
            ("Password pepper", &builder.password_pepper),
            ("Password encryption key", &builder.password_encryption_key),
            ("Token secret", &builder.token_secret),
        ];

        for (name, secret) in secrets {
            if let Some(secret) = secret
                && secret.is_empty()
            {
                return Err(format!("{name} cannot be empty"));
            }
        }

        let access = builder
            .access_token_lifetime_secs
            .unwrap_or(defaults::ACCESS_TOKEN_LIFETIME_SECS);
        let session = builder
            .session_lifetime_secs
            .unwrap_or(defaults::SESSION_LIFETIME_SECS);

        if access == 0 || session == 0 {
            return Err("Token and session lifetimes must be greater than 0".to_string());
        }
        if session > defaults::MAX_LIFETIME_SECS {
            return Err("Session lifetime cannot exceed ten years".to_string());
        }
        if access > session {
            return Err("Access token lifetime cannot exceed the session lifetime".to_string());
        }

        Ok(())
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("password_pepper", &"[REDACTED]")
            .field("password_encryption_key", &"[REDACTED]")
            .field("token_secret", &"[REDACTED]")
            .field("access_token_lifetime_secs", &self.access_token_lifetime_secs)
            .field("session_lifetime_secs", &self.session_lifetime_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn builder() -> IdentityConfigBuilder {
        IdentityConfig::builder()
            .with_password_pepper("hot-pepper")
            .with_password_encryption_key("encryption-key")
            .with_token_secret("token-secret")
    }

    #[test]
    fn builder_applies_defaults() -> anyhow::Result<()> {
        let config = builder().build()?;

        assert_eq!(config.access_token_lifetime(), SignedDuration::from_hours(24));
        assert_eq!(config.session_lifetime(), SignedDuration::from_hours(24 * 365));
        config.session_keys()?;
        config.encryption_scheme()?;
        Ok(())
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(builder().with_token_secret("").build().is_err());
        assert!(builder().with_access_token_lifetime_secs(0u64).build().is_err());
        assert!(
            builder()
                .with_access_token_lifetime_secs(7_200u64)
                .with_session_lifetime_secs(3_600u64)
                .build()
                .is_err()
        );
        assert!(
            IdentityConfig::builder()
                .with_password_pepper("pepper")
                .build()
                .is_err()
        );
    }

    #[test]
    fn debug_redacts_secrets() -> anyhow::Result<()> {
        let config = builder().build()?;
        let debug = format!("{config:?}");

        assert!(!debug.contains("hot-pepper"));
        assert!(!debug.contains("encryption-key"));
        assert!(!debug.contains("token-secret"));
        Ok(())
    }

    #[test]
    fn parses_from_command_line() -> anyhow::Result<()> {
        #[derive(Parser)]
        struct Cli {
            #[command(flatten)]
            identity: IdentityConfig,
        }

        let cli = Cli::try_parse_from([
            "warden",
            "--password-pepper",
            "pepper",
            "--password-encryption-key",
            "encryption-key",
            "--token-secret",
            "token-secret",
            "--access-token-lifetime-secs",
            "900",
        ])?;

        assert_eq!(cli.identity.access_token_lifetime_secs, 900);
        assert_eq!(
            cli.identity.session_lifetime_secs,
            defaults::SESSION_LIFETIME_SECS
        );
        Ok(())
    }
}
