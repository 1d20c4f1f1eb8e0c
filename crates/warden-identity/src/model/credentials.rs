use std::fmt;

use serde::{Deserialize, Serialize};

/// Email and plaintext password supplied by a caller.
///
/// Never persisted. The password is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from an email and password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A request to replace a password.
///
/// `new` and `repeated` must be equal; `old` proves the caller knows the
/// current password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    /// The new password.
    pub new: String,
    /// The new password, typed a second time.
    pub repeated: String,
    /// The current email and password.
    pub old: Credentials,
}

impl PasswordChange {
    /// Returns whether both copies of the new password are equal.
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.new == self.repeated
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordChange")
            .field("new", &"[REDACTED]")
            .field("repeated", &"[REDACTED]")
            .field("old", &self.old)
            .finish()
    }
}

/// Encrypted credential record as it is stored.
///
/// `password` and `salt` are base64 ciphertexts; neither is ever written or
/// compared in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Login email address.
    pub email: String,
    /// Encrypted password hash.
    pub password: String,
    /// Encrypted salt.
    pub salt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_passwords() {
        let change = PasswordChange {
            new: "n3w-s3cret".into(),
            repeated: "n3w-s3cret".into(),
            old: Credentials::new("ada@example.com", "0ld-s3cret"),
        };

        let debug = format!("{change:?}");
        assert!(debug.contains("ada@example.com"));
        assert!(!debug.contains("s3cret"));
        assert!(change.is_confirmed());
    }
}
