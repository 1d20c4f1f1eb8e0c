use std::fmt;

use hkdf::Hkdf;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use super::error::{CryptoError, CryptoResult};

/// Length of an XChaCha20-Poly1305 key.
pub const KEY_SIZE: usize = 32;

/// HKDF info string binding derived keys to credential encryption.
const CREDENTIAL_KEY_INFO: &[u8] = b"warden-credential-encryption-key-v1";

/// 256-bit symmetric key. `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Wraps exactly [`KEY_SIZE`] raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        <[u8; KEY_SIZE]>::try_from(bytes)
            .map(|bytes| Self { bytes })
            .map_err(|_| CryptoError::InvalidKeyLength)
    }

    /// Draws a random key from the operating system.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Derives the credential key from an operator secret with HKDF-SHA256.
    ///
    /// The same secret always yields the same key, so stored records remain
    /// readable after a restart. Fails with [`CryptoError::EmptySecret`] on
    /// an empty secret.
    pub fn derive(secret: impl AsRef<[u8]>) -> CryptoResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }

        let mut bytes = [0u8; KEY_SIZE];
        Hkdf::<Sha256>::new(None, secret)
            .expand(CREDENTIAL_KEY_INFO, &mut bytes)
            .map_err(|_| CryptoError::InvalidKeyLength)?;

        Ok(Self { bytes })
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_full_length_keys_are_accepted() {
        assert!(EncryptionKey::from_bytes(&[7u8; KEY_SIZE]).is_ok());
        assert_eq!(
            EncryptionKey::from_bytes(&[7u8; 16]),
            Err(CryptoError::InvalidKeyLength)
        );
    }

    #[test]
    fn derivation_depends_only_on_the_secret() {
        let first = EncryptionKey::derive("operator-secret").unwrap();
        let again = EncryptionKey::derive(b"operator-secret").unwrap();
        let other = EncryptionKey::derive("rotated-secret").unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_ne!(first.as_bytes(), &[0u8; KEY_SIZE]);
        assert_eq!(EncryptionKey::derive(""), Err(CryptoError::EmptySecret));
    }

    #[test]
    fn debug_hides_key_material() {
        let key = EncryptionKey::from_bytes(&[0xAB; KEY_SIZE]).unwrap();
        assert_eq!(format!("{key:?}"), "EncryptionKey([REDACTED])");
    }
}
