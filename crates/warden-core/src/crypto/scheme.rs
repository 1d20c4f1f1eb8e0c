//! Text encryption scheme for credential material.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::cipher::Cipher;
use super::error::{CryptoError, CryptoResult};
use super::key::EncryptionKey;

/// Symmetric encryption of strings into base64 ciphertext text.
///
/// Clones share one cipher; the key never changes after construction.
#[derive(Debug, Clone)]
pub struct EncryptionScheme {
    cipher: Arc<Cipher>,
}

impl EncryptionScheme {
    /// Creates a scheme that encrypts under the given key.
    pub fn new(key: EncryptionKey) -> Self {
        Self {
            cipher: Arc::new(Cipher::new(&key)),
        }
    }

    /// Creates a scheme whose key is derived from an operator-supplied secret.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> CryptoResult<Self> {
        EncryptionKey::derive(secret).map(Self::new)
    }

    /// Encrypts a string and returns its base64 encoded ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let ciphertext = self.cipher.seal(plaintext.as_bytes())?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decodes and decrypts base64 ciphertext and returns the plaintext.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::Decoding`] if the text is not valid base64 or the plaintext is not UTF-8
    /// - [`CryptoError::CiphertextTooShort`] or [`CryptoError::DecryptionFailed`] if the
    ///   ciphertext was not produced by [`EncryptionScheme::encrypt`] under the current key
    pub fn decrypt(&self, ciphertext: &str) -> CryptoResult<String> {
        let decoded = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::Decoding(e.to_string()))?;

        let plaintext = self.cipher.open(&decoded)?;
        String::from_utf8(plaintext).map_err(|e| CryptoError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_under_fixed_key() {
        let scheme = EncryptionScheme::from_secret("my-encryption-key").unwrap();

        for plaintext in ["", "salt", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA", "åäö ✓"] {
            let ciphertext = scheme.encrypt(plaintext).unwrap();
            assert_ne!(ciphertext, plaintext);
            assert_eq!(scheme.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn derived_key_survives_restart() {
        let ciphertext = EncryptionScheme::from_secret("my-encryption-key")
            .unwrap()
            .encrypt("persisted")
            .unwrap();

        let restarted = EncryptionScheme::from_secret("my-encryption-key").unwrap();
        assert_eq!(restarted.decrypt(&ciphertext).unwrap(), "persisted");
    }

    #[test]
    fn foreign_key_fails_instead_of_returning_garbage() {
        let ours = EncryptionScheme::from_secret("my-encryption-key").unwrap();
        let theirs = EncryptionScheme::from_secret("other-encryption-key").unwrap();

        let ciphertext = theirs.encrypt("secret").unwrap();
        let error = ours.decrypt(&ciphertext).unwrap_err();

        assert_eq!(error, CryptoError::DecryptionFailed);
        assert!(!error.is_decoding());
    }

    #[test]
    fn malformed_text_is_a_decoding_error() {
        let scheme = EncryptionScheme::new(EncryptionKey::generate());

        let error = scheme.decrypt("not base64 at all!").unwrap_err();
        assert!(error.is_decoding());
    }

    #[test]
    fn short_ciphertext_is_a_crypto_error() {
        let scheme = EncryptionScheme::new(EncryptionKey::generate());

        let error = scheme.decrypt(&STANDARD.encode(b"tiny")).unwrap_err();
        assert_eq!(error, CryptoError::CiphertextTooShort);
    }
}
