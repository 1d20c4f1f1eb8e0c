//! Sealing and opening of byte strings with XChaCha20-Poly1305.
//!
//! A sealed message is laid out as `nonce (24) || ciphertext || tag (16)`.
//! Nonces are drawn at random for every message.

use std::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};

use super::error::{CryptoError, CryptoResult};
use super::key::EncryptionKey;

/// Length of the random nonce prefix.
pub const NONCE_SIZE: usize = 24;

/// Length of the Poly1305 tag suffix.
pub const TAG_SIZE: usize = 16;

/// Length of a sealed empty message.
pub const MIN_CIPHERTEXT_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// An AEAD instance bound to one key.
#[derive(Clone)]
pub struct Cipher {
    aead: XChaCha20Poly1305,
}

impl Cipher {
    /// Binds a cipher to `key`.
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }

    /// Seals `plaintext` under a fresh nonce.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut message = nonce.to_vec();
        message.extend(sealed);
        Ok(message)
    }

    /// Opens a message produced by [`Cipher::seal`].
    ///
    /// Fails with [`CryptoError::CiphertextTooShort`] if there is no room for
    /// a nonce and a tag, and with [`CryptoError::DecryptionFailed`] if the
    /// tag does not authenticate under this key.
    pub fn open(&self, message: &[u8]) -> CryptoResult<Vec<u8>> {
        if message.len() < MIN_CIPHERTEXT_SIZE {
            return Err(CryptoError::CiphertextTooShort);
        }

        let (nonce, sealed) = message.split_at(NONCE_SIZE);
        self.aead
            .decrypt(XNonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("algorithm", &"XChaCha20-Poly1305")
            .finish_non_exhaustive()
    }
}
