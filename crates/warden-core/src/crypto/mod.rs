//! Cryptographic utilities for protecting credential material at rest.
//!
//! [`Cipher`] seals bytes with XChaCha20-Poly1305. [`EncryptionScheme`] wraps it
//! for strings and carries ciphertext as base64 text.
//!
//! # Example
//!
//! ```rust
//! use warden_core::crypto::{EncryptionKey, EncryptionScheme};
//!
//! let key = EncryptionKey::derive("operator-supplied-secret")?;
//! let scheme = EncryptionScheme::new(key);
//!
//! let ciphertext = scheme.encrypt("sensitive credentials")?;
//! assert_eq!(scheme.decrypt(&ciphertext)?, "sensitive credentials");
//! # Ok::<(), warden_core::crypto::CryptoError>(())
//! ```

mod cipher;
mod error;
mod key;
mod scheme;

pub use cipher::{Cipher, MIN_CIPHERTEXT_SIZE, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{EncryptionKey, KEY_SIZE};
pub use scheme::EncryptionScheme;
