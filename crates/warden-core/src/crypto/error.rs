use thiserror::Error;

/// Result of a `warden-core` crypto operation.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Failure of a key, cipher or scheme operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Shorter than a nonce plus a tag.
    #[error("ciphertext is shorter than a nonce and tag")]
    CiphertextTooShort,
    /// The tag did not authenticate: altered data or another key.
    #[error("ciphertext failed authentication")]
    DecryptionFailed,
    #[error("failed to seal plaintext")]
    EncryptionFailed,
    /// Key material was not 32 bytes long.
    #[error("key must be exactly 32 bytes")]
    InvalidKeyLength,
    #[error("cannot derive a key from an empty secret")]
    EmptySecret,
    /// Ciphertext text was not base64, or plaintext was not UTF-8.
    #[error("malformed ciphertext text: {0}")]
    Decoding(String),
}

impl CryptoError {
    /// Returns `true` if the input was malformed rather than cryptographically invalid.
    ///
    /// Malformed input (bad base64, non UTF-8 plaintext) is a decoding error, while
    /// input that decodes but was not produced by the current key is a crypto error.
    #[inline]
    #[must_use]
    pub fn is_decoding(&self) -> bool {
        matches!(self, Self::Decoding(_))
    }
}
