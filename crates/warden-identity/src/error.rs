//! Identity error types.
//!
//! Every fallible operation in this crate returns [`Error`], a structured
//! error made of an [`ErrorKind`], a message and an optional source. Callers
//! branch on the kind; the message and source are for logs.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use warden_core::CryptoError;
use warden_postgres::PgError;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for identity operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing identity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The password did not match the stored hash.
    InvalidCredentials,
    /// Authentication failed.
    Unauthorized,
    /// The caller is authenticated but the request is not permitted.
    Forbidden,
    /// The requested account or session does not exist.
    NotFound,
    /// An account with the same email already exists.
    Conflict,
    /// The request was malformed.
    BadRequest,
    /// The token signature or its issuer, audience or claims are invalid.
    InvalidSignature,
    /// The token is older than the verifier permits.
    ExpiredToken,
    /// Encryption or decryption failed.
    Crypto,
    /// Stored text could not be decoded.
    Decoding,
    /// The backing store failed.
    Storage,
    /// Invalid configuration.
    Config,
    /// Internal logic errors.
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::BadRequest => "bad_request",
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredToken => "expired_token",
            Self::Crypto => "crypto",
            Self::Decoding => "decoding",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }

    /// Creates an error of this kind with the given message.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'static, str>>) -> Error {
        Error::new(self, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether this error is of the given kind.
    #[must_use]
    #[inline]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Creates a new invalid credentials error.
    #[inline]
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Password does not match")
    }

    /// Creates a new unauthorized error.
    #[inline]
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Creates a new forbidden error.
    #[inline]
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Creates a new not found error.
    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a new conflict error.
    #[inline]
    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates a new bad request error.
    #[inline]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Creates a new storage error.
    #[inline]
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a new internal error.
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        let kind = if err.is_decoding() {
            ErrorKind::Decoding
        } else {
            ErrorKind::Crypto
        };

        Self::new(kind, err.to_string()).with_source(err)
    }
}

impl From<PgError> for Error {
    fn from(err: PgError) -> Self {
        if err.is_unique_violation() {
            return Self::conflict("Email address is already in use").with_source(err);
        }

        Self::storage("Database operation failed").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_carries_kind_and_message() {
        let error = Error::forbidden("refresh token mismatch");

        assert_eq!(error.kind(), ErrorKind::Forbidden);
        assert_eq!(error.message(), "refresh token mismatch");
        assert_eq!(error.to_string(), "forbidden error: refresh token mismatch");
        assert!(StdError::source(&error).is_none());
    }

    #[test]
    fn crypto_errors_convert_by_class() {
        let decoding = Error::from(CryptoError::Decoding("invalid padding".into()));
        assert_eq!(decoding.kind(), ErrorKind::Decoding);
        assert!(StdError::source(&decoding).is_some());

        let crypto = Error::from(CryptoError::DecryptionFailed);
        assert_eq!(crypto.kind(), ErrorKind::Crypto);
    }

    #[test]
    fn storage_errors_keep_their_source() {
        let error = Error::from(PgError::Config("missing url".into()));

        assert_eq!(error.kind(), ErrorKind::Storage);
        assert!(StdError::source(&error).is_some());
    }
}
