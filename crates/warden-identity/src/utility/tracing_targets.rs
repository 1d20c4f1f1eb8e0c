//! Centralized tracing target constants for structured logging.
//!
//! Using consistent targets enables fine-grained control over log output
//! via tracing subscriber filters.

/// Credential creation, verification and password changes.
pub const TRACING_TARGET_CREDENTIALS: &str = "warden_identity::credentials";

/// Session lifecycle: login, refresh, anonymous tokens and account operations.
pub const TRACING_TARGET_SESSIONS: &str = "warden_identity::sessions";

/// Access token signing and verification.
pub const TRACING_TARGET_TOKENS: &str = "warden_identity::tokens";

/// Password hashing and verification operations.
pub const TRACING_TARGET_PASSWORD_HASHER: &str = "warden_identity::password_hasher";

/// Token signing key management.
pub const TRACING_TARGET_SESSION_KEYS: &str = "warden_identity::session_keys";

/// Account and session store adapters.
pub const TRACING_TARGET_STORE: &str = "warden_identity::store";
