//! Password hashing and token signing keys.

mod password_hasher;
mod session_keys;

pub use password_hasher::PasswordHasher;
pub(crate) use session_keys::SIGNING_ALGORITHM;
pub use session_keys::SessionKeys;
