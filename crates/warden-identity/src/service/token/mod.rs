//! Signed access tokens.
//!
//! Tokens are HS256 JWTs whose subject is a session id and which carry the
//! user's id and role. [`TokenSigner`] issues them; [`TokenVerifier`] checks
//! the signature first and then the token's age against its policy.

mod claims;
mod signer;
mod verifier;

pub use claims::{AuthClaims, TokenUser};
pub use signer::TokenSigner;
pub use verifier::TokenVerifier;
