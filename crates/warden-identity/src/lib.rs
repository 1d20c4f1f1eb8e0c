#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod model;
pub mod service;
pub mod store;
mod utility;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::model::{
    Account, AuthToken, Credentials, PasswordChange, Role, Session, Stock, StoredCredentials,
    User, Watchlist,
};
pub use crate::service::{
    AuthClaims, CredentialService, IdentityConfig, IdentityConfigBuilder, SessionManager,
    TokenSigner, TokenUser, TokenVerifier,
};
pub use crate::store::{AccountStore, MemoryStore, SessionStore};
pub use crate::utility::tracing_targets;
