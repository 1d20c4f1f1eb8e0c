//! Identity domain model.

mod credentials;
mod session;
mod token;
mod user;
mod watchlist;

pub use credentials::{Credentials, PasswordChange, StoredCredentials};
pub use session::Session;
pub use token::AuthToken;
pub use user::{Account, Role, User};
pub use watchlist::{Stock, Watchlist};
