//! Repository traits implemented on [`PgConnection`].
//!
//! [`PgConnection`]: crate::PgConnection

mod account;
mod account_session;
mod watchlist;

pub use account::AccountRepository;
pub use account_session::AccountSessionRepository;
pub use watchlist::WatchlistRepository;
