//! Database models for all tables.
//!
//! Each table exposes a queryable row type and, where the repositories write
//! to it, the insertable or changeset types used to do so.

mod account;
mod account_session;
mod watchlist;

pub use account::{Account, NewAccount, UpdateAccount};
pub use account_session::{AccountSession, NewAccountSession};
pub use watchlist::{Watchlist, WatchlistMember};
