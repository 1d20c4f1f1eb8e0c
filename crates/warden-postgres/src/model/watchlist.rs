//! Watchlist read models.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::watchlists;

/// Watchlist row owned by an account.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = watchlists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Watchlist {
    /// Watchlist identifier.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// Display name.
    pub name: String,
    /// Timestamp when the watchlist was created.
    pub created_at: Timestamp,
}

/// A stock on a watchlist, joined with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct WatchlistMember {
    /// Watchlist the stock belongs to.
    pub watchlist_id: Uuid,
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    pub name: String,
}
