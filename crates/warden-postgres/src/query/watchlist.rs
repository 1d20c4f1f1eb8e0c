//! Read-only watchlist queries.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Watchlist, WatchlistMember};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for reading the watchlists of an account.
pub trait WatchlistRepository {
    /// Lists the watchlists of an account, oldest first, each with its
    /// members in the order they were added.
    fn list_account_watchlists(
        &mut self,
        account_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<(Watchlist, Vec<WatchlistMember>)>>> + Send;
}

impl WatchlistRepository for PgConnection {
    async fn list_account_watchlists(
        &mut self,
        account_id: Uuid,
    ) -> PgResult<Vec<(Watchlist, Vec<WatchlistMember>)>> {
        use schema::{stocks, watchlist_members, watchlists};

        let lists: Vec<Watchlist> = watchlists::table
            .filter(watchlists::account_id.eq(account_id))
            .order((watchlists::created_at.asc(), watchlists::id.asc()))
            .select(Watchlist::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        if lists.is_empty() {
            return Ok(Vec::new());
        }

        let list_ids: Vec<Uuid> = lists.iter().map(|list| list.id).collect();
        let members: Vec<WatchlistMember> = watchlist_members::table
            .inner_join(stocks::table)
            .filter(watchlist_members::watchlist_id.eq_any(list_ids))
            .order(watchlist_members::created_at.asc())
            .select((
                watchlist_members::watchlist_id,
                stocks::symbol,
                stocks::name,
            ))
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(lists
            .into_iter()
            .map(|list| {
                let list_members = members
                    .iter()
                    .filter(|member| member.watchlist_id == list.id)
                    .cloned()
                    .collect();
                (list, list_members)
            })
            .collect())
    }
}
