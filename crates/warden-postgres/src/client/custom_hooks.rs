//! Connection setup and pool hooks that log connection health.

use std::time::Instant;

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::pg_config::mask_url;
use crate::TRACING_TARGET_CONNECTION;

/// Establishes a connection and logs how long it took, never logging the
/// password in the url.
pub fn setup_callback<C>(addr: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    let url = mask_url(addr);

    async move {
        let started = Instant::now();
        let connection = C::establish(addr).await;
        let elapsed = started.elapsed();

        if let Err(error) = &connection {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                %url,
                ?elapsed,
                %error,
                "Could not connect to the account database"
            );
        } else {
            tracing::debug!(
                target: TRACING_TARGET_CONNECTION,
                %url,
                ?elapsed,
                "Connected to the account database"
            );
        }

        connection
    }
    .boxed()
}

/// Warns when a freshly created connection is already unusable.
pub fn post_create(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::warn!(
            target: TRACING_TARGET_CONNECTION,
            hook = "post_create",
            created_at = ?metrics.created,
            "New connection is broken"
        );
    }

    Ok(())
}

/// Logs broken connections on recycle. The manager evicts them itself.
pub fn post_recycle(conn: &mut AsyncPgConnection, metrics: &Metrics) -> HookResult<PoolError> {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_CONNECTION,
            hook = "post_recycle",
            recycle_count = metrics.recycle_count,
            "Recycled connection is broken"
        );
    } else {
        tracing::trace!(
            target: TRACING_TARGET_CONNECTION,
            hook = "post_recycle",
            recycle_count = metrics.recycle_count,
            "Connection recycled"
        );
    }

    Ok(())
}
