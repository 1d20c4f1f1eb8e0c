//! Account session repository for refresh-token sessions.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{AccountSession, NewAccountSession};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for account session database operations.
///
/// Revoked sessions are kept as rows with `is_active = false` and no refresh
/// token, and are never returned by lookups.
pub trait AccountSessionRepository {
    /// Creates a new session.
    fn create_account_session(
        &mut self,
        new_session: NewAccountSession,
    ) -> impl Future<Output = PgResult<AccountSession>> + Send;

    /// Finds an active session by its ID.
    fn find_active_account_session(
        &mut self,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<AccountSession>>> + Send;

    /// Revokes an active session.
    ///
    /// Returns `false` if no active session has the ID.
    fn revoke_account_session(
        &mut self,
        session_id: Uuid,
    ) -> impl Future<Output = PgResult<bool>> + Send;

    /// Revokes `old_session_id` and creates `new_session` in one transaction.
    ///
    /// Returns `None`, without creating anything, if the old session was not
    /// active when the transaction ran.
    fn rotate_account_session(
        &mut self,
        old_session_id: Uuid,
        new_session: NewAccountSession,
    ) -> impl Future<Output = PgResult<Option<AccountSession>>> + Send;
}

/// Revokes an active session and reports whether a row was affected.
async fn revoke(conn: &mut PgConnection, session_id: Uuid) -> PgResult<bool> {
    use schema::account_sessions::{self, dsl};

    let affected = diesel::update(
        account_sessions::table
            .filter(dsl::id.eq(session_id))
            .filter(dsl::is_active.eq(true)),
    )
    .set((
        dsl::refresh_token.eq(None::<String>),
        dsl::is_active.eq(false),
        dsl::deleted_at.eq(Some(jiff_diesel::Timestamp::from(Timestamp::now()))),
    ))
    .execute(conn)
    .await
    .map_err(PgError::from)?;

    Ok(affected > 0)
}

impl AccountSessionRepository for PgConnection {
    async fn create_account_session(
        &mut self,
        new_session: NewAccountSession,
    ) -> PgResult<AccountSession> {
        use schema::account_sessions;

        diesel::insert_into(account_sessions::table)
            .values(&new_session)
            .returning(AccountSession::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn find_active_account_session(
        &mut self,
        session_id: Uuid,
    ) -> PgResult<Option<AccountSession>> {
        use schema::account_sessions::{self, dsl};

        account_sessions::table
            .filter(dsl::id.eq(session_id))
            .filter(dsl::is_active.eq(true))
            .filter(dsl::deleted_at.is_null())
            .select(AccountSession::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn revoke_account_session(&mut self, session_id: Uuid) -> PgResult<bool> {
        revoke(self, session_id).await
    }

    async fn rotate_account_session(
        &mut self,
        old_session_id: Uuid,
        new_session: NewAccountSession,
    ) -> PgResult<Option<AccountSession>> {
        use schema::account_sessions;

        let rotated = self
            .transaction::<_, PgError, _>(|conn| {
                async move {
                    if !revoke(conn, old_session_id).await? {
                        return Ok(None);
                    }

                    let session = diesel::insert_into(account_sessions::table)
                        .values(&new_session)
                        .returning(AccountSession::as_returning())
                        .get_result(conn)
                        .await?;

                    Ok(Some(session))
                }
                .scope_boxed()
            })
            .await?;

        if rotated.is_none() {
            tracing::debug!(
                target: TRACING_TARGET_QUERY,
                session_id = %old_session_id,
                "Session was already revoked, rotation skipped"
            );
        }

        Ok(rotated)
    }
}
