//! Account repository for managing user accounts.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use uuid::Uuid;

use crate::model::{Account, NewAccount, UpdateAccount};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for account database operations.
///
/// Soft-deleted accounts are invisible to every lookup.
pub trait AccountRepository {
    /// Finds a live account by its ID.
    fn find_account_by_id(
        &mut self,
        account_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Account>>> + Send;

    /// Finds a live account by its email address.
    fn find_account_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = PgResult<Option<Account>>> + Send;

    /// Inserts the account, or updates it in place when the ID exists.
    ///
    /// Fails with a unique violation when another live account owns the email.
    fn upsert_account(
        &mut self,
        account: NewAccount,
    ) -> impl Future<Output = PgResult<Account>> + Send;

    /// Soft-deletes an account and wipes its credentials.
    ///
    /// Returns `false` if no live account has the ID.
    fn delete_account(&mut self, account_id: Uuid) -> impl Future<Output = PgResult<bool>> + Send;
}

impl AccountRepository for PgConnection {
    async fn find_account_by_id(&mut self, account_id: Uuid) -> PgResult<Option<Account>> {
        use schema::accounts::{self, dsl};

        accounts::table
            .filter(dsl::id.eq(account_id))
            .filter(dsl::deleted_at.is_null())
            .select(Account::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn find_account_by_email(&mut self, email: &str) -> PgResult<Option<Account>> {
        use schema::accounts::{self, dsl};

        accounts::table
            .filter(dsl::email_address.eq(email))
            .filter(dsl::deleted_at.is_null())
            .select(Account::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)
    }

    async fn upsert_account(&mut self, account: NewAccount) -> PgResult<Account> {
        use schema::accounts::{self, dsl};

        let changes = UpdateAccount::from(&account);
        diesel::insert_into(accounts::table)
            .values(&account)
            .on_conflict(dsl::id)
            .do_update()
            .set(&changes)
            .returning(Account::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn delete_account(&mut self, account_id: Uuid) -> PgResult<bool> {
        use schema::accounts::{self, dsl};

        let now = Timestamp::now();
        let affected = diesel::update(
            accounts::table
                .filter(dsl::id.eq(account_id))
                .filter(dsl::deleted_at.is_null()),
        )
        .set((
            dsl::password_hash.eq(None::<String>),
            dsl::password_salt.eq(None::<String>),
            dsl::is_locked.eq(true),
            dsl::updated_at.eq(jiff_diesel::Timestamp::from(now)),
            dsl::deleted_at.eq(Some(jiff_diesel::Timestamp::from(now))),
        ))
        .execute(self)
        .await
        .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            account_id = %account_id,
            deleted = affected > 0,
            "Account soft-deleted"
        );

        Ok(affected > 0)
    }
}
