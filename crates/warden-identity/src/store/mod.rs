//! Account and session storage contracts.
//!
//! The identity services are generic over [`AccountStore`] and
//! [`SessionStore`]. Two implementations ship with the crate: [`PgClient`]
//! persists to PostgreSQL, [`MemoryStore`] keeps everything in process.
//!
//! [`PgClient`]: warden_postgres::PgClient

mod memory;
mod postgres;

use uuid::Uuid;

pub use self::memory::MemoryStore;
use crate::Result;
use crate::model::{Account, Session, Watchlist};

/// Lookup and persistence of accounts.
pub trait AccountStore: Send + Sync {
    /// Finds an account by user id.
    ///
    /// Fails with [`ErrorKind::NotFound`] if no live account has the id.
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    fn find_account(&self, id: Uuid) -> impl Future<Output = Result<Account>> + Send;

    /// Finds an account by email address.
    ///
    /// Fails with [`ErrorKind::NotFound`] if no live account has the email.
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    fn find_account_by_email(&self, email: &str) -> impl Future<Output = Result<Account>> + Send;

    /// Inserts the account, or replaces the stored one with the same id.
    ///
    /// Watchlists on the account's user are not stored. Fails with
    /// [`ErrorKind::Conflict`] if another live account owns the email.
    ///
    /// [`ErrorKind::Conflict`]: crate::ErrorKind::Conflict
    fn save_account(&self, account: &Account) -> impl Future<Output = Result<()>> + Send;

    /// Deletes an account and its credentials.
    ///
    /// Fails with [`ErrorKind::NotFound`] if no live account has the id.
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    fn delete_account(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;

    /// Lists the watchlists of a user, oldest first.
    fn find_watchlists(&self, user_id: Uuid) -> impl Future<Output = Result<Vec<Watchlist>>> + Send;
}

/// Lookup and persistence of refreshable sessions.
pub trait SessionStore: Send + Sync {
    /// Stores a new session.
    fn save_session(&self, session: &Session) -> impl Future<Output = Result<()>> + Send;

    /// Finds a session by id.
    ///
    /// Fails with [`ErrorKind::NotFound`] if the session does not exist or
    /// has been deleted.
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    fn find_session(&self, id: Uuid) -> impl Future<Output = Result<Session>> + Send;

    /// Deletes a session so it can no longer be found or refreshed.
    ///
    /// Fails with [`ErrorKind::NotFound`] if the session does not exist or
    /// has already been deleted.
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    fn delete_session(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send;

    /// Deletes `old_id` and stores `new_session` as one atomic step.
    ///
    /// Fails with [`ErrorKind::NotFound`], storing nothing, if `old_id` was
    /// already deleted. Of two concurrent rotations of the same session, at
    /// most one succeeds.
    ///
    /// [`ErrorKind::NotFound`]: crate::ErrorKind::NotFound
    fn rotate_session(
        &self,
        old_id: Uuid,
        new_session: &Session,
    ) -> impl Future<Output = Result<()>> + Send;
}
