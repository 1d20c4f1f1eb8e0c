use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, SessionStore};
use crate::model::{Account, Session, Watchlist};
use crate::tracing_targets::TRACING_TARGET_STORE as TRACING_TARGET;
use crate::{Error, Result};

/// In-process account and session store.
///
/// Cloning is cheap; all clones share the same data. Every operation holds
/// the lock for its whole duration, so session rotation is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    accounts: HashMap<Uuid, Account>,
    sessions: HashMap<Uuid, Session>,
    watchlists: HashMap<Uuid, Vec<Watchlist>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a watchlist to a user's lists.
    pub async fn insert_watchlist(&self, user_id: Uuid, watchlist: Watchlist) {
        let mut inner = self.inner.write().await;
        let lists = inner.watchlists.entry(user_id).or_default();
        lists.push(watchlist);
        lists.sort_by_key(|list| list.created_at);
    }

    /// Returns the number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}

impl AccountStore for MemoryStore {
    async fn find_account(&self, id: Uuid) -> Result<Account> {
        self.inner
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("No such account"))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account> {
        self.inner
            .read()
            .await
            .accounts
            .values()
            .find(|account| account.credentials.email == email)
            .cloned()
            .ok_or_else(|| Error::not_found("No such account"))
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        let mut inner = self.inner.write().await;

        let email_taken = inner.accounts.values().any(|other| {
            other.id() != account.id() && other.credentials.email == account.credentials.email
        });
        if email_taken {
            tracing::debug!(
                target: TRACING_TARGET,
                account_id = %account.id(),
                "Email address is already in use"
            );
            return Err(Error::conflict("Email address is already in use"));
        }

        let mut stored = account.clone();
        stored.user.watchlists.clear();
        inner.accounts.insert(account.id(), stored);
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("No such account"))
    }

    async fn find_watchlists(&self, user_id: Uuid) -> Result<Vec<Watchlist>> {
        let inner = self.inner.read().await;
        Ok(inner.watchlists.get(&user_id).cloned().unwrap_or_default())
    }
}

impl SessionStore for MemoryStore {
    async fn save_session(&self, session: &Session) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Session> {
        self.inner
            .read()
            .await
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("No such session"))
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("No such session"))
    }

    async fn rotate_session(&self, old_id: Uuid, new_session: &Session) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.sessions.remove(&old_id).is_none() {
            return Err(Error::not_found("No such session"));
        }

        inner.sessions.insert(new_session.id, new_session.clone());
        Ok(())
    }
}
