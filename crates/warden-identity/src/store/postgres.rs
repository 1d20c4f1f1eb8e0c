//! [`AccountStore`] and [`SessionStore`] backed by PostgreSQL.

use jiff::Timestamp;
use uuid::Uuid;
use warden_postgres::PgClient;
use warden_postgres::model::{
    Account as AccountRow, AccountSession, NewAccount, NewAccountSession,
    Watchlist as WatchlistRow, WatchlistMember,
};
use warden_postgres::query::{AccountRepository, AccountSessionRepository, WatchlistRepository};

use super::{AccountStore, SessionStore};
use crate::model::{Account, Role, Session, Stock, StoredCredentials, User, Watchlist};
use crate::tracing_targets::TRACING_TARGET_STORE as TRACING_TARGET;
use crate::{Error, Result};

impl AccountStore for PgClient {
    async fn find_account(&self, id: Uuid) -> Result<Account> {
        let mut conn = self.get_connection().await?;
        conn.find_account_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("No such account"))
            .and_then(account_from_row)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Account> {
        let mut conn = self.get_connection().await?;
        conn.find_account_by_email(email)
            .await?
            .ok_or_else(|| Error::not_found("No such account"))
            .and_then(account_from_row)
    }

    async fn save_account(&self, account: &Account) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.upsert_account(NewAccount {
            id: account.user.id,
            email_address: account.credentials.email.clone(),
            password_hash: account.credentials.password.clone(),
            password_salt: account.credentials.salt.clone(),
            role: account.user.role.to_string(),
            created_at: account.user.created_at.into(),
        })
        .await?;

        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> Result<()> {
        let mut conn = self.get_connection().await?;
        if !conn.delete_account(id).await? {
            return Err(Error::not_found("No such account"));
        }

        Ok(())
    }

    async fn find_watchlists(&self, user_id: Uuid) -> Result<Vec<Watchlist>> {
        let mut conn = self.get_connection().await?;
        let lists = conn.list_account_watchlists(user_id).await?;
        Ok(lists.into_iter().map(watchlist_from_rows).collect())
    }
}

impl SessionStore for PgClient {
    async fn save_session(&self, session: &Session) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.create_account_session(new_session_row(session)).await?;
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Session> {
        let mut conn = self.get_connection().await?;
        conn.find_active_account_session(id)
            .await?
            .ok_or_else(|| Error::not_found("No such session"))
            .and_then(session_from_row)
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        let mut conn = self.get_connection().await?;
        if !conn.revoke_account_session(id).await? {
            return Err(Error::not_found("No such session"));
        }

        Ok(())
    }

    async fn rotate_session(&self, old_id: Uuid, new_session: &Session) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let rotated = conn
            .rotate_account_session(old_id, new_session_row(new_session))
            .await?;

        if rotated.is_none() {
            return Err(Error::not_found("No such session"));
        }

        Ok(())
    }
}

fn account_from_row(row: AccountRow) -> Result<Account> {
    let role = row.role.parse::<Role>().map_err(|e| {
        tracing::error!(
            target: TRACING_TARGET,
            account_id = %row.id,
            role = %row.role,
            "Stored account has an unknown role"
        );
        Error::internal("Stored account has an unknown role").with_source(e)
    })?;

    let (Some(password), Some(salt)) = (row.password_hash, row.password_salt) else {
        tracing::error!(
            target: TRACING_TARGET,
            account_id = %row.id,
            "Stored account has no credentials"
        );
        return Err(Error::storage("Stored account has no credentials"));
    };

    Ok(Account {
        user: User {
            id: row.id,
            email: row.email_address.clone(),
            role,
            watchlists: Vec::new(),
            created_at: Timestamp::from(row.created_at),
        },
        credentials: StoredCredentials {
            email: row.email_address,
            password,
            salt,
        },
    })
}

fn session_from_row(row: AccountSession) -> Result<Session> {
    let Some(refresh_token) = row.refresh_token else {
        return Err(Error::storage("Active session has no refresh token"));
    };

    Ok(Session {
        id: row.id,
        user_id: row.account_id,
        refresh_token,
        active: row.is_active,
        created_at: Timestamp::from(row.created_at),
    })
}

fn new_session_row(session: &Session) -> NewAccountSession {
    NewAccountSession {
        id: session.id,
        account_id: session.user_id,
        refresh_token: session.refresh_token.clone(),
        is_active: session.active,
        created_at: session.created_at.into(),
    }
}

fn watchlist_from_rows((list, members): (WatchlistRow, Vec<WatchlistMember>)) -> Watchlist {
    Watchlist {
        id: list.id,
        name: list.name,
        stocks: members
            .into_iter()
            .map(|member| Stock::new(member.symbol, member.name))
            .collect(),
        created_at: Timestamp::from(list.created_at),
    }
}
