//! Login, refresh and account orchestration.

use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use super::IdentityConfig;
use super::credentials::CredentialService;
use super::token::{AuthClaims, TokenSigner, TokenUser, TokenVerifier};
use crate::model::{Account, AuthToken, Credentials, PasswordChange, Role, Session, User};
use crate::store::{AccountStore, SessionStore};
use crate::tracing_targets::TRACING_TARGET_SESSIONS as TRACING_TARGET;
use crate::{Error, ErrorKind, Result};

/// Issues, refreshes and admits access tokens, and manages the accounts
/// they are issued for.
///
/// Each successful login or refresh produces a new [`Session`]. A refresh
/// consumes the session it was called with, so a refresh token works once.
#[derive(Debug, Clone)]
pub struct SessionManager<A, S> {
    credentials: CredentialService<A>,
    sessions: S,
    signer: TokenSigner,
    strict: TokenVerifier,
    lenient: TokenVerifier,
    session_lifetime: SignedDuration,
}

impl<A, S> SessionManager<A, S>
where
    A: AccountStore,
    S: SessionStore,
{
    /// Creates the manager from the identity configuration.
    pub fn new(config: &IdentityConfig, accounts: A, sessions: S) -> Result<Self> {
        let keys = config.session_keys()?;

        Ok(Self {
            credentials: CredentialService::new(config, accounts)?,
            sessions,
            signer: TokenSigner::new(keys.clone(), config.access_token_lifetime()),
            strict: TokenVerifier::strict(keys.clone(), config.access_token_lifetime()),
            lenient: TokenVerifier::lenient(keys, config.session_lifetime()),
            session_lifetime: config.session_lifetime(),
        })
    }

    /// Returns the credential service.
    #[inline]
    pub fn credentials(&self) -> &CredentialService<A> {
        &self.credentials
    }

    fn accounts(&self) -> &A {
        self.credentials.accounts()
    }

    /// Creates an account with role [`Role::User`].
    ///
    /// Fails with [`ErrorKind::Conflict`] if the email is already registered.
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, credentials: &Credentials) -> Result<User> {
        match self.accounts().find_account_by_email(&credentials.email).await {
            Ok(_) => return Err(Error::conflict("User already exists")),
            Err(e) if e.is(ErrorKind::NotFound) => {}
            Err(e) => return Err(e),
        }

        let account = Account {
            user: User::new(&credentials.email),
            credentials: self.credentials.create(credentials)?,
        };
        self.accounts().save_account(&account).await?;

        tracing::info!(
            target: TRACING_TARGET,
            user_id = %account.id(),
            "Account registered"
        );

        Ok(account.user)
    }

    /// Checks the credentials and opens a new session.
    ///
    /// A wrong password and an unknown email both fail with
    /// [`ErrorKind::Unauthorized`]. No session is stored on failure.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken> {
        let account = self
            .credentials
            .verify_account(credentials)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidCredentials | ErrorKind::NotFound => {
                    Error::unauthorized("Invalid email or password")
                }
                _ => e,
            })?;

        self.open_session(account.user).await
    }

    /// Exchanges a token and its refresh token for a new pair.
    ///
    /// The token may be expired, but no older than the session lifetime. The
    /// session it names is revoked and replaced in one step.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Unauthorized`] if the token fails verification
    /// - [`ErrorKind::Forbidden`] if the session is missing, revoked, too old,
    ///   belongs to someone else, or the refresh token does not match
    #[tracing::instrument(skip_all)]
    pub async fn refresh_token(&self, token: &str, refresh_token: &str) -> Result<AuthToken> {
        let claims = self.lenient.verify(token).map_err(|e| {
            Error::unauthorized("Token cannot be refreshed").with_source(e)
        })?;

        let session = match self.sessions.find_session(claims.session_id).await {
            Ok(session) => session,
            Err(e) if e.is(ErrorKind::NotFound) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    session_id = %claims.session_id,
                    "Refresh of an unknown session"
                );
                return Err(Error::forbidden("Session cannot be refreshed"));
            }
            Err(e) => return Err(e),
        };

        if let Some(reason) = self.refusal(&claims, &session, refresh_token, Timestamp::now()) {
            tracing::warn!(
                target: TRACING_TARGET,
                session_id = %session.id,
                user_id = %session.user_id,
                reason,
                "Refresh refused"
            );
            return Err(Error::forbidden("Session cannot be refreshed"));
        }

        let user = self.accounts().find_account(session.user_id).await?.user;
        let next = Session::new(user.id);
        let token = self.signer.sign(next.id, TokenUser::from(&user))?;

        match self.sessions.rotate_session(session.id, &next).await {
            Ok(()) => {}
            Err(e) if e.is(ErrorKind::NotFound) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    session_id = %session.id,
                    "Session was refreshed concurrently"
                );
                return Err(Error::forbidden("Session cannot be refreshed"));
            }
            Err(e) => return Err(e),
        }

        tracing::info!(
            target: TRACING_TARGET,
            user_id = %user.id,
            old_session_id = %session.id,
            session_id = %next.id,
            "Session refreshed"
        );

        Ok(AuthToken {
            token,
            refresh_token: next.refresh_token,
            user,
        })
    }

    /// Returns why a session may not be refreshed, if it may not.
    fn refusal(
        &self,
        claims: &AuthClaims,
        session: &Session,
        refresh_token: &str,
        now: Timestamp,
    ) -> Option<&'static str> {
        if claims.user.role != Role::User {
            Some("role cannot refresh")
        } else if claims.user.id != session.user_id {
            Some("user does not own the session")
        } else if !session.active {
            Some("session is inactive")
        } else if session.is_older_than(self.session_lifetime, now) {
            Some("session is too old")
        } else if session.refresh_token != refresh_token {
            Some("refresh token does not match")
        } else {
            None
        }
    }

    /// Issues a token for a new anonymous user.
    ///
    /// Nothing is persisted, and the empty refresh token can never be used.
    #[tracing::instrument(skip_all)]
    pub fn anonymous_token(&self) -> Result<AuthToken> {
        let user = User::anonymous();
        let token = self.signer.sign(Uuid::new_v4(), TokenUser::from(&user))?;

        tracing::debug!(target: TRACING_TARGET, user_id = %user.id, "Anonymous token issued");

        Ok(AuthToken {
            token,
            refresh_token: String::new(),
            user,
        })
    }

    /// Verifies a token presented with a request.
    ///
    /// Fails with [`ErrorKind::InvalidSignature`] or
    /// [`ErrorKind::ExpiredToken`].
    pub fn admit(&self, token: &str) -> Result<AuthClaims> {
        self.strict.verify(token)
    }

    /// Replaces the password of the account owning `change.old.email`.
    ///
    /// Outstanding sessions stay valid.
    #[tracing::instrument(skip_all)]
    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        if !change.is_confirmed() {
            return Err(Error::bad_request("Passwords do not match"));
        }

        let stored = self
            .credentials
            .change_password(&change.new, &change.old)
            .await?;

        let mut account = self.accounts().find_account_by_email(&stored.email).await?;
        account.credentials = stored;
        self.accounts().save_account(&account).await?;

        tracing::info!(target: TRACING_TARGET, user_id = %account.id(), "Password changed");
        Ok(())
    }

    /// Changes the login email of a user.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn change_email(&self, user_id: Uuid, email: &str) -> Result<()> {
        let mut account = self.accounts().find_account(user_id).await?;
        account.user.email = email.to_owned();
        account.credentials.email = email.to_owned();
        self.accounts().save_account(&account).await?;

        tracing::info!(target: TRACING_TARGET, "Email changed");
        Ok(())
    }

    /// Returns a user with its watchlists.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let mut user = self.accounts().find_account(user_id).await?.user;
        user.watchlists = self.accounts().find_watchlists(user_id).await?;
        Ok(user)
    }

    /// Deletes a user and its credentials.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        self.accounts().delete_account(user_id).await?;
        tracing::info!(target: TRACING_TARGET, "Account deleted");
        Ok(())
    }

    async fn open_session(&self, user: User) -> Result<AuthToken> {
        let session = Session::new(user.id);
        let token = self.signer.sign(session.id, TokenUser::from(&user))?;
        self.sessions.save_session(&session).await?;

        tracing::info!(
            target: TRACING_TARGET,
            user_id = %user.id,
            session_id = %session.id,
            "Session opened"
        );

        Ok(AuthToken {
            token,
            refresh_token: session.refresh_token,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Barrier;

    use super::*;
    use crate::model::Watchlist;
    use crate::service::test_config;
    use crate::store::MemoryStore;

    type Manager = SessionManager<MemoryStore, MemoryStore>;

    fn ada() -> Credentials {
        Credentials::new("ada@example.com", "correct horse")
    }

    async fn manager_with_ada() -> anyhow::Result<(Manager, MemoryStore, User)> {
        let store = MemoryStore::new();
        let manager = SessionManager::new(&test_config(), store.clone(), store.clone())?;
        let user = manager.register(&ada()).await?;
        Ok((manager, store, user))
    }

    /// Stores `session` and signs a token naming it.
    async fn token_for(
        manager: &Manager,
        store: &MemoryStore,
        session: &Session,
        role: Role,
    ) -> anyhow::Result<String> {
        store.save_session(session).await?;
        let user = TokenUser {
            id: session.user_id,
            role,
        };
        Ok(manager.signer.sign(session.id, user)?)
    }

    #[tokio::test]
    async fn authenticate_opens_a_session() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;

        let token = manager.authenticate(&ada()).await?;
        assert_eq!(token.user, user);
        assert_eq!(token.refresh_token.len(), 43);

        let claims = manager.admit(&token.token)?;
        assert_eq!(claims.user, TokenUser::from(&user));

        let session = store.find_session(claims.session_id).await?;
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.refresh_token, token.refresh_token);
        Ok(())
    }

    #[tokio::test]
    async fn failed_authentication_is_unauthorized() -> anyhow::Result<()> {
        let (manager, store, _) = manager_with_ada().await?;

        let wrong_password = manager
            .authenticate(&Credentials::new("ada@example.com", "battery staple"))
            .await
            .unwrap_err();
        let unknown_email = manager
            .authenticate(&Credentials::new("bob@example.com", "correct horse"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.kind(), ErrorKind::Unauthorized);
        assert_eq!(unknown_email.kind(), ErrorKind::Unauthorized);
        assert_eq!(store.session_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_existing_email() -> anyhow::Result<()> {
        let (manager, _, _) = manager_with_ada().await?;

        let error = manager.register(&ada()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rotates_the_session() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;
        let first = manager.authenticate(&ada()).await?;
        let first_claims = manager.admit(&first.token)?;

        let second = manager
            .refresh_token(&first.token, &first.refresh_token)
            .await?;
        let second_claims = manager.admit(&second.token)?;

        assert_eq!(second.user.id, user.id);
        assert_ne!(second_claims.session_id, first_claims.session_id);
        assert_ne!(second.refresh_token, first.refresh_token);
        assert!(store.find_session(first_claims.session_id).await.is_err());
        assert_eq!(store.session_count().await, 1);

        let replay = manager
            .refresh_token(&first.token, &first.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(replay.kind(), ErrorKind::Forbidden);
        Ok(())
    }

    /// Session store whose lookups wait until `gate` lets every caller
    /// through together, and which counts rotation attempts.
    #[derive(Clone)]
    struct GatedSessions {
        inner: MemoryStore,
        gate: Arc<Barrier>,
        rotations: Arc<AtomicUsize>,
    }

    impl SessionStore for GatedSessions {
        async fn save_session(&self, session: &Session) -> Result<()> {
            self.inner.save_session(session).await
        }

        async fn find_session(&self, id: Uuid) -> Result<Session> {
            let session = self.inner.find_session(id).await;
            self.gate.wait().await;
            session
        }

        async fn delete_session(&self, id: Uuid) -> Result<()> {
            self.inner.delete_session(id).await
        }

        async fn rotate_session(&self, old_id: Uuid, new_session: &Session) -> Result<()> {
            self.rotations.fetch_add(1, Ordering::SeqCst);
            self.inner.rotate_session(old_id, new_session).await
        }
    }

    #[tokio::test]
    async fn concurrent_refreshes_succeed_once() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let sessions = GatedSessions {
            inner: store.clone(),
            gate: Arc::new(Barrier::new(2)),
            rotations: Arc::default(),
        };
        let manager = SessionManager::new(&test_config(), store.clone(), sessions.clone())?;
        manager.register(&ada()).await?;
        let token = manager.authenticate(&ada()).await?;

        let (a, b) = tokio::join!(
            manager.refresh_token(&token.token, &token.refresh_token),
            manager.refresh_token(&token.token, &token.refresh_token),
        );

        // Both refreshes passed validation, so the loser failed at rotation.
        assert_eq!(sessions.rotations.load(Ordering::SeqCst), 2);
        assert!(a.is_ok() ^ b.is_ok());
        let error = a.err().or(b.err()).map(|e| e.kind());
        assert_eq!(error, Some(ErrorKind::Forbidden));
        assert_eq!(store.session_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_wrong_refresh_token() -> anyhow::Result<()> {
        let (manager, _, _) = manager_with_ada().await?;
        let token = manager.authenticate(&ada()).await?;

        let error = manager
            .refresh_token(&token.token, "not-the-refresh-token")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);

        manager
            .refresh_token(&token.token, &token.refresh_token)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_inactive_session() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;
        let mut session = Session::new(user.id);
        session.active = false;
        let token = token_for(&manager, &store, &session, Role::User).await?;

        let error = manager
            .refresh_token(&token, &session.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_session_older_than_a_year() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;
        let mut session = Session::new(user.id);
        session.created_at = Timestamp::now() - SignedDuration::from_hours(366 * 24);
        let token = token_for(&manager, &store, &session, Role::User).await?;

        let error = manager
            .refresh_token(&token, &session.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_another_users_session() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;
        let session = Session::new(user.id);
        store.save_session(&session).await?;

        let other = TokenUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        let token = manager.signer.sign(session.id, other)?;

        let error = manager
            .refresh_token(&token, &session.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_anonymous_tokens() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;

        let anonymous = manager.anonymous_token()?;
        let error = manager
            .refresh_token(&anonymous.token, &anonymous.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);

        let session = Session::new(user.id);
        let token = token_for(&manager, &store, &session, Role::Anonymous).await?;
        let error = manager
            .refresh_token(&token, &session.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_forged_token() -> anyhow::Result<()> {
        let (manager, _, _) = manager_with_ada().await?;
        let token = manager.authenticate(&ada()).await?;

        let mut config = test_config();
        config.token_secret = "another-token-secret".to_owned();
        let forger = SessionManager::new(&config, MemoryStore::new(), MemoryStore::new())?;
        let claims = manager.admit(&token.token)?;
        let forged = forger.signer.sign(claims.session_id, claims.user)?;

        let error = manager
            .refresh_token(&forged, &token.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_token_is_not_persisted() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let manager = SessionManager::new(&test_config(), store.clone(), store.clone())?;

        let token = manager.anonymous_token()?;
        let claims = manager.admit(&token.token)?;

        assert!(token.refresh_token.is_empty());
        assert!(token.user.email.is_empty());
        assert_eq!(token.user.role, Role::Anonymous);
        assert_eq!(claims.user, TokenUser::from(&token.user));
        assert_eq!(token.user.watchlists.len(), 1);

        let symbols: Vec<_> = token.user.watchlists[0]
            .stocks
            .iter()
            .map(|stock| stock.symbol.as_str())
            .collect();
        assert_eq!(symbols, ["TSLA", "AAPL", "AMZN", "NFLX", "FB"]);
        assert_eq!(store.session_count().await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn admit_rejects_expired_token() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;
        let session = Session::new(user.id);
        store.save_session(&session).await?;

        let issued_at = Timestamp::now() - SignedDuration::from_hours(25);
        let token = manager
            .signer
            .sign_at(session.id, TokenUser::from(&user), issued_at)?;

        let error = manager.admit(&token).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ExpiredToken);

        // The lenient policy still accepts it for refresh.
        manager
            .refresh_token(&token, &session.refresh_token)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn change_password_then_authenticate() -> anyhow::Result<()> {
        let (manager, _, _) = manager_with_ada().await?;

        let mismatch = PasswordChange {
            new: "battery staple".to_owned(),
            repeated: "battery stable".to_owned(),
            old: ada(),
        };
        let error = manager.change_password(&mismatch).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);

        let change = PasswordChange {
            new: "battery staple".to_owned(),
            repeated: "battery staple".to_owned(),
            old: ada(),
        };
        manager.change_password(&change).await?;

        let error = manager.authenticate(&ada()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);

        manager
            .authenticate(&Credentials::new("ada@example.com", "battery staple"))
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn change_email_moves_the_login() -> anyhow::Result<()> {
        let (manager, _, user) = manager_with_ada().await?;

        manager.change_email(user.id, "ada@lovelace.dev").await?;

        let token = manager
            .authenticate(&Credentials::new("ada@lovelace.dev", "correct horse"))
            .await?;
        assert_eq!(token.user.email, "ada@lovelace.dev");

        let error = manager.authenticate(&ada()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
        Ok(())
    }

    #[tokio::test]
    async fn get_and_delete_user() -> anyhow::Result<()> {
        let (manager, store, user) = manager_with_ada().await?;
        store
            .insert_watchlist(user.id, Watchlist::default_watchlist())
            .await;

        let loaded = manager.get_user(user.id).await?;
        assert_eq!(loaded.email, "ada@example.com");
        assert_eq!(loaded.watchlists.len(), 1);

        manager.delete_user(user.id).await?;

        let error = manager.get_user(user.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        let error = manager.delete_user(user.id).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        Ok(())
    }
}
