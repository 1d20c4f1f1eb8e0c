use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jiff::{SignedDuration, Timestamp};
use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Uuid;

/// Number of random bytes in a refresh token.
const REFRESH_TOKEN_BYTES: usize = 32;

/// A refreshable login session.
///
/// The id doubles as the subject of the session's access token. The refresh
/// token is single-use: refreshing revokes the session and creates a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Session identifier.
    pub id: Uuid,
    /// The user the session was issued to.
    pub user_id: Uuid,
    /// Single-use refresh token.
    pub refresh_token: String,
    /// Whether the session can still be refreshed.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl Session {
    /// Mints an active session with a random id and refresh token.
    pub fn new(user_id: Uuid) -> Self {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_token: URL_SAFE_NO_PAD.encode(bytes),
            active: true,
            created_at: Timestamp::now(),
        }
    }

    /// Returns whether the session is more than `lifetime` old at `now`.
    pub fn is_older_than(&self, lifetime: SignedDuration, now: Timestamp) -> bool {
        now.duration_since(self.created_at) > lifetime
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("refresh_token", &"[REDACTED]")
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_sessions_are_unique() {
        let user_id = Uuid::new_v4();
        let first = Session::new(user_id);
        let second = Session::new(user_id);

        assert!(first.active);
        assert_ne!(first.id, second.id);
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(first.refresh_token.len(), 43);
    }

    #[test]
    fn age_is_measured_from_creation() {
        let mut session = Session::new(Uuid::new_v4());
        let now = Timestamp::now();
        session.created_at = now - SignedDuration::from_hours(2);

        assert!(session.is_older_than(SignedDuration::from_hours(1), now));
        assert!(!session.is_older_than(SignedDuration::from_hours(3), now));
    }

    #[test]
    fn session_exactly_one_lifetime_old_is_not_too_old() {
        let session = Session::new(Uuid::new_v4());
        let lifetime = SignedDuration::from_hours(24 * 365);
        let boundary = session.created_at + lifetime;

        assert!(!session.is_older_than(lifetime, boundary));
        assert!(session.is_older_than(lifetime, boundary + SignedDuration::from_secs(1)));
    }
}
