//! Account session model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::account_sessions;

/// Session row backing a refresh token.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = account_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccountSession {
    /// Session identifier, also the subject of its access token.
    pub id: Uuid,
    /// Account the session belongs to.
    pub account_id: Uuid,
    /// Single-use refresh token; cleared on revocation.
    pub refresh_token: Option<String>,
    /// Whether the session can still be refreshed.
    pub is_active: bool,
    /// Timestamp when the session was created.
    pub created_at: Timestamp,
    /// Timestamp when the session was revoked.
    pub deleted_at: Option<Timestamp>,
}

/// Data for creating a session.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = account_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAccountSession {
    /// Session identifier.
    pub id: Uuid,
    /// Account the session belongs to.
    pub account_id: Uuid,
    /// Single-use refresh token.
    pub refresh_token: String,
    /// Whether the session can be refreshed.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}
