//! Account model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::accounts;

/// Account row holding a user's identity and encrypted credentials.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    /// Unique account identifier, shared with the user it belongs to.
    pub id: Uuid,
    /// Email address used to log in.
    pub email_address: String,
    /// Encrypted password hash; wiped when the account is deleted.
    pub password_hash: Option<String>,
    /// Encrypted password salt; wiped when the account is deleted.
    pub password_salt: Option<String>,
    /// Role name of the account holder.
    pub role: String,
    /// Whether the account is locked.
    pub is_locked: bool,
    /// Timestamp when the account was created.
    pub created_at: Timestamp,
    /// Timestamp of the last account update.
    pub updated_at: Timestamp,
    /// Timestamp when the account was soft-deleted.
    pub deleted_at: Option<Timestamp>,
}

impl Account {
    /// Returns whether the account has been soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data for creating an account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAccount {
    /// Account identifier, assigned by the caller.
    pub id: Uuid,
    /// Email address used to log in.
    pub email_address: String,
    /// Encrypted password hash.
    pub password_hash: String,
    /// Encrypted password salt.
    pub password_salt: String,
    /// Role name of the account holder.
    pub role: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// Changes applied when an existing account is saved again.
///
/// Saving over a soft-deleted row restores it: the row is unlocked and
/// `deleted_at` is cleared.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateAccount {
    /// Email address used to log in.
    pub email_address: String,
    /// Encrypted password hash.
    pub password_hash: String,
    /// Encrypted password salt.
    pub password_salt: String,
    /// Role name of the account holder.
    pub role: String,
    /// Always `false`; only deletion locks an account.
    pub is_locked: bool,
    /// Update timestamp.
    pub updated_at: Timestamp,
    /// Always `None`, written as `NULL`.
    #[diesel(treat_none_as_null = true)]
    pub deleted_at: Option<Timestamp>,
}

impl From<&NewAccount> for UpdateAccount {
    fn from(account: &NewAccount) -> Self {
        Self {
            email_address: account.email_address.clone(),
            password_hash: account.password_hash.clone(),
            password_salt: account.password_salt.clone(),
            role: account.role.clone(),
            is_locked: false,
            updated_at: Timestamp::from(jiff::Timestamp::now()),
            deleted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saving_again_restores_a_deleted_row() {
        let account = NewAccount {
            id: Uuid::new_v4(),
            email_address: "ada@example.com".to_owned(),
            password_hash: "encrypted-hash".to_owned(),
            password_salt: "encrypted-salt".to_owned(),
            role: "user".to_owned(),
            created_at: Timestamp::from(jiff::Timestamp::now()),
        };

        let changes = UpdateAccount::from(&account);
        assert!(!changes.is_locked);
        assert!(changes.deleted_at.is_none());
        assert_eq!(changes.password_hash, "encrypted-hash");
    }
}
