#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Schema migrations compiled into the crate.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

/// Pool construction and client lifecycle.
pub const TRACING_TARGET_CLIENT: &str = "warden_postgres::client";

/// Repository queries.
pub const TRACING_TARGET_QUERY: &str = "warden_postgres::queries";

/// Embedded schema migrations.
pub const TRACING_TARGET_MIGRATION: &str = "warden_postgres::migrations";

/// Connection setup, acquisition and recycling.
pub const TRACING_TARGET_CONNECTION: &str = "warden_postgres::connection";

mod client;
pub mod model;
pub mod query;
mod schema;

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::{DatabaseErrorKind, Error};
pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{
    ConnectionPool, MigrationStatus, PgClient, PgClientMigrationExt, PgConfig, PgConn,
    PgPoolStatus, PooledConnection,
};

pub mod error {
    //! Re-exports of the driver and pool errors wrapped by [`PgError`].
    //!
    //! [`PgError`]: crate::PgError

    /// Boxed error from the migration harness.
    pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

    pub use deadpool::managed::TimeoutType;
    pub use diesel::result::{ConnectionError as DieselConnectionError, Error as DieselError};
    pub use diesel_async::pooled_connection::PoolError as DieselPoolError;
    pub use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;
}

/// Failure of a pool, migration or repository call.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// [`PgConfig`] failed validation.
    #[error("Invalid database configuration: {0}")]
    Config(String),

    /// The pool gave up creating, waiting for or recycling a connection.
    #[error("Timed out acquiring a database connection")]
    Timeout(TimeoutType),

    #[error("Database connection failed: {0}")]
    Connection(#[from] ConnectionError),

    /// Applying the embedded schema migrations failed.
    #[error("Database migration error: {0}")]
    Migration(error::BoxError),

    /// A statement was rejected, including constraint violations.
    #[error("Database query failed: {0}")]
    Query(#[from] Error),

    /// Pool misconfiguration or hook failure.
    #[error("Unexpected database error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Returns the name of the violated constraint, if any.
    pub fn constraint(&self) -> Option<&str> {
        let PgError::Query(err) = self else {
            return None;
        };

        let Error::DatabaseError(_, err) = err else {
            return None;
        };

        err.constraint_name()
    }

    /// Returns whether this error is a unique constraint violation.
    ///
    /// The live email index on `accounts` is the only unique constraint a
    /// caller can trip through the repositories.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            PgError::Query(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        )
    }

    /// Returns whether retrying the call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_) | PgError::Connection(ConnectionError::BadConnection(_))
        )
    }
}

impl From<error::DeadpoolError> for PgError {
    fn from(value: error::DeadpoolError) -> Self {
        use error::{DeadpoolError, DieselPoolError};

        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!(target: TRACING_TARGET_CONNECTION, error = %err, "Post-create hook failed");
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                tracing::error!(target: TRACING_TARGET_CONNECTION, "Connection pool has no runtime");
                Self::Unexpected("Connection pool has no runtime".into())
            }
            DeadpoolError::Closed => Self::Connection(ConnectionError::InvalidConnectionUrl(
                "Connection pool is closed".into(),
            )),
        }
    }
}

/// Result of a database call.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use diesel::result::DatabaseErrorInformation;

    use super::*;

    struct Violation(&'static str);

    impl DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            Some("accounts")
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[test]
    fn unique_violation_exposes_constraint() {
        let error = PgError::Query(Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Violation("accounts_email_address_unique_idx")),
        ));

        assert!(error.is_unique_violation());
        assert!(!error.is_transient());
        assert_eq!(error.constraint(), Some("accounts_email_address_unique_idx"));
    }

    #[test]
    fn other_errors_are_not_unique_violations() {
        assert!(!PgError::Query(Error::NotFound).is_unique_violation());
        assert!(!PgError::Config("missing url".into()).is_unique_violation());
        assert!(PgError::Timeout(TimeoutType::Wait).is_transient());
    }
}
