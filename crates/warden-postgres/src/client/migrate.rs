//! Embedded schema migrations.

use std::time::Instant;

use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_migrations::MigrationHarness;
use tokio::task::spawn_blocking;

use crate::error::BoxError;
use crate::{MIGRATIONS, PgClient, PgError, PgResult, PooledConnection, TRACING_TARGET_MIGRATION};

type MigrationConnection = AsyncConnectionWrapper<PooledConnection>;

/// Applied and pending migration versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Applied migration versions in chronological order.
    pub applied_versions: Vec<String>,
    /// Embedded migration versions not yet applied.
    pub pending_versions: Vec<String>,
}

impl MigrationStatus {
    /// Returns whether every embedded migration has been applied.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Migration operations on a [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies all pending embedded migrations and returns their versions.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<Vec<String>>> + Send;

    /// Reports which embedded migrations have and have not been applied.
    fn migration_status(&self) -> impl Future<Output = PgResult<MigrationStatus>> + Send;
}

impl PgClientMigrationExt for PgClient {
    #[tracing::instrument(skip(self), target = TRACING_TARGET_MIGRATION)]
    async fn run_pending_migrations(&self) -> PgResult<Vec<String>> {
        let start = Instant::now();
        let versions: Vec<String> = with_harness(self, |conn| {
            let versions = conn.run_pending_migrations(MIGRATIONS)?;
            Ok(versions.into_iter().map(|v| v.to_string()).collect())
        })
        .await
        .inspect_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_MIGRATION,
                error = %err,
                "Database migration failed"
            );
        })?;

        tracing::info!(
            target: TRACING_TARGET_MIGRATION,
            duration = ?start.elapsed(),
            migrations_count = versions.len(),
            "Database migrations applied"
        );

        Ok(versions)
    }

    async fn migration_status(&self) -> PgResult<MigrationStatus> {
        with_harness(self, |conn| {
            let applied_versions = conn
                .applied_migrations()?
                .into_iter()
                .map(|v| v.to_string())
                .collect();
            let pending_versions = conn
                .pending_migrations(MIGRATIONS)?
                .into_iter()
                .map(|m| m.name().version().to_string())
                .collect();

            Ok(MigrationStatus {
                applied_versions,
                pending_versions,
            })
        })
        .await
    }
}

/// Runs a synchronous migration harness call on a blocking thread.
async fn with_harness<T, F>(pg: &PgClient, f: F) -> PgResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut MigrationConnection) -> Result<T, BoxError> + Send + 'static,
{
    let conn = pg.get_connection().await?.into_inner();
    let mut conn: MigrationConnection = conn.into();

    spawn_blocking(move || f(&mut conn))
        .await
        .map_err(|err| PgError::Migration(err.into()))?
        .map_err(PgError::Migration)
}
