//! Postgres-backed event removal.
//!
//! ## Error Mapping
//!
//! | SQLx Error | EventStoreError |
//! |------------|-----------------|
//! | PoolClosed, Io, PoolTimedOut | `Unavailable` |
//! | Database, anything else | `Query` |
//!
//! ## Batching
//!
//! A tenant may own millions of stale rows. Deletion runs in batches of
//! `batch_size` rows so no single statement holds locks for long; the loop
//! ends on the first short batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{Span, debug, instrument};

use tidemark_core::TenantId;

use super::r#trait::{EventStore, EventStoreError};

pub const DEFAULT_DELETE_BATCH_SIZE: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
    batch_size: u32,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            batch_size: DEFAULT_DELETE_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait::async_trait]
impl EventStore for PostgresEventStore {
    #[instrument(
        skip(self),
        fields(tenant_id = %tenant_id, cutoff = %cutoff, deleted = tracing::field::Empty),
        err
    )]
    async fn remove_all_by_date(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, EventStoreError> {
        let limit = i64::from(self.batch_size);
        let mut total: u64 = 0;

        loop {
            let result = sqlx::query(
                r#"
                DELETE FROM events
                WHERE ctid IN (
                    SELECT ctid FROM events
                    WHERE tenant_id = $1 AND occurred_at < $2
                    LIMIT $3
                )
                "#,
            )
            .bind(tenant_id.as_uuid())
            .bind(cutoff)
            .bind(limit)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_all_by_date", e))?;

            let deleted = result.rows_affected();
            total += deleted;
            debug!(tenant_id = %tenant_id, batch = deleted, total, "deleted event batch");

            if deleted < limit as u64 {
                break;
            }
        }

        Span::current().record("deleted", total);
        Ok(total)
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> EventStoreError {
    match err {
        sqlx::Error::Database(db_err) => EventStoreError::Query(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            EventStoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            EventStoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::Io(io) => {
            EventStoreError::Unavailable(format!("io error in {}: {}", operation, io))
        }
        _ => EventStoreError::Query(format!("sqlx error in {}: {}", operation, err)),
    }
}
