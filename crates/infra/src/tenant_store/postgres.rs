//! Postgres-backed tenant directory over the `organizations` table.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use tidemark_core::TenantId;
use tidemark_organizations::TenantProjection;

use super::{TenantDirectory, TenantStoreError};

#[derive(Debug, Clone)]
pub struct PostgresTenantDirectory {
    pool: Arc<PgPool>,
}

impl PostgresTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

/// Map an `organizations` row into the projection the retention job reads.
fn row_to_projection(row: &PgRow) -> Result<TenantProjection, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let retention_days: i32 = row.try_get("retention_days")?;

    Ok(TenantProjection::new(
        TenantId::from_uuid(id),
        name,
        retention_days,
    ))
}

#[async_trait::async_trait]
impl TenantDirectory for PostgresTenantDirectory {
    /// Ordered by primary key. Ids are UUIDv7, so tenants created during a run
    /// land after the current offset rather than shifting earlier pages.
    #[instrument(skip(self), err)]
    async fn page(
        &self,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<TenantProjection>, TenantStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, retention_days
            FROM organizations
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(row_to_projection)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlx_error)
    }
}

fn map_sqlx_error(err: sqlx::Error) -> TenantStoreError {
    match err {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            TenantStoreError::Unavailable(format!("page: {err}"))
        }
        sqlx::Error::Io(io) => TenantStoreError::Unavailable(format!("page: {io}")),
        other => TenantStoreError::Query(format!("page: {other}")),
    }
}
