//! Tenant directory: paged, projected access to every organization.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use tidemark_core::DomainError;
use tidemark_organizations::TenantProjection;

pub use in_memory::InMemoryTenantDirectory;
pub use postgres::PostgresTenantDirectory;

#[derive(Debug, Error)]
pub enum TenantStoreError {
    #[error("tenant store unavailable: {0}")]
    Unavailable(String),

    #[error("tenant store query failed: {0}")]
    Query(String),

    /// A record was rejected by the organization rules on write.
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Read access to all tenants, one page at a time.
///
/// Pages must come back in an order that is stable for the duration of a run
/// (primary key / creation order), so that advancing `skip` by `limit` visits
/// every tenant exactly once and eventually yields an empty page.
#[async_trait::async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn page(&self, limit: usize, skip: usize)
    -> Result<Vec<TenantProjection>, TenantStoreError>;
}

#[async_trait::async_trait]
impl<S> TenantDirectory for Arc<S>
where
    S: TenantDirectory + ?Sized,
{
    async fn page(
        &self,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<TenantProjection>, TenantStoreError> {
        (**self).page(limit, skip).await
    }
}
