use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use tidemark_core::TenantId;

/// An ingested event, as the in-memory store keeps it.
///
/// The Postgres adapter never materialises events; only `tenant_id` and
/// `occurred_at` matter for retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub tenant_id: TenantId,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn new(tenant_id: TenantId, event_type: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            tenant_id,
            event_type: event_type.into(),
            occurred_at,
            payload: JsonValue::Null,
        }
    }
}

/// Event store operation error.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The backing store could not be reached (pool closed, network, timeout).
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the query.
    #[error("event store query failed: {0}")]
    Query(String),
}

/// Tenant-scoped event removal.
///
/// Implementations must treat the call as idempotent: removing an already
/// empty range succeeds and reports zero.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Remove every event of `tenant_id` whose timestamp is strictly before
    /// `cutoff`. Returns the number of events removed.
    async fn remove_all_by_date(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, EventStoreError>;
}

#[async_trait::async_trait]
impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    async fn remove_all_by_date(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, EventStoreError> {
        (**self).remove_all_by_date(tenant_id, cutoff).await
    }
}
