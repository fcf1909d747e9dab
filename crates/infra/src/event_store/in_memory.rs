use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use tidemark_core::TenantId;

use super::r#trait::{EventStore, EventStoreError, StoredEvent};

/// In-memory event store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<TenantId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: StoredEvent) -> Result<(), EventStoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;
        events.entry(event.tenant_id).or_default().push(event);
        Ok(())
    }

    /// Events currently held for a tenant, in append order.
    pub fn events_for(&self, tenant_id: TenantId) -> Vec<StoredEvent> {
        match self.events.read() {
            Ok(events) => events.get(&tenant_id).cloned().unwrap_or_default(),
            Err(_) => vec![],
        }
    }

    pub fn count_for(&self, tenant_id: TenantId) -> usize {
        match self.events.read() {
            Ok(events) => events.get(&tenant_id).map_or(0, Vec::len),
            Err(_) => 0,
        }
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn remove_all_by_date(
        &self,
        tenant_id: TenantId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, EventStoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| EventStoreError::Unavailable("lock poisoned".to_string()))?;

        let Some(stream) = events.get_mut(&tenant_id) else {
            return Ok(0);
        };

        let before = stream.len();
        stream.retain(|e| e.occurred_at >= cutoff);
        Ok((before - stream.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn removes_only_events_strictly_before_cutoff() {
        let store = InMemoryEventStore::new();
        let tenant = TenantId::new();

        store.append(StoredEvent::new(tenant, "error", cutoff() - Duration::seconds(1))).unwrap();
        store.append(StoredEvent::new(tenant, "error", cutoff())).unwrap();
        store.append(StoredEvent::new(tenant, "log", cutoff() + Duration::days(3))).unwrap();

        let removed = store.remove_all_by_date(tenant, cutoff()).await.unwrap();

        assert_eq!(removed, 1);
        let kept = store.events_for(tenant);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| e.occurred_at >= cutoff()));
    }

    #[tokio::test]
    async fn removal_is_scoped_to_one_tenant() {
        let store = InMemoryEventStore::new();
        let a = TenantId::new();
        let b = TenantId::new();
        let old = cutoff() - Duration::days(10);

        store.append(StoredEvent::new(a, "error", old)).unwrap();
        store.append(StoredEvent::new(b, "error", old)).unwrap();

        store.remove_all_by_date(a, cutoff()).await.unwrap();

        assert_eq!(store.count_for(a), 0);
        assert_eq!(store.count_for(b), 1);
    }

    #[tokio::test]
    async fn repeated_removal_is_a_no_op() {
        let store = InMemoryEventStore::new();
        let tenant = TenantId::new();
        store.append(StoredEvent::new(tenant, "error", cutoff() - Duration::days(1))).unwrap();

        assert_eq!(store.remove_all_by_date(tenant, cutoff()).await.unwrap(), 1);
        assert_eq!(store.remove_all_by_date(tenant, cutoff()).await.unwrap(), 0);
        assert_eq!(store.remove_all_by_date(TenantId::new(), cutoff()).await.unwrap(), 0);
    }
}
