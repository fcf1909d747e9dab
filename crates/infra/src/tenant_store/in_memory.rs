use std::collections::BTreeMap;
use std::sync::RwLock;

use tidemark_billing::BillingCatalog;
use tidemark_core::TenantId;
use tidemark_organizations::{Organization, TenantProjection, ensure_valid};

use super::{TenantDirectory, TenantStoreError};

/// In-memory tenant directory for tests/dev.
///
/// Keyed by `TenantId`; ids are UUIDv7 so key order is creation order.
#[derive(Debug, Default)]
pub struct InMemoryTenantDirectory {
    organizations: RwLock<BTreeMap<TenantId, Organization>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, org: Organization) -> Result<(), TenantStoreError> {
        let mut map = self
            .organizations
            .write()
            .map_err(|_| TenantStoreError::Unavailable("lock poisoned".to_string()))?;
        map.insert(org.id, org);
        Ok(())
    }

    /// Run the organization rules, then store.
    pub fn upsert_validated(
        &self,
        org: Organization,
        catalog: &BillingCatalog,
    ) -> Result<(), TenantStoreError> {
        ensure_valid(&org, catalog)?;
        self.upsert(org)
    }

    pub fn len(&self) -> usize {
        self.organizations.read().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn page(
        &self,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<TenantProjection>, TenantStoreError> {
        let map = self
            .organizations
            .read()
            .map_err(|_| TenantStoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(map
            .values()
            .skip(skip)
            .take(limit)
            .map(Organization::projection)
            .collect())
    }
}
