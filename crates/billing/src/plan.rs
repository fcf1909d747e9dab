use serde::{Deserialize, Serialize};

/// Billing plan identifier (e.g. `EX_FREE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl core::fmt::Display for PlanId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A billing plan tier and its entitlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPlan {
    pub id: PlanId,
    pub name: String,
    pub description: String,
    /// Monthly price in cents.
    pub price_cents: i64,
    /// `-1` means unlimited.
    pub max_projects: i32,
    /// `-1` means unlimited.
    pub max_users: i32,
    /// Days of event history the plan keeps.
    pub retention_days: i32,
    /// `-1` means unlimited.
    pub max_events_per_month: i32,
    pub has_premium_features: bool,
    /// Hidden plans are assignable but not offered for self-service upgrade.
    pub is_hidden: bool,
}

impl BillingPlan {
    /// Minimal plan carrying only what the retention rules read.
    pub fn with_retention(id: impl Into<String>, retention_days: i32) -> Self {
        let id = PlanId::new(id);
        Self {
            name: id.to_string(),
            id,
            description: String::new(),
            price_cents: 0,
            max_projects: -1,
            max_users: -1,
            retention_days,
            max_events_per_month: -1,
            has_premium_features: false,
            is_hidden: false,
        }
    }
}
