use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tidemark_billing::PlanId;
use tidemark_core::{TenantId, UserId};

/// Why an organization was suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspensionCode {
    Billing,
    Overage,
    Abuse,
    Other,
}

/// Full organization record as held by the tenant store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: TenantId,
    pub name: String,
    pub plan_id: PlanId,
    pub has_premium_features: bool,
    /// Days of event history to keep. `<= 0` disables retention enforcement.
    pub retention_days: i32,

    /// Monthly price in cents the organization is billed.
    pub billing_price_cents: i64,
    pub stripe_customer_id: Option<String>,
    pub card_last4: Option<String>,
    pub subscribe_date: Option<DateTime<Utc>>,
    pub billing_change_date: Option<DateTime<Utc>>,
    pub billing_changed_by_user_id: Option<UserId>,

    pub is_suspended: bool,
    pub suspension_code: Option<SuspensionCode>,
    pub suspension_date: Option<DateTime<Utc>>,
    pub suspended_by_user_id: Option<UserId>,
}

impl Organization {
    /// A new, unsuspended organization on `plan_id` with no billing details.
    pub fn new(name: impl Into<String>, plan_id: PlanId, retention_days: i32) -> Self {
        Self {
            id: TenantId::new(),
            name: name.into(),
            plan_id,
            has_premium_features: false,
            retention_days,
            billing_price_cents: 0,
            stripe_customer_id: None,
            card_last4: None,
            subscribe_date: None,
            billing_change_date: None,
            billing_changed_by_user_id: None,
            is_suspended: false,
            suspension_code: None,
            suspension_date: None,
            suspended_by_user_id: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.billing_price_cents > 0
    }

    pub fn projection(&self) -> TenantProjection {
        TenantProjection {
            id: self.id,
            name: self.name.clone(),
            retention_days: self.retention_days,
        }
    }
}

/// The three fields the retention job reads per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantProjection {
    pub id: TenantId,
    pub name: String,
    pub retention_days: i32,
}

impl TenantProjection {
    pub fn new(id: TenantId, name: impl Into<String>, retention_days: i32) -> Self {
        Self {
            id,
            name: name.into(),
            retention_days,
        }
    }
}

impl From<&Organization> for TenantProjection {
    fn from(org: &Organization) -> Self {
        org.projection()
    }
}
