//! Immutable billing plan catalog.
//!
//! Built once at startup and shared (`Arc<BillingCatalog>`) for the life of
//! the process. Nothing mutates it after construction.

use tidemark_core::{DomainError, DomainResult};

use crate::plan::{BillingPlan, PlanId};

pub const FREE_PLAN_ID: &str = "EX_FREE";

#[derive(Debug, Clone)]
pub struct BillingCatalog {
    plans: Vec<BillingPlan>,
    free_plan: usize,
    /// Distinct plan retention values, ascending.
    retention_tiers: Vec<i32>,
}

impl BillingCatalog {
    /// Build a catalog. `free_plan_id` must name one of `plans`.
    pub fn new(plans: Vec<BillingPlan>, free_plan_id: &PlanId) -> DomainResult<Self> {
        let free_plan = plans
            .iter()
            .position(|p| &p.id == free_plan_id)
            .ok_or_else(|| DomainError::not_found(format!("free plan '{free_plan_id}'")))?;

        Ok(Self {
            retention_tiers: retention_tiers(&plans),
            plans,
            free_plan,
        })
    }

    pub fn plans(&self) -> &[BillingPlan] {
        &self.plans
    }

    pub fn plan(&self, id: &PlanId) -> Option<&BillingPlan> {
        self.plans.iter().find(|p| &p.id == id)
    }

    pub fn free_plan(&self) -> &BillingPlan {
        &self.plans[self.free_plan]
    }

    pub fn is_free_plan(&self, id: &PlanId) -> bool {
        &self.free_plan().id == id
    }

    /// Smallest plan retention strictly greater than `retention_days`.
    pub fn next_tier_above(&self, retention_days: i32) -> Option<i32> {
        let idx = self
            .retention_tiers
            .partition_point(|&tier| tier <= retention_days);
        self.retention_tiers.get(idx).copied()
    }

    /// The retention window actually enforced for a tenant configured with
    /// `retention_days`: the next tier up when one exists, otherwise the
    /// configured value. Never smaller than the input.
    pub fn effective_retention_days(&self, retention_days: i32) -> i32 {
        self.next_tier_above(retention_days)
            .unwrap_or(retention_days)
    }
}

impl Default for BillingCatalog {
    /// Stock plan lineup.
    fn default() -> Self {
        let plans = vec![
            BillingPlan {
                id: PlanId::new(FREE_PLAN_ID),
                name: "Free".to_string(),
                description: "Free".to_string(),
                price_cents: 0,
                max_projects: 1,
                max_users: 1,
                retention_days: 3,
                max_events_per_month: 3_000,
                has_premium_features: false,
                is_hidden: false,
            },
            BillingPlan {
                id: PlanId::new("EX_SMALL"),
                name: "Small".to_string(),
                description: "Small ($15/month)".to_string(),
                price_cents: 1_500,
                max_projects: 5,
                max_users: -1,
                retention_days: 30,
                max_events_per_month: 15_000,
                has_premium_features: true,
                is_hidden: false,
            },
            BillingPlan {
                id: PlanId::new("EX_MEDIUM"),
                name: "Medium".to_string(),
                description: "Medium ($49/month)".to_string(),
                price_cents: 4_900,
                max_projects: 15,
                max_users: -1,
                retention_days: 90,
                max_events_per_month: 75_000,
                has_premium_features: true,
                is_hidden: false,
            },
            BillingPlan {
                id: PlanId::new("EX_LARGE"),
                name: "Large".to_string(),
                description: "Large ($99/month)".to_string(),
                price_cents: 9_900,
                max_projects: -1,
                max_users: -1,
                retention_days: 180,
                max_events_per_month: 250_000,
                has_premium_features: true,
                is_hidden: false,
            },
            BillingPlan {
                id: PlanId::new("EX_UNLIMITED"),
                name: "Unlimited".to_string(),
                description: "Unlimited".to_string(),
                price_cents: 0,
                max_projects: -1,
                max_users: -1,
                retention_days: 730,
                max_events_per_month: -1,
                has_premium_features: true,
                is_hidden: true,
            },
        ];

        Self {
            retention_tiers: retention_tiers(&plans),
            plans,
            free_plan: 0,
        }
    }
}

fn retention_tiers(plans: &[BillingPlan]) -> Vec<i32> {
    let mut tiers: Vec<i32> = plans.iter().map(|p| p.retention_days).collect();
    tiers.sort_unstable();
    tiers.dedup();
    tiers
}
