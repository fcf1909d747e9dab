//! Billing plans and the retention entitlements derived from them.

pub mod catalog;
pub mod plan;
pub mod retention;

pub use catalog::BillingCatalog;
pub use plan::{BillingPlan, PlanId};
pub use retention::{RetentionWindow, retention_cutoff};
