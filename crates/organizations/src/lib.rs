//! Organization (tenant) records, the projection the retention job reads, and
//! the write-side validation rules.

pub mod organization;
pub mod validation;

pub use organization::{Organization, SuspensionCode, TenantProjection};
pub use validation::{ValidationFailure, ensure_valid, validate_organization};
