//! Run-once jobs.
//!
//! ## Components
//!
//! - `Job`: a named unit of work run against a `JobRunContext`
//! - `JobRunner`: runs a job once, enforces an optional deadline, produces a
//!   `JobRunRecord`
//! - `EnforceRetentionLimitsJob`: purges each tenant's events past its
//!   retention window

pub mod retention;
pub mod runner;
pub mod types;

pub use retention::{
    ENFORCE_LIMITS_TAG, EnforceRetentionLimitsJob, EnforcementError, RetentionRunSummary,
    SUCCESS_MESSAGE, TenantOutcome,
};
pub use runner::{JobRun, JobRunner};
pub use types::{
    CancellationFlag, Job, JobError, JobId, JobResult, JobRunContext, JobRunRecord,
};
