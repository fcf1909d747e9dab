//! Core job types.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use crate::tenant_store::TenantStoreError;

/// Unique identifier of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Human-readable summary.
    pub message: String,
    /// Job-specific details (counters, timings). Informational only.
    pub metadata: JsonValue,
}

impl JobResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: JsonValue::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Failures that abort a run. No `JobResult` is produced.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("tenant store failure: {0}")]
    TenantStore(#[from] TenantStoreError),

    /// The run was cancelled (deadline or shutdown) between units of work.
    #[error("job run cancelled")]
    Cancelled,
}

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-run context handed to `Job::run`.
#[derive(Debug, Clone)]
pub struct JobRunContext {
    pub job_id: JobId,
    pub started_at: DateTime<Utc>,
    cancellation: CancellationFlag,
}

impl JobRunContext {
    pub fn new() -> Self {
        Self::with_cancellation(CancellationFlag::new())
    }

    pub fn with_cancellation(cancellation: CancellationFlag) -> Self {
        Self {
            job_id: JobId::new(),
            started_at: Utc::now(),
            cancellation,
        }
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// `Err(JobError::Cancelled)` once cancellation was requested.
    pub fn ensure_active(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

impl Default for JobRunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Record of one run, for logs and callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRunRecord {
    pub job_id: JobId,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl JobRunRecord {
    pub fn from_outcome(
        job_name: &str,
        ctx: &JobRunContext,
        outcome: &Result<JobResult, JobError>,
    ) -> Self {
        let finished_at = Utc::now();
        let (success, message, error) = match outcome {
            Ok(result) => (true, Some(result.message.clone()), None),
            Err(e) => (false, None, Some(e.to_string())),
        };

        Self {
            job_id: ctx.job_id,
            job_name: job_name.to_string(),
            started_at: ctx.started_at,
            finished_at,
            success,
            message,
            error,
            duration_ms: (finished_at - ctx.started_at).num_milliseconds().max(0) as u64,
        }
    }
}

/// A unit of scheduled work. Triggering is external; a job only knows how to
/// run once.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &JobRunContext) -> Result<JobResult, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let ctx = JobRunContext::with_cancellation(flag.clone());

        assert!(ctx.ensure_active().is_ok());
        flag.cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.ensure_active(), Err(JobError::Cancelled)));
    }

    #[test]
    fn run_record_reflects_success() {
        let ctx = JobRunContext::new();
        let outcome = Ok(JobResult::success("done"));
        let record = JobRunRecord::from_outcome("test", &ctx, &outcome);

        assert!(record.success);
        assert_eq!(record.message.as_deref(), Some("done"));
        assert_eq!(record.error, None);
        assert_eq!(record.job_id, ctx.job_id);
        assert!(record.finished_at >= record.started_at);
    }

    #[test]
    fn run_record_reflects_failure() {
        let ctx = JobRunContext::new();
        let outcome = Err(JobError::Cancelled);
        let record = JobRunRecord::from_outcome("test", &ctx, &outcome);

        assert!(!record.success);
        assert_eq!(record.message, None);
        assert_eq!(record.error.as_deref(), Some("job run cancelled"));
    }
}
