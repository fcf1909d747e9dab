//! Retention enforcement job.
//!
//! Pages through every tenant, resolves each tenant's effective retention
//! window (configured days, extended to the next plan tier up when one
//! exists) and removes the tenant's events older than the resulting cutoff.
//!
//! Failure tiers:
//! - tenant paging errors abort the run (`JobError::TenantStore`);
//! - anything that goes wrong while enforcing one tenant, panics included,
//!   is recorded as a critical diagnostic and the run moves on. The run still
//!   reports success.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{FutureExt, StreamExt, stream};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use tidemark_billing::{BillingCatalog, RetentionWindow};
use tidemark_core::{Clock, SystemClock};
use tidemark_organizations::TenantProjection;

use crate::config::RetentionJobConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnosticSink};
use crate::event_store::{EventStore, EventStoreError};
use crate::tenant_store::TenantDirectory;

use super::types::{Job, JobError, JobResult, JobRunContext};

/// Tag attached to every isolated enforcement failure.
pub const ENFORCE_LIMITS_TAG: &str = "Enforce Limits";

pub const SUCCESS_MESSAGE: &str = "Successfully enforced all retention limits.";

/// Why enforcing one tenant failed.
#[derive(Debug, Error)]
pub enum EnforcementError {
    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error("event store panicked: {0}")]
    Panicked(String),
}

/// What happened to one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantOutcome {
    /// Retention disabled (`retention_days <= 0`); nothing was called.
    Skipped,
    /// Dry run: cutoff resolved, nothing deleted.
    DryRun {
        window: RetentionWindow,
        cutoff: DateTime<Utc>,
    },
    Enforced {
        window: RetentionWindow,
        cutoff: DateTime<Utc>,
        deleted: u64,
    },
    /// Failure was recorded to the diagnostics sink.
    Failed { error: String },
}

/// Counters for one run. Reported as job metadata; never affects the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionRunSummary {
    /// Includes the final empty page.
    pub page_fetches: u64,
    pub tenants_visited: u64,
    pub skipped: u64,
    pub enforced: u64,
    /// Enforced with a window extended by a higher plan tier.
    pub extended: u64,
    pub dry_run: u64,
    pub failed: u64,
    pub events_deleted: u64,
}

impl RetentionRunSummary {
    fn record(&mut self, outcome: &TenantOutcome) {
        self.tenants_visited += 1;
        match outcome {
            TenantOutcome::Skipped => self.skipped += 1,
            TenantOutcome::DryRun { .. } => self.dry_run += 1,
            TenantOutcome::Enforced {
                window, deleted, ..
            } => {
                self.enforced += 1;
                self.events_deleted += deleted;
                if window.is_extended() {
                    self.extended += 1;
                }
            }
            TenantOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Enforces per-tenant retention limits against the event store.
pub struct EnforceRetentionLimitsJob<T, E> {
    tenants: T,
    events: E,
    catalog: Arc<BillingCatalog>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: RetentionJobConfig,
}

impl<T, E> EnforceRetentionLimitsJob<T, E>
where
    T: TenantDirectory,
    E: EventStore,
{
    pub fn new(tenants: T, events: E, catalog: Arc<BillingCatalog>) -> Self {
        Self {
            tenants,
            events,
            catalog,
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(TracingDiagnosticSink),
            config: RetentionJobConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_config(mut self, config: RetentionJobConfig) -> Self {
        self.config = config;
        self
    }

    /// Enforce retention for one tenant. Never fails: errors are recorded as
    /// diagnostics and reported as `TenantOutcome::Failed`.
    pub async fn enforce(&self, tenant: &TenantProjection) -> TenantOutcome {
        let Some(window) = RetentionWindow::resolve(&self.catalog, tenant.retention_days) else {
            return TenantOutcome::Skipped;
        };

        info!(
            tenant_id = %tenant.id,
            tenant_name = %tenant.name,
            "enforcing retention limits for organization"
        );

        let cutoff = window.cutoff(self.clock.today());

        if self.config.dry_run {
            info!(
                tenant_id = %tenant.id,
                configured_days = window.configured_days,
                effective_days = window.effective_days,
                cutoff = %cutoff,
                "DRY RUN: would remove events before cutoff"
            );
            return TenantOutcome::DryRun { window, cutoff };
        }

        let removal = AssertUnwindSafe(self.events.remove_all_by_date(tenant.id, cutoff))
            .catch_unwind()
            .await;

        let result = match removal {
            Ok(Ok(deleted)) => Ok(deleted),
            Ok(Err(e)) => Err(EnforcementError::Store(e)),
            Err(panic) => Err(EnforcementError::Panicked(panic_message(panic.as_ref()))),
        };

        match result {
            Ok(deleted) => {
                debug!(
                    tenant_id = %tenant.id,
                    effective_days = window.effective_days,
                    cutoff = %cutoff,
                    deleted,
                    "retention enforced"
                );
                TenantOutcome::Enforced {
                    window,
                    cutoff,
                    deleted,
                }
            }
            Err(e) => {
                let error = e.to_string();
                self.diagnostics.record(Diagnostic::critical(
                    ENFORCE_LIMITS_TAG,
                    tenant.clone(),
                    error.clone(),
                ));
                TenantOutcome::Failed { error }
            }
        }
    }

    async fn enforce_unless_cancelled(
        &self,
        tenant: &TenantProjection,
        ctx: &JobRunContext,
    ) -> Option<TenantOutcome> {
        if ctx.is_cancelled() {
            return None;
        }
        Some(self.enforce(tenant).await)
    }

    async fn enforce_page(
        &self,
        page: &[TenantProjection],
        ctx: &JobRunContext,
        summary: &mut RetentionRunSummary,
    ) -> Result<(), JobError> {
        if self.config.max_concurrent <= 1 {
            for tenant in page {
                ctx.ensure_active()?;
                let outcome = self.enforce(tenant).await;
                summary.record(&outcome);
            }
            return Ok(());
        }

        // Every tenant of the page settles before the caller fetches the next
        // page, so at most one page of deletions is in flight.
        let pending: Vec<_> = page
            .iter()
            .map(|tenant| self.enforce_unless_cancelled(tenant, ctx).boxed())
            .collect();
        let outcomes: Vec<Option<TenantOutcome>> = stream::iter(pending)
            .buffer_unordered(self.config.max_concurrent)
            .collect()
            .await;

        for outcome in outcomes.iter().flatten() {
            summary.record(outcome);
        }
        ctx.ensure_active()
    }
}

#[async_trait::async_trait]
impl<T, E> Job for EnforceRetentionLimitsJob<T, E>
where
    T: TenantDirectory,
    E: EventStore,
{
    fn name(&self) -> &'static str {
        "enforce-retention-limits"
    }

    async fn run(&self, ctx: &JobRunContext) -> Result<JobResult, JobError> {
        info!(
            job_id = %ctx.job_id,
            page_size = self.config.page_size,
            max_concurrent = self.config.max_concurrent,
            dry_run = self.config.dry_run,
            "enforce retention limits job starting"
        );

        let page_size = self.config.page_size.max(1);
        let mut summary = RetentionRunSummary::default();
        let mut skip = 0usize;

        let outcome = loop {
            if let Err(e) = ctx.ensure_active() {
                break Err(e);
            }

            let page = match self.tenants.page(page_size, skip).await {
                Ok(page) => page,
                Err(e) => break Err(JobError::from(e)),
            };
            summary.page_fetches += 1;

            if page.is_empty() {
                break Ok(());
            }

            if let Err(e) = self.enforce_page(&page, ctx, &mut summary).await {
                break Err(e);
            }

            skip += page_size;
        };

        match outcome {
            Ok(()) => {
                info!(job_id = %ctx.job_id, summary = ?summary, "retention run finished");
                Ok(JobResult::success(SUCCESS_MESSAGE)
                    .with_metadata(serde_json::to_value(&summary).unwrap_or_default()))
            }
            Err(e) => {
                warn!(job_id = %ctx.job_id, summary = ?summary, error = %e, "retention run aborted");
                Err(e)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
