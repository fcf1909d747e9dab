//! Diagnostics channel for failures that are recorded but not propagated.
//!
//! Per-tenant enforcement failures never fail a retention run; they land here
//! instead. Monitoring watches this channel, not the job result.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tidemark_organizations::TenantProjection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
        }
    }
}

/// A recorded failure with its context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub tags: Vec<String>,
    pub tenant: TenantProjection,
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn critical(tag: impl Into<String>, tenant: TenantProjection, error: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            tags: vec![tag.into()],
            tenant,
            error: error.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

pub trait DiagnosticSink: Send + Sync + 'static {
    fn record(&self, diagnostic: Diagnostic);
}

/// Emits diagnostics as `error`-level tracing events.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn record(&self, diagnostic: Diagnostic) {
        tracing::error!(
            severity = diagnostic.severity.as_str(),
            tags = ?diagnostic.tags,
            tenant_id = %diagnostic.tenant.id,
            tenant_name = %diagnostic.tenant.name,
            retention_days = diagnostic.tenant.retention_days,
            error = %diagnostic.error,
            "isolated failure recorded"
        );
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDiagnosticSink {
    inner: Mutex<Vec<Diagnostic>>,
}

impl InMemoryDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Diagnostic> {
        self.inner.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl DiagnosticSink for InMemoryDiagnosticSink {
    fn record(&self, diagnostic: Diagnostic) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.push(diagnostic);
        }
    }
}
