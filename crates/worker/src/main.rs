//! `tidemark-worker`: runs one retention enforcement pass and exits.
//!
//! Scheduling is external (cron, a k8s CronJob, ...). Configuration comes
//! from the environment; flags override it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use tidemark_billing::BillingCatalog;
use tidemark_infra::config::WorkerConfig;
use tidemark_infra::diagnostics::TracingDiagnosticSink;
use tidemark_infra::event_store::PostgresEventStore;
use tidemark_infra::jobs::{EnforceRetentionLimitsJob, JobRunContext, JobRunner};
use tidemark_infra::tenant_store::PostgresTenantDirectory;
use tidemark_observability::LogFormat;

#[derive(Parser, Debug)]
#[command(version, about = "Enforce per-tenant event retention limits", long_about = None)]
struct Args {
    /// Resolve cutoffs and log them without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Tenants fetched per page (overrides TIDEMARK_PAGE_SIZE)
    #[arg(long)]
    page_size: Option<usize>,

    /// Tenants of one page enforced concurrently (overrides TIDEMARK_MAX_CONCURRENT)
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Stop issuing deletions after this many seconds (overrides TIDEMARK_DEADLINE_SECS)
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Log output format: json or pretty
    #[arg(long, default_value = "json")]
    log_format: LogFormat,

    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

impl Args {
    fn apply(&self, mut config: WorkerConfig) -> WorkerConfig {
        if self.dry_run {
            config.retention = config.retention.with_dry_run(true);
        }
        if let Some(n) = self.page_size {
            config.retention = config.retention.with_page_size(n);
        }
        if let Some(n) = self.max_concurrent {
            config.retention = config.retention.with_max_concurrent(n);
        }
        if let Some(secs) = self.deadline_secs {
            config.deadline = Some(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tidemark_observability::init(args.log_format);

    let config = WorkerConfig::from_env()
        .map(|config| args.apply(config))
        .context("loading worker configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to postgres")?;

    let job = EnforceRetentionLimitsJob::new(
        PostgresTenantDirectory::new(pool.clone()),
        PostgresEventStore::new(pool.clone()).with_batch_size(config.delete_batch_size),
        Arc::new(BillingCatalog::default()),
    )
    .with_diagnostics(Arc::new(TracingDiagnosticSink))
    .with_config(config.retention.clone());

    let run = JobRunner::new()
        .with_deadline(config.deadline)
        .run_once(&job, JobRunContext::new())
        .await;

    pool.close().await;

    match run.outcome {
        Ok(_) => Ok(()),
        Err(e) => bail!("retention run {} failed: {e}", run.record.job_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> WorkerConfig {
        WorkerConfig::from_lookup(|key| {
            (key == WorkerConfig::DATABASE_URL).then(|| "postgres://localhost/tidemark".to_string())
        })
        .unwrap()
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::parse_from([
            "tidemark-worker",
            "--dry-run",
            "--page-size",
            "25",
            "--max-concurrent",
            "4",
            "--deadline-secs",
            "600",
            "--log-format",
            "pretty",
        ]);
        let config = args.apply(base());

        assert!(config.retention.dry_run);
        assert_eq!(config.retention.page_size, 25);
        assert_eq!(config.retention.max_concurrent, 4);
        assert_eq!(config.deadline, Some(Duration::from_secs(600)));
        assert_eq!(args.log_format, LogFormat::Pretty);
    }

    #[test]
    fn no_flags_keep_environment_values() {
        let args = Args::parse_from(["tidemark-worker"]);
        assert_eq!(args.apply(base()), base());
    }
}
