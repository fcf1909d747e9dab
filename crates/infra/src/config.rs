//! Configuration loading and representation.

use std::time::Duration;

use thiserror::Error;

use crate::event_store::postgres::DEFAULT_DELETE_BATCH_SIZE;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Retention job tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionJobConfig {
    /// Tenants fetched per page.
    pub page_size: usize,
    /// Tenants of one page enforced at the same time (1 = sequential).
    pub max_concurrent: usize,
    /// Resolve and log cutoffs without deleting anything.
    pub dry_run: bool,
}

impl Default for RetentionJobConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent: 1,
            dry_run: false,
        }
    }
}

impl RetentionJobConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Everything the worker process needs to run one retention pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub database_url: String,
    pub retention: RetentionJobConfig,
    /// Rows per DELETE statement in the Postgres event store.
    pub delete_batch_size: u32,
    /// Cooperative deadline for the whole run; checked between tenants.
    pub deadline: Option<Duration>,
}

impl WorkerConfig {
    pub const DATABASE_URL: &'static str = "DATABASE_URL";
    pub const PAGE_SIZE: &'static str = "TIDEMARK_PAGE_SIZE";
    pub const MAX_CONCURRENT: &'static str = "TIDEMARK_MAX_CONCURRENT";
    pub const DRY_RUN: &'static str = "TIDEMARK_DRY_RUN";
    pub const DELETE_BATCH_SIZE: &'static str = "TIDEMARK_DELETE_BATCH_SIZE";
    pub const DEADLINE_SECS: &'static str = "TIDEMARK_DEADLINE_SECS";

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test maps).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(Self::DATABASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(Self::DATABASE_URL))?;

        let mut retention = RetentionJobConfig::default();
        if let Some(v) = lookup(Self::PAGE_SIZE) {
            retention = retention.with_page_size(parse_positive(Self::PAGE_SIZE, &v)?);
        }
        if let Some(v) = lookup(Self::MAX_CONCURRENT) {
            retention = retention.with_max_concurrent(parse_positive(Self::MAX_CONCURRENT, &v)?);
        }
        if let Some(v) = lookup(Self::DRY_RUN) {
            retention = retention.with_dry_run(parse_bool(Self::DRY_RUN, &v)?);
        }

        let delete_batch_size = match lookup(Self::DELETE_BATCH_SIZE) {
            Some(v) => u32::try_from(parse_positive(Self::DELETE_BATCH_SIZE, &v)?).map_err(|_| {
                ConfigError::Invalid {
                    key: Self::DELETE_BATCH_SIZE,
                    value: v.clone(),
                }
            })?,
            None => DEFAULT_DELETE_BATCH_SIZE,
        };

        let deadline = match lookup(Self::DEADLINE_SECS) {
            Some(v) => Some(Duration::from_secs(
                parse_positive(Self::DEADLINE_SECS, &v)? as u64,
            )),
            None => None,
        };

        Ok(Self {
            database_url,
            retention,
            delete_batch_size,
            deadline,
        })
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
