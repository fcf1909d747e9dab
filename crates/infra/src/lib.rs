//! Infrastructure layer: tenant and event stores, diagnostics, config and the
//! retention job.

pub mod config;
pub mod diagnostics;
pub mod event_store;
pub mod jobs;
pub mod tenant_store;
