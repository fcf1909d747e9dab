//! `tidemark-core`: shared primitives for the retention workspace.
//!
//! Identifiers, the domain error model and the clock abstraction. No storage
//! or runtime concerns live here.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
