//! Ingested-event store boundary.
//!
//! The retention job only needs one operation from the event store: remove a
//! tenant's events older than a cutoff. Physical batching and retries are the
//! adapter's business.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent};
