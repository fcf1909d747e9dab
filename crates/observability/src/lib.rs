//! Process-wide tracing setup shared by the binaries.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing in `format`, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    subscriber::init(format, "info");
}
