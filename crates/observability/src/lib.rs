//! Process-wide logging setup shared by the binaries.

/// Tracing subscriber setup (filters, output format).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize logging from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}
