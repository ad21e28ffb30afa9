//! Tracing setup for binaries and tests embedding the store.
//!
//! The store only emits `tracing` events: collection writes and persistence
//! failures, cache misses, index bootstrap progress. Nothing is printed
//! until one of these installs a subscriber. Without the `logging` feature
//! they compile to no-ops.

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used by [`init_test`]: everything the store emits, nothing else.
pub const TEST_DIRECTIVE: &str = "portaldb_core=debug";

/// Install a subscriber at `info`, unless `RUST_LOG` says otherwise.
///
/// ```rust
/// portaldb_core::logging::init();
/// ```
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Install a subscriber at `level` (e.g. `"portaldb_core=debug,warn"`).
///
/// `RUST_LOG` takes precedence when set. A subscriber installed earlier is
/// left in place.
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// Route store events at [`TEST_DIRECTIVE`] into the test harness output.
/// Safe to call from every test.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(TEST_DIRECTIVE))
        .with_test_writer()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
