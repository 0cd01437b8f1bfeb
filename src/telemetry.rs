//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `filter` (e.g. `info`,
/// `car_rental_core=debug`).
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
