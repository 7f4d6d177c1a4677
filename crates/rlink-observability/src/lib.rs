//! Structured logging setup for the `rlink` binary and the test harness.
//!
//! A match run is a batch job, not a long-lived service, so the only knob
//! worth exposing is verbosity: the filter defaults to `info` and honors
//! `RUST_LOG` when set, same as every other crate in this workspace that
//! logs through `tracing`.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber writing to stderr. Safe to call
/// more than once per process (later calls are no-ops); returns an error
/// only if a subscriber was already installed and is of a different type.
pub fn init_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_is_idempotent() {
        init_subscriber();
        init_subscriber();
    }
}
