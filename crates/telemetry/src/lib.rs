//! Telemetry - logging setup and run counters
//!
//! Logging is process-wide `tracing` state. Nothing in the workspace holds a
//! logger handle, so probes can cross thread or process boundaries freely; a
//! worker on the receiving side calls [`init_logging`] again before executing
//! anything. Re-initialising an already configured process is a no-op.

use metrics::{counter, describe_counter};
use tracing_subscriber::{fmt, EnvFilter};

pub const PROBES_TOTAL: &str = "defcred_probes_total";
pub const PROBE_FAILURES_TOTAL: &str = "defcred_probe_failures_total";
pub const MATCHES_TOTAL: &str = "defcred_matches_total";
pub const ATTEMPTS_BUILT_TOTAL: &str = "defcred_attempts_built_total";

/// Map `-v` counts to a default filter directive.
#[must_use]
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_logging(verbose: u8, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    let installed = if json {
        fmt().with_env_filter(filter).json().try_init().is_ok()
    } else {
        fmt().with_env_filter(filter).compact().try_init().is_ok()
    };

    if installed {
        describe_counters();
    }
    installed
}

fn describe_counters() {
    describe_counter!(PROBES_TOTAL, "Fingerprint requests issued");
    describe_counter!(PROBE_FAILURES_TOTAL, "Fingerprint requests that failed to connect");
    describe_counter!(MATCHES_TOTAL, "Catalog entries matched by a response");
    describe_counter!(ATTEMPTS_BUILT_TOTAL, "Login attempts produced");
}

#[inline]
pub fn record_probe() {
    counter!(PROBES_TOTAL).increment(1);
}

#[inline]
pub fn record_probe_failure() {
    counter!(PROBE_FAILURES_TOTAL).increment(1);
}

#[inline]
pub fn record_match() {
    counter!(MATCHES_TOTAL).increment(1);
}

#[inline]
pub fn record_attempts(count: usize) {
    counter!(ATTEMPTS_BUILT_TOTAL).increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), "info");
        assert_eq!(level_for(1), "debug");
        assert_eq!(level_for(5), "trace");
    }

    #[test]
    fn reinit_is_harmless() {
        let _ = init_logging(0, false);
        assert!(!init_logging(1, false));
        assert!(!init_logging(1, true));
    }

    #[test]
    fn counters_without_recorder_are_noops() {
        record_probe();
        record_probe_failure();
        record_match();
        record_attempts(3);
    }
}
