//! Logging setup for the command-line tool.
//!
//! With the `profiling` feature the `profiling` crate emits its scopes as
//! tracing spans, so the same fmt layer shows them.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is unset
fn default_directives(verbose: bool) -> &'static str {
    if verbose || cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Initialize the global subscriber, writing to stderr so stdout stays clean for reports
pub fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(default_directives(true))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(false)))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(fmt_layer);
    if registry.try_init().is_err() {
        tracing::debug!("Logging already initialized");
        return;
    }

    tracing::debug!(
        "Logging initialized (profiling {})",
        if cfg!(feature = "profiling") {
            "enabled"
        } else {
            "disabled"
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        assert_eq!(default_directives(true), "debug");
    }

    #[test]
    fn test_setup_twice_is_harmless() {
        setup_logging(false);
        setup_logging(true);
    }
}
