//! Tracing subscriber set-up for the binary.
//!
//! Diagnostics go to stderr so stdout carries only the report.

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset.
pub fn default_level(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(verbose: bool, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, quiet)));

    let fmt_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), "info");
        assert_eq!(default_level(true, false), "debug");
        assert_eq!(default_level(false, true), "warn");
        assert_eq!(default_level(true, true), "debug");
    }

    #[test]
    fn test_init_twice() {
        init(false, true);
        init(true, false);
    }
}
