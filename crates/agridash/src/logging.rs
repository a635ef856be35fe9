//! Logging setup.
//!
//! Everything goes to stderr so tables and JSON printed on stdout can be
//! piped. `RUST_LOG` replaces the filter derived from `-v`/`-q` entirely.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets that carry HTTP plumbing rather than agridash's own events.
const DEPENDENCY_TARGETS: [&str; 3] = ["tower_http", "hyper", "reqwest"];

/// How much agridash logs, chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only (`-q`).
    Quiet,
    /// Server lifecycle and stream connections.
    #[default]
    Normal,
    /// Per-request detail (`-v`).
    Verbose,
    /// Everything, HTTP plumbing included (`-vv`).
    Trace,
}

impl Verbosity {
    /// Map the `-v` count and `-q` flag. `-q` wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Level for agridash's own targets.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Level for the HTTP server and client crates.
    #[must_use]
    pub fn dependency_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal | Self::Verbose => Level::WARN,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter(self) -> String {
        let deps = self.dependency_level();
        let mut directives = vec![format!("agridash={}", self.level())];
        directives.extend(DEPENDENCY_TARGETS.iter().map(|t| format!("{t}={deps}")));
        directives.join(",")
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(verbosity: Verbosity) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init();
}

/// Route `warn` and above through the test harness's captured output.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("agridash=warn")
        .with_test_writer()
        .try_init();
}
