//! Logging setup for the `usrmgr` binary.
//!
//! Library code only emits `tracing` events. The binary installs one
//! subscriber writing to stderr, so rendered screens and JSON on stdout stay
//! machine-readable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much diagnostic output to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Completed actions and warnings.
    #[default]
    Normal,
    /// Action start and finish, store calls.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Derive verbosity from `-v` count and `-q`; quiet wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level shown.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive for this crate. Other crates stay at `warn`.
    #[must_use]
    pub fn directive(self) -> String {
        format!("warn,usermanager={}", self.level())
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG`, when set and valid, replaces the directive derived from
/// `verbosity`. Only the first call installs anything.
///
/// # Examples
///
/// ```no_run
/// use usermanager::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Route events to the test harness; warnings and errors only.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
