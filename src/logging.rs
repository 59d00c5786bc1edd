//! Sets up the `tracing` subscriber. Log lines go to stderr so stdout stays
//! free for anything a caller might pipe.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// An [`EnvFilter`] directive in this variable overrides the verbosity flags.
pub const LOG_ENV: &str = "GO_REDIRECT_LOG";

/// Console verbosity derived from `-q` and `-v` occurrences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    /// `-q` wins over any number of `-v`.
    pub fn from_flags(quiet: bool, verbose: u64) -> Verbosity {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, 0) => Verbosity::Normal,
            (false, 1) => Verbosity::Verbose,
            (false, _) => Verbosity::Trace,
        }
    }

    /// The [`EnvFilter`] directive for this verbosity.
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Normal
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(
    verbosity: Verbosity,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.to_filter_string()));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(console_layer).try_init()?;
    Ok(())
}
