//! Log output for the binary.
//!
//! Library code logs through the `log` facade. The binary installs a
//! `tracing-subscriber` formatter on stderr, which also receives `log`
//! records through its `tracing-log` bridge.

use tracing::Level;

/// Options controlling log output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Show only warnings and errors.
    pub silent: bool,
    /// Show debug messages.
    pub verbose: bool,
    /// Omit timestamps, e.g. when journald adds its own.
    pub suppress_timestamps: bool,
}

impl LogOptions {
    pub fn level(&self) -> Level {
        if self.silent {
            Level::WARN
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(options: LogOptions) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(options.level())
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = if options.suppress_timestamps {
        builder.without_time().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        log::debug!("logging already initialised: {err}");
    }
}
