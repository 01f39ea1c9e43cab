//! Logging setup.
//!
//! Library crates only emit `tracing` events; this installs the subscriber
//! that prints them. The filter comes from `ICVM_LOG` (`EnvFilter` syntax),
//! defaulting to `warn`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "ICVM_LOG";

/// Builds the log filter. `trace` forces every event on.
#[must_use]
pub fn filter(trace: bool) -> EnvFilter {
    if trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Installs a formatting subscriber writing to stderr.
///
/// Does nothing if a global subscriber is already set.
pub fn init(trace: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(trace))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
