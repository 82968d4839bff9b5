use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Overrides the default filter, e.g. `LISTKEEP_LOG=listkeep=trace`.
pub const LOG_ENV: &str = "LISTKEEP_LOG";

/// Install the stderr subscriber. Calling it again is a no-op.
pub fn init(verbose: bool) {
  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("listkeep=debug,warn")
    } else {
      EnvFilter::new("warn")
    }
  });

  let _ = tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).try_init();
}
