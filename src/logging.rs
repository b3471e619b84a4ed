use std::io;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays free for command output.
///
/// `RUST_LOG` overrides the default filter.
pub fn configure_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsboy=info,html5ever=off"));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(filter);

    // Ignore the error if a subscriber was already installed
    let _ = tracing_subscriber::registry().with(stderr_log).try_init();
}
