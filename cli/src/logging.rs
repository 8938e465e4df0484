//! Tracing initialization: logs go to stderr so stdout stays clean for the
//! graph output.
//!
//! `RUST_LOG` overrides the level; default is `warn`, or `trellis=debug`
//! with `--verbose`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default = if verbose { "trellis=debug,cli=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
