use std::io;

use tracing_subscriber::EnvFilter;

use crate::support::constants::{BIN_NAME, LOG_ENV};

/// Installs the stderr subscriber. `SCANFLEET_LOG` wins over `level`.
pub(crate) fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .without_time()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("[{BIN_NAME}] logging already initialized");
    }
}

pub(crate) fn strip_ansi_codes(bytes: &[u8]) -> String {
    let stripped = strip_ansi_escapes::strip(bytes);
    String::from_utf8_lossy(&stripped).into_owned()
}
