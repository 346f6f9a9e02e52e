use tracing_subscriber::EnvFilter;

use crate::errors::{SearchError, SearchResult};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (trace, debug, info, warn,
/// error, or a full filter directive) is used.
pub fn init(level: &str) -> SearchResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| {
            SearchError::config_error(format!("invalid log level '{}': {}", level, e))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| SearchError::config_error(format!("cannot install logger: {}", e)))
}
