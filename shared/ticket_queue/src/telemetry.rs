//! Tracing subscriber setup shared by the service binaries

use tracing_subscriber::{fmt, EnvFilter};

use crate::environment::Environment;

/// Level used when `RUST_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber for `environment`
///
/// JSON for staging/production log ingestion, regular format for development.
///
/// # Panics
///
/// Panics if a global subscriber is already installed
pub fn init_tracing(environment: Environment) {
    let filter = env_filter();

    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
