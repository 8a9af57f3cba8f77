//! Logging bootstrap built on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise `app_name` (with `-` normalized to `_`
/// so it matches the crate target) and `tower_http` are enabled at `default_level`.
pub fn setup_logger(app_name: &str, default_level: &str) {
    let target = app_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{target}={default_level},tower_http={default_level}"
        ))
    });

    // A subscriber may already be installed (e.g. by a test harness).
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already set");
    }
}
