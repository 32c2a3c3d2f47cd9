//! Tracing setup for test binaries that use the fixtures
//!
//! Test suites call [`init`] at the top of each test; only the first call
//! installs a subscriber, later calls are ignored.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install a global `fmt` subscriber using the default logging settings
pub fn init() {
    init_with(&LoggingSettings::default());
}

/// Install a global `fmt` subscriber configured from `settings`
///
/// `RUST_LOG` takes precedence over `settings.level` when it is set.
pub fn init_with(settings: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer();

    // A subscriber may already be installed by an earlier test
    let _ = match settings.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
}
