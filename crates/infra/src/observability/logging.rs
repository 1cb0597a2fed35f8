//! Tracing subscriber setup

use forcelink_domain::LoggingSettings;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `settings.level`. Output goes to stderr, as JSON
/// lines when `settings.json` is set. Returns `false` if a subscriber was
/// already installed, which leaves the existing one in place.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(true)
        .with_level(true);

    let installed = if settings.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };
    installed.is_ok()
}
