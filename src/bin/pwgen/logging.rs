use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr, filtered by `PWGEN_LOG` (e.g. `PWGEN_LOG=debug`); warnings and errors
/// only by default. Passwords are never logged.
pub(crate) fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("PWGEN_LOG")
        .from_env_lossy();
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = result {
        eprintln!("failed to set up logging: {err}");
    }
}
