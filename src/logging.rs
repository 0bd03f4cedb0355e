use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map a configured level name onto an `EnvFilter` directive. Unknown names
/// are passed through so full directives such as `budgetpal=debug` work.
fn directive(level: &str) -> String {
    match level.trim().to_lowercase().as_str() {
        "" => "warn".to_string(),
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        other => other.to_string(),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the settings value;
/// output goes to stderr so command output stays clean.
pub fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
