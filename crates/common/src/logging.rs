//! Logging and tracing initialization.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level`. Output goes to
/// `config.file` when set, otherwise to stderr so that command output on
/// stdout stays clean.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let log_file = config.file.as_deref().and_then(open_log_file);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match (config.json, log_file) {
        (true, Some(file)) => install(builder.json().with_writer(Mutex::new(file)).finish()),
        (true, None) => install(builder.json().with_writer(std::io::stderr).finish()),
        (false, Some(file)) => install(
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish(),
        ),
        (false, None) => install(builder.with_writer(std::io::stderr).finish()),
    }
}

fn install<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    // A second initialization (tests, embedding callers) keeps the first subscriber.
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("jimaku: cannot create log directory {}: {e}", parent.display());
            return None;
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("jimaku: cannot open log file {}: {e}", path.display());
            None
        }
    }
}
