use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{APP_DIR, Config};
use crate::errors::AppError;

/// Set up application logging based on configuration.
///
/// `RUST_LOG` overrides the configured level. Logs go to stderr unless
/// `logging.file_path` is set; the returned guard must then be kept alive
/// so buffered lines are flushed.
pub fn setup_logging(config: &Config) -> Result<Option<WorkerGuard>, AppError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let Some(path) = config.log_file_path() else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();
        set_global(subscriber)?;
        return Ok(None);
    };

    let (log_dir, log_file_name) = split_log_path(Path::new(path));
    std::fs::create_dir_all(&log_dir).map_err(|e| AppError::Generic {
        message: format!("Failed to create log directory {:?}: {}", log_dir, e),
    })?;

    let file_appender = tracing_appender::rolling::never(&log_dir, log_file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(file_writer)
        .with_ansi(false)
        .finish();
    set_global(subscriber)?;
    Ok(Some(guard))
}

fn set_global<S>(subscriber: S) -> Result<(), AppError>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(|e| AppError::Generic {
        message: format!("Failed to set global tracing subscriber: {}", e),
    })
}

// Bare file names land in the data directory.
fn split_log_path(path: &Path) -> (PathBuf, String) {
    let log_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_default()
                .join(APP_DIR)
                .join("logs")
        });

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.log", APP_DIR));

    (log_dir, file_name)
}
