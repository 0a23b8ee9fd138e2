use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Where and how verbosely to log.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Filter directives used when `RUST_LOG` is unset.
    pub default_filter: Option<String>,
    /// Directory for daily rolling log files. Stdout only when `None`.
    pub log_dir: Option<PathBuf>,
    /// File name prefix for the rolling files.
    pub file_prefix: String,
}

impl LoggingOptions {
    /// Read `LOG_DIR` and `LOG_FILTER` from the environment.
    pub fn from_env(file_prefix: &str) -> Self {
        let log_dir = env::var("LOG_DIR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let default_filter = env::var("LOG_FILTER")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            default_filter,
            log_dir,
            file_prefix: file_prefix.to_string(),
        }
    }
}

/// Keeps the background file writer flushing. Drop it last.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over [`LoggingOptions::default_filter`], which wins over
/// `info`.
pub fn init_logging(options: &LoggingOptions) -> Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(options.default_filter.as_deref().unwrap_or(DEFAULT_FILTER))
    });

    let (file_layer, file_guard) = match options.log_dir.as_ref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &options.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
