//! Log output for issue-planner.
//!
//! Epistemic foundation:
//! - I^R: Level and file directory are resolved from [`LoggingConfig`]
//! - K_i: Console and combined.log share the configured level,
//!   error.log only ever receives errors

use crate::models::{LoggingConfig, PlannerError, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

/// Keeps the background file writers running. Dropping it flushes them.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _workers: Vec<WorkerGuard>,
}

/// Effective maximum level. `--verbose` forces debug.
pub fn level(config: &LoggingConfig, verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        config.level.parse().unwrap_or(Level::INFO)
    }
}

fn file_writer(dir: &Path, name: &str) -> Result<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .map_err(|e| PlannerError::Logging(format!("{}: {e}", dir.join(name).display())))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Build the subscriber without installing it.
///
/// B_i(log directory writable) → Result
pub fn subscriber(
    config: &LoggingConfig,
    verbose: bool,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, LogGuard)> {
    let max_level = LevelFilter::from_level(level(config, verbose));

    let console = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(max_level);

    let mut workers = Vec::new();
    let files = if config.dir.trim().is_empty() {
        None
    } else {
        let dir = Path::new(&config.dir);
        std::fs::create_dir_all(dir).map_err(|e| {
            PlannerError::io(format!("Failed to create log directory {}", dir.display()), e)
        })?;

        let (combined, combined_guard) = file_writer(dir, "combined.log")?;
        let (errors, errors_guard) = file_writer(dir, "error.log")?;
        workers.push(combined_guard);
        workers.push(errors_guard);

        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(combined)
                .with_filter(max_level)
                .and_then(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(errors)
                        .with_filter(LevelFilter::ERROR),
                ),
        )
    };

    let subscriber = tracing_subscriber::registry().with(console).with(files);
    Ok((subscriber, LogGuard { _workers: workers }))
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<LogGuard> {
    let (subscriber, guard) = subscriber(config, verbose)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| PlannerError::Logging(e.to_string()))?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(level: &str, dir: &Path) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            dir: dir.display().to_string(),
        }
    }

    #[test]
    fn test_level_resolution() {
        let dir = TempDir::new().unwrap();
        assert_eq!(level(&config("warn", dir.path()), false), Level::WARN);
        assert_eq!(level(&config("warn", dir.path()), true), Level::DEBUG);
        assert_eq!(level(&config("loud", dir.path()), false), Level::INFO);
    }

    #[test]
    fn test_file_sinks_split_by_level() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let (subscriber, guard) = subscriber(&config("info", &logs), false).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("routine event");
            tracing::error!("broken event");
            tracing::debug!("hidden event");
        });
        drop(guard);

        let combined = std::fs::read_to_string(logs.join("combined.log")).unwrap();
        assert!(combined.contains("routine event"));
        assert!(combined.contains("broken event"));
        assert!(!combined.contains("hidden event"));

        let errors = std::fs::read_to_string(logs.join("error.log")).unwrap();
        assert!(errors.contains("broken event"));
        assert!(!errors.contains("routine event"));
    }

    #[test]
    fn test_empty_dir_disables_files() {
        let config = LoggingConfig {
            level: "info".to_string(),
            dir: String::new(),
        };
        let (_subscriber, guard) = subscriber(&config, false).unwrap();
        assert!(guard._workers.is_empty());
    }
}
