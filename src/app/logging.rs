use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::app::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::platform::AppPaths;

const LOG_FILE_PREFIX: &str = "tourassist.log";

/// Builds the filter from `RUST_LOG` when set, otherwise from the configured
/// level. `debug` forces this crate to debug.
pub fn build_filter(config: &LoggingConfig, debug: bool) -> Result<EnvFilter> {
    let base = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::validation(format!("Invalid logging level '{}': {}", config.level, e)))?;

    if debug {
        let directive = "tourassist_client=debug"
            .parse()
            .map_err(|e| Error::validation(format!("Invalid log directive: {}", e)))?;
        Ok(base.add_directive(directive))
    } else {
        Ok(base)
    }
}

/// Installs the global subscriber. Console output goes to stderr so it never
/// interleaves with chat output on stdout. The returned guard flushes the
/// file writer on drop and must be held for the life of the process.
pub fn init(config: &LoggingConfig, paths: &AppPaths, debug: bool) -> Result<Option<WorkerGuard>> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(build_filter(config, debug)?);

    let (file, guard) = if config.file_logging {
        std::fs::create_dir_all(paths.logs_dir())?;
        let appender = tracing_appender::rolling::daily(paths.logs_dir(), LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(build_filter(config, debug)?);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::platform(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_configured_level() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            file_logging: false,
        };
        assert!(build_filter(&config, false).is_ok());
        assert!(build_filter(&config, true).is_ok());
    }
}
