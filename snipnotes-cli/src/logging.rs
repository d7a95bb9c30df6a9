//! Logger bootstrap for the terminal front-end.
//!
//! Logs go to stderr unless the settings name a log directory, in which case
//! they go to size-rotated files there. `SNIPNOTES_LOG` overrides the level.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use std::path::Path;

pub const LOG_ENV: &str = "SNIPNOTES_LOG";

const LOG_FILE_BASENAME: &str = "snipnotes";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

/// Starts the logger. Keep the returned handle alive until exit.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<LoggerHandle, String> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| level.to_string());
    let logger = Logger::try_with_str(&filter)
        .map_err(|err| format!("invalid log level `{filter}`: {err}"))?;

    let logger = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        None => logger.log_to_stderr().format(flexi_logger::default_format),
    };

    logger
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))
}
