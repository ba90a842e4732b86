use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

/// The output file name for a logger started at `unix_seconds`.
pub fn log_file_name(unix_seconds: i64) -> String {
    format!("GSDK_output_{}.txt", unix_seconds)
}

/// Installs a `fern` dispatcher writing to `GSDK_output_<unix-seconds>.txt`
/// in `log_folder`, or in the working directory when the folder is empty.
///
/// # Errors
/// `fern::InitError::Io` if the folder or file cannot be created, and
/// `fern::InitError::SetLoggerError` if the process already has a logger.
pub fn start_file_log(log_folder: &str, debug: bool) -> Result<PathBuf, fern::InitError> {
    let log_dir = if log_folder.trim().is_empty() {
        Path::new(".")
    } else {
        Path::new(log_folder)
    };
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    let log_path = log_dir.join(log_file_name(Utc::now().timestamp()));
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                Utc::now().format("[%Y-%m-%dT%H:%M:%S%.3fZ]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(&log_path)?)
        .apply()?;

    Ok(log_path)
}
