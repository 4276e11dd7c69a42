use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("a global logger is already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Installs the global logger: stdout plus `{log_dir}/{app_name}_{timestamp}.log`.
///
/// Older `{app_name}_*.log` files in `log_dir` are deleted first, so at most
/// the previous run's file and the new one exist at any time. Returns the path
/// of the new file.
pub fn setup_logging(log_dir: &Path, log_level: &str, app_name: &str) -> Result<PathBuf, LoggerError> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    cleanup_old_logs(log_dir, app_name)?;

    let log_file_name = format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let log_path = log_dir.join(log_file_name);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(parse_level(log_level))
        .chain(std::io::stdout())
        .chain(fern::log_file(&log_path)?)
        .apply()?;

    Ok(log_path)
}

/// Unknown names fall back to `Info`.
pub fn parse_level(log_level: &str) -> log::LevelFilter {
    match log_level.trim().to_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" | "warning" => log::LevelFilter::Warn,
        "error" | "fatal" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    }
}

/// Keeps the newest `{app_name}_*.log` in `log_dir` and deletes the rest.
fn cleanup_old_logs(log_dir: &Path, app_name: &str) -> Result<(), LoggerError> {
    let prefix = format!("{}_", app_name);
    let mut entries: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .filter(|e| {
            let path = e.path();
            path.extension().is_some_and(|ext| ext == "log")
                && e.file_name().to_string_lossy().starts_with(&prefix)
        })
        .collect();

    // Timestamped names sort chronologically; newest first.
    entries.sort_by_key(|e| std::cmp::Reverse(e.file_name()));

    for entry in entries.iter().skip(1) {
        if let Err(e) = fs::remove_file(entry.path()) {
            eprintln!("Failed to delete old log file {:?}: {}", entry.path(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(parse_level(" trace "), log::LevelFilter::Trace);
        assert_eq!(parse_level("warning"), log::LevelFilter::Warn);
        assert_eq!(parse_level("fatal"), log::LevelFilter::Error);
        assert_eq!(parse_level("off"), log::LevelFilter::Off);
        assert_eq!(parse_level("chatty"), log::LevelFilter::Info);
    }

    #[test]
    fn cleanup_keeps_newest_of_this_app_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "server_stations_2024-01-01_10-00-00.log");
        touch(dir.path(), "server_stations_2024-03-01_10-00-00.log");
        touch(dir.path(), "server_stations_2024-02-01_10-00-00.log");
        touch(dir.path(), "other_2020-01-01_00-00-00.log");
        touch(dir.path(), "notes.txt");

        cleanup_old_logs(dir.path(), "server_stations").unwrap();

        assert_eq!(
            names(dir.path()),
            [
                "notes.txt",
                "other_2020-01-01_00-00-00.log",
                "server_stations_2024-03-01_10-00-00.log",
            ]
        );
    }

    #[test]
    fn setup_creates_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested/logs");
        touch_parent_and(&log_dir, "unit_2000-01-01_00-00-00.log");

        let path = setup_logging(&log_dir, "debug", "unit").unwrap();
        log::info!("hello from the logger test");

        assert!(path.exists());
        let files = names(&log_dir);
        assert_eq!(files.len(), 2, "{files:?}");
        assert!(files.iter().all(|f| f.starts_with("unit_")));

        // Only one global logger per process.
        assert!(matches!(
            setup_logging(&log_dir, "info", "unit"),
            Err(LoggerError::AlreadyInstalled(_))
        ));
    }

    fn touch_parent_and(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        touch(dir, name);
    }
}
