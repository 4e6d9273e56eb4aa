//! Session logger — a `log` backend that writes to one file in the OS data
//! directory.
//!
//! The file is **truncated at each launch**, so it only holds the most recent
//! session.  Warnings and errors are mirrored to stderr so command-line users
//! see them without opening the file.
//!
//! Log location:
//!   Windows:  `%APPDATA%\filmstock\filmstock.log`
//!   Linux:    `~/.local/share/filmstock/filmstock.log`
//!   macOS:    `~/Library/Application Support/filmstock/filmstock.log`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<SessionLogger> = OnceLock::new();

struct SessionLogger {
    file: Option<Mutex<File>>,
    path: PathBuf,
    level: LevelFilter,
}

impl SessionLogger {
    fn write_line(&self, line: &str) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = writeln!(file, "{}", line);
        }
    }
}

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("[{}] [{}] {}", timestamp(), record.level(), record.args());
        self.write_line(&line);
        if record.level() <= Level::Warn || self.file.is_none() {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        if let Some(mutex) = &self.file
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Returns the path of the current session log, once `init` has run.
pub fn log_path() -> Option<&'static PathBuf> {
    LOGGER.get().map(|l| &l.path)
}

/// Install the session logger.  `verbose` lowers the threshold to `Debug`.
///
/// * Creates (or truncates) the log file.  Failing to open it is not fatal:
///   records then go to stderr only.
/// * Installs a panic hook that records the panic before the default handler.
pub fn init(verbose: bool) {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = match OpenOptions::new().create(true).write(true).truncate(true).open(&path) {
        Ok(f) => Some(Mutex::new(f)),
        Err(e) => {
            eprintln!("[logger] failed to open log file {:?}: {}", path, e);
            None
        }
    };

    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let logger = LOGGER.get_or_init(|| SessionLogger { file, path, level });
    if log::set_logger(logger).is_err() {
        // Already installed (tests, repeated init).
        return;
    }
    log::set_max_level(level);

    logger.write_line(&format!("=== filmstock session started (unix {}) ===", unix_secs()));
    logger.write_line(&format!("Log file: {}", logger.path.display()));
    logger.write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(l) = LOGGER.get() {
            l.write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        }
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    data_dir().join("filmstock").join("filmstock.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// HH:MM:SS (UTC) within the current day.
fn timestamp() -> String {
    let secs = unix_secs();
    format!("{:02}:{:02}:{:02}", (secs % 86400) / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_lives_under_app_folder() {
        let p = log_file_path();
        assert!(p.ends_with("filmstock/filmstock.log"));
    }

    #[test]
    fn timestamp_is_clock_shaped() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.matches(':').count(), 2);
    }
}
