use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use once_cell::sync::Lazy;

static LOG_FILE: Lazy<Mutex<Option<PathBuf>>> = Lazy::new(|| Mutex::new(default_log_path()));

fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mjhn-icons").map(|d| d.data_local_dir().to_path_buf())
}

pub fn default_log_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("mjhn-icons.log"))
}

/// Redirect logging to `path`; `None` switches file logging off.
pub fn set_log_path(path: Option<PathBuf>) {
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = path;
    }
}

pub fn log_path() -> Option<PathBuf> {
    LOG_FILE.lock().ok().and_then(|g| g.clone())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn log_line(line: &str) {
    if let Some(path) = log_path() {
        append_line(&path, line);
    }
}

fn append_line(path: &Path, line: &str) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(f, "[{}] {}", timestamp(), line);
    }
}

pub fn log_error(prefix: &str, e: &dyn std::error::Error) {
    log_line(&format!("ERROR: {}: {}", prefix, e));
}
