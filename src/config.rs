use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use crate::logger;

pub const CONFIG_FILE_NAME: &str = "icons.conf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: PathBuf,
    /// Design for the browser icon; the main source is used when unset.
    pub tiny_source: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub manifest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::from("mjhn-icon.txt"),
            tiny_source: Some(PathBuf::from("mjhn-icon-tiny.txt")),
            out_dir: PathBuf::from("out"),
            log_file: logger::default_log_path(),
            manifest: false,
        }
    }
}

#[derive(Debug, Error)]
#[error("cannot read config {}: {source}", path.display())]
pub struct ConfigError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mjhn-icons").map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}

/// Load configuration. An explicit path must exist; otherwise the platform
/// config dir is tried first, then `./icons.conf`, then the defaults.
pub fn read_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError { path: path.to_path_buf(), source })?;
        return Ok(parse_config(&content));
    }
    let candidates = config_file_path().into_iter().chain([PathBuf::from(CONFIG_FILE_NAME)]);
    Ok(read_first(candidates))
}

/// Parse the first readable file of `candidates`, or fall back to defaults.
fn read_first(candidates: impl IntoIterator<Item = PathBuf>) -> Config {
    for path in candidates {
        if let Ok(content) = fs::read_to_string(&path) {
            return parse_config(&content);
        }
    }
    Config::default()
}

pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim();
            match k.trim() {
                "source" => cfg.source = PathBuf::from(v),
                "tiny_source" => cfg.tiny_source = (!v.is_empty()).then(|| PathBuf::from(v)),
                "out_dir" => cfg.out_dir = PathBuf::from(v),
                "log_file" => cfg.log_file = (!v.is_empty()).then(|| PathBuf::from(v)),
                "manifest" => cfg.manifest = v.parse::<u8>().map(|n| n != 0).unwrap_or(false),
                _ => {}
            }
        }
    }
    cfg
}
