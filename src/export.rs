use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mjhn_icons_core::{load_source, render_all, IconError, OUTPUT_SPEC};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::Config;
use crate::logger::log_line;
use crate::manifest::{manifest_json, MANIFEST_FILE_NAME};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("source asset unreadable: {0}")]
    SourceUnreadable(#[source] IconError),
    #[error("rendering failed: {0}")]
    RenderFailed(#[source] IconError),
    #[error("cannot build icons.json: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("cannot write {}: {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub source: PathBuf,
    pub tiny_source: Option<PathBuf>,
    pub out_dir: PathBuf,
    pub manifest: bool,
}

impl From<&Config> for ExportJob {
    fn from(cfg: &Config) -> Self {
        Self {
            source: cfg.source.clone(),
            tiny_source: cfg.tiny_source.clone(),
            out_dir: cfg.out_dir.clone(),
            manifest: cfg.manifest,
        }
    }
}

/// Render the whole Output Spec and write it to `job.out_dir`.
///
/// Sources are loaded and every file is encoded before the output directory
/// is touched, and files only replace their targets once all of them have
/// been staged, so a failed run leaves existing outputs as they were.
pub fn export(job: &ExportJob) -> Result<Vec<PathBuf>, ExportError> {
    let source = load_source(&job.source).map_err(ExportError::SourceUnreadable)?;
    let (w, h) = source.dimensions();
    log_line(&format!("loaded {} ({}x{})", job.source.display(), w, h));
    let tiny = match &job.tiny_source {
        Some(path) => Some(load_source(path).map_err(ExportError::SourceUnreadable)?),
        None => None,
    };

    let rendered = render_all(OUTPUT_SPEC, &source, tiny.as_ref().unwrap_or(&source))
        .map_err(ExportError::RenderFailed)?;
    let mut files = Vec::with_capacity(rendered.len() + 1);
    for icon in &rendered {
        let bytes = icon.encode().map_err(ExportError::RenderFailed)?;
        files.push((icon.file_name.clone(), bytes));
    }
    if job.manifest {
        files.push((MANIFEST_FILE_NAME.to_string(), manifest_json(OUTPUT_SPEC)?));
    }

    write_staged(&job.out_dir, &files)
}

fn write_failed(path: &Path) -> impl FnOnce(io::Error) -> ExportError {
    move |source| ExportError::OutputWriteFailed { path: path.to_path_buf(), source }
}

fn write_staged(out_dir: &Path, files: &[(String, Vec<u8>)]) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(out_dir).map_err(write_failed(out_dir))?;

    let mut staged = Vec::with_capacity(files.len());
    for (name, bytes) in files {
        let target = out_dir.join(name);
        if target.is_dir() {
            return Err(ExportError::OutputWriteFailed {
                path: target,
                source: io::Error::other("target is a directory"),
            });
        }
        let mut tmp = NamedTempFile::new_in(out_dir).map_err(write_failed(&target))?;
        tmp.write_all(bytes).map_err(write_failed(&target))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(write_failed(&target))?;
        }
        staged.push((tmp, target));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (tmp, target) in staged {
        tmp.persist(&target).map_err(|e| ExportError::OutputWriteFailed {
            path: target.clone(),
            source: e.error,
        })?;
        log_line(&format!("wrote {}", target.display()));
        written.push(target);
    }
    Ok(written)
}
