use std::path::PathBuf;

use thiserror::Error;

/// Syntax error in a pixel-art source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", on_line(.line))]
pub struct ParseError {
    /// 1-based line number and the offending line, when one is known.
    pub line: Option<(usize, String)>,
    pub message: String,
}

impl ParseError {
    pub(crate) fn at(lineno: usize, line: &str, message: impl Into<String>) -> Self {
        Self { line: Some((lineno, line.to_string())), message: message.into() }
    }

    pub(crate) fn eof(message: impl Into<String>) -> Self {
        Self { line: None, message: message.into() }
    }
}

fn on_line(line: &Option<(usize, String)>) -> String {
    match line {
        Some((lineno, text)) => format!("\n  on line {lineno}: {text}"),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum IconError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("a {width}x{height} source does not fit into {target}")]
    DoesNotFit { width: u32, height: u32, target: String },
    #[error("cannot determine corner rounding at ({x}, {y})")]
    CornerRounding { x: u32, y: u32 },
    #[error("no colour for `{label}` at ({x}, {y})")]
    UnhandledLabel { label: String, x: u32, y: u32 },
    #[error("cannot encode {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}
