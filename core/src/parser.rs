use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IconError, ParseError};
use crate::models::SourceImage;

static DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\x21-\x7F])[ \t]+(\S.*)$").expect("definition pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingDefs,
    ReadingDefs,
    SeekingImage,
    ReadingImage,
}

/// Read a pixel-art design: a block of `<char> <label>` definitions, a blank
/// line, then the image rows. A blank line after the rows ends the image.
pub fn read_image_file(path: &Path) -> Result<SourceImage, IconError> {
    let content = fs::read_to_string(path)
        .map_err(|source| IconError::Read { path: path.to_path_buf(), source })?;
    parse_image(&content).map_err(|source| IconError::Parse { path: path.to_path_buf(), source })
}

pub fn parse_image(content: &str) -> Result<SourceImage, ParseError> {
    let mut state = State::SeekingDefs;
    let mut palette: BTreeMap<char, String> = BTreeMap::new();
    let mut width = 0usize;
    let mut rows: Vec<Vec<char>> = Vec::new();

    for (ix, raw) in content.lines().enumerate() {
        let lineno = ix + 1;
        let line = raw.trim_end();

        match state {
            State::SeekingDefs | State::ReadingDefs => {
                if line.is_empty() {
                    if state == State::ReadingDefs {
                        state = State::SeekingImage;
                    }
                    continue;
                }
                let Some(caps) = DEFINITION.captures(line) else {
                    return Err(ParseError::at(lineno, line, "expected definition"));
                };
                let color = caps[1].chars().next().unwrap_or_default();
                if palette.contains_key(&color) {
                    return Err(ParseError::at(
                        lineno,
                        line,
                        format!("multiple definitions for same color: {color}"),
                    ));
                }
                palette.insert(color, caps[2].to_string());
                state = State::ReadingDefs;
            }
            State::SeekingImage | State::ReadingImage => {
                if line.is_empty() {
                    if state == State::ReadingImage {
                        break;
                    }
                    continue;
                }
                if let Some(px) = line.chars().find(|c| !palette.contains_key(c)) {
                    return Err(ParseError::at(lineno, line, format!("undefined color: {px}")));
                }
                let row: Vec<char> = line.chars().collect();
                if state == State::SeekingImage {
                    width = row.len();
                    state = State::ReadingImage;
                } else if row.len() != width {
                    return Err(ParseError::at(lineno, line, "inconsistent image width"));
                }
                rows.push(row);
            }
        }
    }

    if state != State::ReadingImage {
        return Err(ParseError::eof("incomplete image"));
    }

    Ok(SourceImage { width: width as u32, height: rows.len() as u32, rows, palette })
}
