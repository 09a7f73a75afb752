use std::collections::BTreeMap;

use image::Rgba;
use serde::Serialize;

/// Palette-indexed source image read from a `.txt` design file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub rows: Vec<Vec<char>>,
    pub palette: BTreeMap<char, String>,
}

impl SourceImage {
    /// Label of the pixel at (x, y). Every pixel char is guaranteed to be in
    /// the palette by the parser.
    pub fn label_at(&self, x: u32, y: u32) -> Option<&str> {
        let c = self.rows.get(y as usize)?.get(x as usize)?;
        self.palette.get(c).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeZone {
    Rectangle,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Masking {
    None,
    MacOs,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IconSpec {
    pub full_size: u32,
    pub safe_zone: SafeZone,
    pub safe_zone_size: f64,
    pub masking: Masking,
}

impl IconSpec {
    const fn new(full_size: u32, safe_zone: SafeZone, safe_zone_size: f64, masking: Masking) -> Self {
        Self { full_size, safe_zone, safe_zone_size, masking }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconKind {
    /// 16x16 ICO drawn one source pixel per icon pixel.
    Browser,
    App(IconSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconFormat {
    Png,
    Ico,
}

impl IconFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            IconFormat::Png => "image/png",
            IconFormat::Ico => "image/x-icon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputEntry {
    pub file_name: &'static str,
    #[serde(flatten)]
    pub kind: IconKind,
}

impl OutputEntry {
    pub fn size(&self) -> u32 {
        match self.kind {
            IconKind::Browser => BROWSER_ICON_SIZE,
            IconKind::App(spec) => spec.full_size,
        }
    }

    pub fn format(&self) -> IconFormat {
        match self.kind {
            IconKind::Browser => IconFormat::Ico,
            IconKind::App(_) => IconFormat::Png,
        }
    }
}

pub const BROWSER_ICON_SIZE: u32 = 16;

const fn app(file_name: &'static str, full_size: u32, safe_zone: SafeZone, safe_zone_size: f64, masking: Masking) -> OutputEntry {
    OutputEntry { file_name, kind: IconKind::App(IconSpec::new(full_size, safe_zone, safe_zone_size, masking)) }
}

/// Every file produced by an export run.
pub const OUTPUT_SPEC: &[OutputEntry] = &[
    OutputEntry { file_name: "mjhn.ico", kind: IconKind::Browser },
    app("mjhn-ios-180.png", 180, SafeZone::Rectangle, 0.8, Masking::None),
    app("mjhn-ios-167.png", 167, SafeZone::Rectangle, 0.8, Masking::None),
    app("mjhn-ios-152.png", 152, SafeZone::Rectangle, 0.8, Masking::None),
    app("mjhn-macos-512.png", 512, SafeZone::Rectangle, 0.8, Masking::MacOs),
    app("mjhn-macos-256.png", 256, SafeZone::Rectangle, 0.8, Masking::MacOs),
    app("mjhn-macos-128.png", 128, SafeZone::Rectangle, 0.8, Masking::MacOs),
    app("mjhn-full-192.png", 192, SafeZone::Rectangle, 0.9, Masking::None),
    app("mjhn-full-512.png", 512, SafeZone::Rectangle, 0.9, Masking::None),
    app("mjhn-maskable-192.png", 192, SafeZone::Circle, 0.8, Masking::None),
    app("mjhn-maskable-512.png", 512, SafeZone::Circle, 0.8, Masking::None),
    app("mjhn-github-512.png", 512, SafeZone::Circle, 1.0, Masking::None),
];

/// Label to colour mapping used when drawing a source.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    entries: &'static [(&'static str, [u8; 4])],
}

impl Palette {
    pub fn color(&self, label: &str) -> Option<Rgba<u8>> {
        self.entries.iter().find(|(l, _)| *l == label).map(|(_, c)| Rgba(*c))
    }

    pub fn background(&self) -> Rgba<u8> {
        self.color(BACKGROUND).unwrap_or(Rgba([0, 0, 0, 0]))
    }
}

pub const BACKGROUND: &str = "background";
pub const CORNER_ORIENTATION_1: &str = "corner rounding (orientation 1)";
pub const CORNER_ORIENTATION_2: &str = "corner rounding (orientation 2)";

pub const BROWSER_ICON_PALETTE: Palette = Palette {
    entries: &[
        (BACKGROUND, [0, 0, 0, 0]),
        ("body", [255, 255, 255, 255]),
        ("border", [0, 0, 0, 255]),
        ("shadow", [0, 0, 0, 127]),
    ],
};

pub const APP_ICON_PALETTE: Palette = Palette {
    entries: &[
        (BACKGROUND, [227, 227, 106, 255]),
        ("body", [255, 255, 255, 255]),
        ("border", [0, 0, 0, 255]),
        ("shadow", [15, 31, 63, 255]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_spec_names_are_unique() {
        let mut names: Vec<_> = OUTPUT_SPEC.iter().map(|e| e.file_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), OUTPUT_SPEC.len());
    }

    #[test]
    fn browser_entry_is_ico() {
        let browser = OUTPUT_SPEC.iter().find(|e| e.kind == IconKind::Browser).unwrap();
        assert_eq!(browser.format(), IconFormat::Ico);
        assert_eq!(browser.size(), 16);
    }

    #[test]
    fn palette_lookup() {
        assert_eq!(APP_ICON_PALETTE.color("shadow"), Some(Rgba([15, 31, 63, 255])));
        assert_eq!(APP_ICON_PALETTE.color(CORNER_ORIENTATION_1), None);
        assert_eq!(BROWSER_ICON_PALETTE.background(), Rgba([0, 0, 0, 0]));
    }
}
