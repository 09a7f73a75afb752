use std::path::Path;

use image::codecs::ico::IcoEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, ImageError, Rgba, RgbaImage};

use crate::error::IconError;
use crate::models::{
    IconFormat, IconKind, IconSpec, Masking, OutputEntry, Palette, SafeZone, SourceImage,
    APP_ICON_PALETTE, BROWSER_ICON_PALETTE, BROWSER_ICON_SIZE, CORNER_ORIENTATION_1,
    CORNER_ORIENTATION_2,
};
use crate::parser::read_image_file;
use crate::shape::{in_rounded_square, point_in_triangle};

/// macOS app icons draw their body on an 824pt square inside a 1024pt canvas.
const MACOS_BODY_RATIO: f64 = 824.0 / 1024.0;
const MACOS_CORNER_RATIO: f32 = 0.225;

#[derive(Debug, Clone)]
pub enum SourceAsset {
    PixelArt(SourceImage),
    Raster(RgbaImage),
}

impl SourceAsset {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SourceAsset::PixelArt(img) => (img.width, img.height),
            SourceAsset::Raster(img) => img.dimensions(),
        }
    }
}

/// Load a design. `.txt` files are pixel-art palettes, anything else goes
/// through the image decoders.
pub fn load_source(path: &Path) -> Result<SourceAsset, IconError> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    if is_text {
        return read_image_file(path).map(SourceAsset::PixelArt);
    }
    match image::open(path) {
        Ok(img) => Ok(SourceAsset::Raster(img.to_rgba8())),
        Err(ImageError::IoError(source)) => Err(IconError::Read { path: path.to_path_buf(), source }),
        Err(source) => Err(IconError::Decode { path: path.to_path_buf(), source }),
    }
}

#[derive(Debug, Clone)]
pub struct RenderedIcon {
    pub file_name: String,
    pub format: IconFormat,
    pub image: RgbaImage,
}

impl RenderedIcon {
    pub fn encode(&self) -> Result<Vec<u8>, IconError> {
        let (w, h) = self.image.dimensions();
        let mut buf = Vec::new();
        let res = match self.format {
            IconFormat::Png => PngEncoder::new(&mut buf).write_image(self.image.as_raw(), w, h, ColorType::Rgba8),
            IconFormat::Ico => IcoEncoder::new(&mut buf).write_image(self.image.as_raw(), w, h, ColorType::Rgba8),
        };
        res.map_err(|source| IconError::Encode { name: self.file_name.clone(), source })?;
        Ok(buf)
    }
}

/// Render one Output Spec entry. The browser icon is drawn from `tiny`,
/// app icons from `source`.
pub fn render_entry(entry: &OutputEntry, source: &SourceAsset, tiny: &SourceAsset) -> Result<RenderedIcon, IconError> {
    let image = match entry.kind {
        IconKind::Browser => render_browser_icon(tiny)?,
        IconKind::App(spec) => render_app_icon(source, &spec, entry.file_name)?,
    };
    Ok(RenderedIcon { file_name: entry.file_name.to_string(), format: entry.format(), image })
}

pub fn render_browser_icon(source: &SourceAsset) -> Result<RgbaImage, IconError> {
    let size = BROWSER_ICON_SIZE;
    match source {
        SourceAsset::PixelArt(src) => {
            if src.width > size || src.height > size {
                return Err(IconError::DoesNotFit {
                    width: src.width,
                    height: src.height,
                    target: format!("the {size}x{size} browser icon"),
                });
            }
            let x_ofs = (size - src.width) / 2;
            let y_ofs = (size - src.height) / 2;
            let mut target = RgbaImage::from_pixel(size, size, BROWSER_ICON_PALETTE.background());
            for y in 0..src.height {
                for x in 0..src.width {
                    let label = src.label_at(x, y).unwrap_or_default();
                    // a corner cell is a single pixel here, so only its diagonal survives
                    let c = match corner_sides(src, label, x, y) {
                        Some((first, second)) => {
                            let (c1, c2) = corner_colors(&BROWSER_ICON_PALETTE, first, second, x, y)?;
                            average(c1, c2)
                        }
                        None => plain_color(&BROWSER_ICON_PALETTE, src, x, y)?,
                    };
                    target.put_pixel(x + x_ofs, y + y_ofs, c);
                }
            }
            Ok(target)
        }
        SourceAsset::Raster(img) => {
            let (w, h) = img.dimensions();
            let scale = size as f64 / w.max(h) as f64;
            Ok(fit_onto(img, scale, size, Rgba([0, 0, 0, 0])))
        }
    }
}

pub fn render_app_icon(source: &SourceAsset, spec: &IconSpec, name: &str) -> Result<RgbaImage, IconError> {
    let mut target = match source {
        SourceAsset::PixelArt(src) => draw_pixel_art(src, spec, name)?,
        SourceAsset::Raster(img) => {
            let (w, h) = img.dimensions();
            let full = spec.full_size as f64;
            let scale = match spec.safe_zone {
                SafeZone::Rectangle => (full * spec.safe_zone_size).round() / w.max(h) as f64,
                SafeZone::Circle => full * spec.safe_zone_size / ((w as f64).powi(2) + (h as f64).powi(2)).sqrt(),
            };
            fit_onto(img, scale, spec.full_size, APP_ICON_PALETTE.background())
        }
    };
    if spec.masking == Masking::MacOs {
        apply_macos_mask(&mut target);
    }
    Ok(target)
}

/// Integer magnification that fits a `width`x`height` pixel-art design into
/// the safe zone of `spec`, or `None` if it cannot fit.
pub fn scale_factor(width: u32, height: u32, spec: &IconSpec) -> Option<u32> {
    if width == 0 || height == 0 {
        return None;
    }
    let full = spec.full_size as f64;
    let f = match spec.safe_zone {
        SafeZone::Rectangle => {
            let s = width.max(height);
            let m = (full * spec.safe_zone_size).round() as u32;
            if s > m {
                return None;
            }
            m / s
        }
        SafeZone::Circle => {
            let ratio = height as f64 / width as f64;
            let s = (1.0 + ratio * ratio).sqrt() * width as f64;
            let m = full * spec.safe_zone_size;
            (m / s).floor() as u32
        }
    };
    (f > 0).then_some(f)
}

fn draw_pixel_art(src: &SourceImage, spec: &IconSpec, name: &str) -> Result<RgbaImage, IconError> {
    let f = scale_factor(src.width, src.height, spec).ok_or_else(|| IconError::DoesNotFit {
        width: src.width,
        height: src.height,
        target: name.to_string(),
    })?;
    let full = spec.full_size;
    let ofs_x = (full - f * src.width) / 2;
    let ofs_y = (full - f * src.height) / 2;
    let mut target = RgbaImage::from_pixel(full, full, APP_ICON_PALETTE.background());

    for y in 0..src.height {
        for x in 0..src.width {
            let x0 = ofs_x + f * x;
            let y0 = ofs_y + f * y;
            let label = src.label_at(x, y).unwrap_or_default();
            if let Some(c) = APP_ICON_PALETTE.color(label) {
                fill_cell(&mut target, x0, y0, f, |_, _| c);
                continue;
            }
            let Some((first, second)) = corner_sides(src, label, x, y) else {
                return Err(IconError::UnhandledLabel { label: label.to_string(), x, y });
            };
            let (c1, c2) = corner_colors(&APP_ICON_PALETTE, first, second, x, y)?;
            let c3 = average(c1, c2);
            let last = (f - 1) as f32;
            match label {
                CORNER_ORIENTATION_1 => {
                    fill_cell(&mut target, x0, y0, f, |dx, dy| {
                        if dx == dy {
                            c3
                        } else if point_in_triangle(dx as f32, dy as f32, (0.0, 0.0), (last, 0.0), (last, last)) {
                            c1
                        } else {
                            c2
                        }
                    });
                }
                _ => {
                    fill_cell(&mut target, x0, y0, f, |dx, dy| {
                        if dx + dy == f - 1 {
                            c3
                        } else if point_in_triangle(dx as f32, dy as f32, (last, last), (0.0, last), (last, 0.0)) {
                            c2
                        } else {
                            c1
                        }
                    });
                }
            }
        }
    }
    Ok(target)
}

fn plain_color(palette: &Palette, src: &SourceImage, x: u32, y: u32) -> Result<Rgba<u8>, IconError> {
    let label = src.label_at(x, y).unwrap_or_default();
    palette
        .color(label)
        .ok_or_else(|| IconError::UnhandledLabel { label: label.to_string(), x, y })
}

fn fill_cell(target: &mut RgbaImage, x0: u32, y0: u32, f: u32, color: impl Fn(u32, u32) -> Rgba<u8>) {
    for dy in 0..f {
        for dx in 0..f {
            target.put_pixel(x0 + dx, y0 + dy, color(dx, dy));
        }
    }
}

/// One side of a corner pixel, decided from its two neighbours on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side<'a> {
    Known(Option<&'a str>),
    Ambiguous(&'a str, &'a str),
}

fn resolve<'a>(a: Option<&'a str>, b: Option<&'a str>) -> Side<'a> {
    match (a, b) {
        (None, b) => Side::Known(b),
        (a, None) => Side::Known(a),
        (Some(a), Some(b)) if a == b => Side::Known(Some(a)),
        (Some(a), Some(b)) => Side::Ambiguous(a, b),
    }
}

fn settle<'a>(first: Side<'a>, second: Side<'a>) -> Option<(Option<&'a str>, Option<&'a str>)> {
    let pick = |a: &'a str, b: &'a str, other: Option<&'a str>| if Some(a) != other { Some(a) } else { Some(b) };
    match (first, second) {
        (Side::Ambiguous(..), Side::Ambiguous(..)) => None,
        (Side::Ambiguous(a, b), Side::Known(v2)) => Some((pick(a, b, v2), v2)),
        (Side::Known(v1), Side::Ambiguous(a, b)) => Some((v1, pick(a, b, v1))),
        (Side::Known(v1), Side::Known(v2)) => Some((v1, v2)),
    }
}

/// The two sides of a corner cell: (north/east, south/west) for orientation 1
/// and (north/west, south/east) for orientation 2. `None` for other labels.
fn corner_sides<'a>(src: &'a SourceImage, label: &str, x: u32, y: u32) -> Option<(Side<'a>, Side<'a>)> {
    let n = if y > 0 { src.label_at(x, y - 1) } else { None };
    let s = src.label_at(x, y + 1);
    let w = if x > 0 { src.label_at(x - 1, y) } else { None };
    let e = src.label_at(x + 1, y);
    match label {
        CORNER_ORIENTATION_1 => Some((resolve(n, e), resolve(s, w))),
        CORNER_ORIENTATION_2 => Some((resolve(n, w), resolve(s, e))),
        _ => None,
    }
}

fn corner_colors(
    palette: &Palette,
    first: Side<'_>,
    second: Side<'_>,
    x: u32,
    y: u32,
) -> Result<(Rgba<u8>, Rgba<u8>), IconError> {
    let (v1, v2) = settle(first, second).ok_or(IconError::CornerRounding { x, y })?;
    let color = |v: Option<&str>| {
        v.and_then(|l| palette.color(l)).ok_or_else(|| IconError::UnhandledLabel {
            label: v.unwrap_or("<outside of image>").to_string(),
            x,
            y,
        })
    };
    Ok((color(v1)?, color(v2)?))
}

fn average(a: Rgba<u8>, b: Rgba<u8>) -> Rgba<u8> {
    let mut out = [0u8; 4];
    for (i, o) in out.iter_mut().enumerate() {
        *o = ((a.0[i] as u16 + b.0[i] as u16) / 2) as u8;
    }
    Rgba(out)
}

fn fit_onto(img: &RgbaImage, scale: f64, size: u32, background: Rgba<u8>) -> RgbaImage {
    let (w, h) = img.dimensions();
    let tw = ((w as f64 * scale).floor() as u32).clamp(1, size);
    let th = ((h as f64 * scale).floor() as u32).clamp(1, size);
    let resized = imageops::resize(img, tw, th, FilterType::Lanczos3);
    let mut target = RgbaImage::from_pixel(size, size, background);
    imageops::overlay(&mut target, &resized, ((size - tw) / 2) as i64, ((size - th) / 2) as i64);
    target
}

fn apply_macos_mask(target: &mut RgbaImage) {
    let full = target.width();
    let side = (full as f64 * MACOS_BODY_RATIO).round() as f32;
    let radius = side * MACOS_CORNER_RATIO;
    let c = full as f32 * 0.5;
    for (x, y, px) in target.enumerate_pixels_mut() {
        if !in_rounded_square(x as f32 + 0.5, y as f32 + 0.5, c, c, side, radius) {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_image;

    const BG: Rgba<u8> = Rgba([227, 227, 106, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn spec(full_size: u32, safe_zone: SafeZone, safe_zone_size: f64) -> IconSpec {
        IconSpec { full_size, safe_zone, safe_zone_size, masking: Masking::None }
    }

    fn pixel_art(text: &str) -> SourceAsset {
        SourceAsset::PixelArt(parse_image(text).unwrap())
    }

    #[test]
    fn rectangle_scale_factor() {
        assert_eq!(scale_factor(10, 9, &spec(180, SafeZone::Rectangle, 0.8)), Some(14));
        assert_eq!(scale_factor(10, 10, &spec(167, SafeZone::Rectangle, 0.8)), Some(13));
        assert_eq!(scale_factor(200, 10, &spec(180, SafeZone::Rectangle, 0.8)), None);
    }

    #[test]
    fn circle_scale_factor() {
        // 192 * 0.8 = 153.6, diagonal of 10x10 is 14.14
        assert_eq!(scale_factor(10, 10, &spec(192, SafeZone::Circle, 0.8)), Some(10));
        assert_eq!(scale_factor(200, 200, &spec(192, SafeZone::Circle, 0.8)), None);
    }

    #[test]
    fn plain_cells_are_scaled_and_centred() {
        let src = pixel_art("o body\n# border\n\no#\n");
        let img = render_app_icon(&src, &spec(10, SafeZone::Rectangle, 1.0), "t.png").unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(*img.get_pixel(0, 0), BG);
        assert_eq!(*img.get_pixel(0, 2), WHITE);
        assert_eq!(*img.get_pixel(4, 6), WHITE);
        assert_eq!(*img.get_pixel(5, 2), BLACK);
        assert_eq!(*img.get_pixel(9, 7), BG);
    }

    #[test]
    fn corner_orientation_1_splits_along_main_diagonal() {
        let src = pixel_art(
            ". background\n# border\n\\ corner rounding (orientation 1)\n\n...\n#\\.\n###\n",
        );
        let img = render_app_icon(&src, &spec(9, SafeZone::Rectangle, 1.0), "t.png").unwrap();
        // cell (1, 1) spans pixels 3..6
        assert_eq!(*img.get_pixel(3, 3), Rgba([113, 113, 53, 255]));
        assert_eq!(*img.get_pixel(5, 3), BG);
        assert_eq!(*img.get_pixel(3, 5), BLACK);
    }

    #[test]
    fn corner_orientation_2_splits_along_anti_diagonal() {
        let src = pixel_art(
            ". background\n# border\n/ corner rounding (orientation 2)\n\n...\n./#\n.##\n",
        );
        let img = render_app_icon(&src, &spec(9, SafeZone::Rectangle, 1.0), "t.png").unwrap();
        assert_eq!(*img.get_pixel(3, 3), BG);
        assert_eq!(*img.get_pixel(5, 3), Rgba([113, 113, 53, 255]));
        assert_eq!(*img.get_pixel(5, 5), BLACK);
    }

    #[test]
    fn ambiguous_corner_is_an_error() {
        let src = pixel_art(
            ". background\n# border\n\\ corner rounding (orientation 1)\n\n.#.\n.\\.\n.#.\n",
        );
        let err = render_app_icon(&src, &spec(9, SafeZone::Rectangle, 1.0), "t.png").unwrap_err();
        assert!(matches!(err, IconError::CornerRounding { x: 1, y: 1 }));
    }

    #[test]
    fn ambiguous_side_picks_the_other_label() {
        let known = resolve(Some("border"), Some("border"));
        let ambiguous = resolve(Some("border"), Some("body"));
        assert_eq!(settle(ambiguous, known), Some((Some("body"), Some("border"))));
        assert_eq!(settle(known, ambiguous), Some((Some("border"), Some("body"))));
    }

    #[test]
    fn unknown_label_is_an_error() {
        let src = pixel_art("x sparkle\n\nx\n");
        let err = render_app_icon(&src, &spec(16, SafeZone::Rectangle, 1.0), "t.png").unwrap_err();
        assert!(matches!(err, IconError::UnhandledLabel { .. }));
    }

    #[test]
    fn macos_mask_clears_the_corners() {
        let src = pixel_art("o body\n\no\n");
        let mut s = spec(128, SafeZone::Rectangle, 0.8);
        s.masking = Masking::MacOs;
        let img = render_app_icon(&src, &s, "t.png").unwrap();
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(16, 16).0[3], 0);
        assert_eq!(*img.get_pixel(64, 64), WHITE);
        assert_eq!(*img.get_pixel(64, 12), BG);
    }

    #[test]
    fn browser_icon_centres_small_sources() {
        let src = pixel_art("o body\n\noo\noo\n");
        let img = render_browser_icon(&src).unwrap();
        assert_eq!(img.dimensions(), (16, 16));
        assert_eq!(*img.get_pixel(7, 7), WHITE);
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn browser_icon_rejects_large_sources() {
        let row = "o".repeat(17);
        let src = pixel_art(&format!("o body\n\n{row}\n"));
        assert!(matches!(render_browser_icon(&src), Err(IconError::DoesNotFit { .. })));
    }

    #[test]
    fn raster_sources_are_fitted() {
        let src = SourceAsset::Raster(RgbaImage::from_pixel(40, 20, WHITE));
        let img = render_app_icon(&src, &spec(100, SafeZone::Rectangle, 0.8), "t.png").unwrap();
        assert_eq!(img.dimensions(), (100, 100));
        assert_eq!(*img.get_pixel(0, 0), BG);
        let centre = img.get_pixel(50, 50);
        assert!(centre.0[0] >= 250 && centre.0[3] == 255);
        let ico = render_browser_icon(&src).unwrap();
        assert_eq!(ico.dimensions(), (16, 16));
    }

    #[test]
    fn browser_icon_settles_corner_pixels() {
        let src = pixel_art(
            ". background\n# border\n/ corner rounding (orientation 2)\n\\ corner rounding (orientation 1)\n\n.....\n./#\\.\n.#.#.\n",
        );
        let img = render_browser_icon(&src).unwrap();
        // 5x3 design placed at (5, 6)
        assert_eq!(*img.get_pixel(6, 7), Rgba([0, 0, 0, 127]));
        assert_eq!(*img.get_pixel(8, 7), Rgba([0, 0, 0, 127]));
        assert_eq!(*img.get_pixel(7, 7), BLACK);
        assert_eq!(*img.get_pixel(7, 8), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn corner_on_the_image_edge_uses_the_present_neighbour() {
        let src = pixel_art(
            ". background\n# border\n\\ corner rounding (orientation 1)\n\n\\.\n##\n",
        );
        let img = render_app_icon(&src, &spec(6, SafeZone::Rectangle, 1.0), "t.png").unwrap();
        assert_eq!(*img.get_pixel(0, 0), Rgba([113, 113, 53, 255]));
        assert_eq!(*img.get_pixel(2, 0), BG);
        assert_eq!(*img.get_pixel(0, 2), BLACK);
    }

    #[test]
    fn lone_corner_has_no_colour() {
        let src = pixel_art("\\ corner rounding (orientation 1)\n\n\\\n");
        let err = render_app_icon(&src, &spec(8, SafeZone::Rectangle, 1.0), "t.png").unwrap_err();
        match err {
            IconError::UnhandledLabel { label, x: 0, y: 0 } => assert_eq!(label, "<outside of image>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn raster_sources_fit_the_circle_zone() {
        let src = SourceAsset::Raster(RgbaImage::from_pixel(30, 40, WHITE));
        // diagonal 50 scaled to 80 gives a 48x64 image at (26, 18)
        let img = render_app_icon(&src, &spec(100, SafeZone::Circle, 0.8), "t.png").unwrap();
        assert_eq!(img.dimensions(), (100, 100));
        assert_eq!(*img.get_pixel(50, 10), BG);
        assert_eq!(*img.get_pixel(20, 50), BG);
        let centre = img.get_pixel(50, 50);
        assert!(centre.0[0] >= 250 && centre.0[3] == 255);
    }

    #[test]
    fn encoding_is_deterministic() {
        let src = pixel_art("o body\n\no\n");
        let icon = RenderedIcon {
            file_name: "a.png".into(),
            format: IconFormat::Png,
            image: render_app_icon(&src, &spec(32, SafeZone::Circle, 0.8), "a.png").unwrap(),
        };
        let a = icon.encode().unwrap();
        assert_eq!(a, icon.encode().unwrap());
        let decoded = image::load_from_memory(&a).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 32));
    }
}
