//! Source parsing, the fixed output table and icon rendering.
//!
//! Nothing in this crate writes files; callers get encoded bytes back from
//! [`RenderedIcon::encode`] and decide where they go.

mod error;
mod models;
mod parser;
mod render;
mod shape;

pub use error::{IconError, ParseError};
pub use models::*;
pub use parser::{parse_image, read_image_file};
pub use render::{
    load_source, render_app_icon, render_browser_icon, render_entry, scale_factor, RenderedIcon,
    SourceAsset,
};

/// Render every entry of `spec`, stopping at the first failure.
pub fn render_all(spec: &[OutputEntry], source: &SourceAsset, tiny: &SourceAsset) -> Result<Vec<RenderedIcon>, IconError> {
    spec.iter().map(|entry| render_entry(entry, source, tiny)).collect()
}
