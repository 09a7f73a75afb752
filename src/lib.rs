pub mod config;
pub mod export;
pub mod logger;
pub mod manifest;

pub use export::{export, ExportError, ExportJob};
pub use mjhn_icons_core as icons;
