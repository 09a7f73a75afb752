use mjhn_icons_core::{IconKind, OutputEntry, SafeZone};
use serde::Serialize;

pub const MANIFEST_FILE_NAME: &str = "icons.json";

/// One entry of a web app manifest `icons` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub purpose: String,
}

impl ManifestIcon {
    pub fn from_entry(entry: &OutputEntry) -> Self {
        let size = entry.size();
        let maskable = matches!(
            entry.kind,
            IconKind::App(spec) if spec.safe_zone == SafeZone::Circle && spec.safe_zone_size < 1.0
        );
        Self {
            src: entry.file_name.to_string(),
            sizes: format!("{size}x{size}"),
            mime_type: entry.format().mime_type().to_string(),
            purpose: if maskable { "maskable" } else { "any" }.to_string(),
        }
    }
}

pub fn manifest_json(entries: &[OutputEntry]) -> serde_json::Result<Vec<u8>> {
    let icons: Vec<ManifestIcon> = entries.iter().map(ManifestIcon::from_entry).collect();
    let mut out = serde_json::to_vec_pretty(&icons)?;
    out.push(b'\n');
    Ok(out)
}
