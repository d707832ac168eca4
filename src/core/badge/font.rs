// Typeface metrics for the badge name text.
//
// Reads the JSON typeface format used by three.js font loaders and measures the bounding
// box that extruded text geometry would occupy, without building the geometry itself.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::scene::Vec3;
use crate::core::error::AssetError;

/// Glyph size used for the name text
pub const TEXT_SIZE: f32 = 1.0;
/// Extrusion depth of the name text
pub const TEXT_DEPTH: f32 = 2.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Glyph {
    /// Horizontal advance in font units
    pub ha: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontBounds {
    pub y_min: f32,
    pub y_max: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typeface {
    #[serde(default)]
    pub family_name: Option<String>,
    pub resolution: f32,
    pub bounding_box: FontBounds,
    pub glyphs: HashMap<char, Glyph>,
}

impl Typeface {
    /// Loads a typeface JSON file without blocking the runtime thread.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let typeface: Typeface =
            serde_json::from_str(&content).map_err(|source| AssetError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Loaded font {} ({} glyphs)",
            typeface.family_name.as_deref().unwrap_or("<unnamed>"),
            typeface.glyphs.len()
        );
        Ok(typeface)
    }

    /// Bounding box of `text` rendered at [`TEXT_SIZE`] and extruded to [`TEXT_DEPTH`].
    ///
    /// Characters missing from the font fall back to `?`, then to nothing.
    pub fn measure(&self, text: &str) -> Vec3 {
        let units = TEXT_SIZE / self.resolution;
        let fallback = self.glyphs.get(&'?').map_or(0.0, |g| g.ha);
        let advance: f32 = text
            .chars()
            .map(|c| self.glyphs.get(&c).map_or(fallback, |g| g.ha))
            .sum();
        let height = (self.bounding_box.y_max - self.bounding_box.y_min) * units;
        Vec3::new(advance * units, height, TEXT_DEPTH)
    }
}
