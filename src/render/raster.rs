use std::path::Path;

use anyhow::Context;

use crate::assets::decode::{DecodedImage, encode_png};
use crate::assets::fontdb::FontDatabase;
use crate::foundation::error::{SceneError, SceneResult};
use crate::materialize::host::NodeId;
use crate::materialize::scene_host::SceneHost;
use crate::render::svg::to_svg;

/// Largest raster edge accepted, in pixels.
const MAX_DIM: u32 = 16_384;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Output pixels per scene unit.
    pub scale: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Render the subtree under `root` over a white background.
#[tracing::instrument(skip(host, fonts, opts))]
pub fn rasterize(
    host: &SceneHost,
    root: NodeId,
    fonts: &FontDatabase,
    opts: &RasterOptions,
) -> SceneResult<DecodedImage> {
    if !opts.scale.is_finite() || opts.scale <= 0.0 {
        return Err(SceneError::validation(format!(
            "raster scale must be positive, got {}",
            opts.scale
        )));
    }
    let svg = to_svg(host, root)?;
    let usvg_opts = usvg::Options {
        fontdb: fonts.database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&svg, &usvg_opts)
        .map_err(|e| SceneError::decode(format!("reconstructed svg did not parse: {e}")))?;

    let size = tree.size();
    let to_px = |v: f32| (f64::from(v) * opts.scale).ceil().max(1.0) as u32;
    let (width, height) = (to_px(size.width()), to_px(size.height()));
    if width > MAX_DIM || height > MAX_DIM {
        return Err(SceneError::validation(format!(
            "raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| SceneError::validation("failed to allocate pixmap"))?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);
    let scale = opts.scale as f32;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let mut rgba8 = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba8.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    tracing::debug!(width, height, "rasterized");
    Ok(DecodedImage {
        width,
        height,
        rgba8,
    })
}

pub fn write_png(img: &DecodedImage, path: &Path) -> SceneResult<()> {
    let bytes = encode_png(img)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
