use crate::build::images::{ImageRole, ImageSink};
use crate::foundation::error::SceneResult;
use crate::normalize::color::{normalize_color, normalize_opacity};
use crate::normalize::effects::normalize_gradient;
use crate::normalize::path::subpaths_to_path_data;
use crate::scene::model::{
    AffineData, BlendMode, NodeKind, PlacedData, ShapeData, SmartFilterData, StrokeData,
    VectorFill, VectorPathData,
};
use crate::source::model::{
    LayerKind, PlacedKind, SourceLayer, SourceSmartFilter, SourceVectorFill, SourceVectorStroke,
};

/// Suffix for shapes whose vector path could not be rebuilt.
pub const VECTOR_FAILED_SUFFIX: &str = " [Vector Failed]";

/// Shape payload for one layer, plus a name suffix when the vector path was dropped.
#[derive(Debug)]
pub struct ShapeBuild {
    pub kind: NodeKind,
    pub name_suffix: Option<&'static str>,
}

pub fn vector_fill(fill: &SourceVectorFill) -> Option<VectorFill> {
    match fill {
        SourceVectorFill::Solid { color } => Some(VectorFill::Solid {
            color: normalize_color(*color),
        }),
        SourceVectorFill::Gradient { gradient } if !gradient.stops.is_empty() => {
            Some(VectorFill::Gradient {
                gradient: normalize_gradient(gradient),
            })
        }
        SourceVectorFill::Gradient { .. } | SourceVectorFill::Pattern => None,
    }
}

pub fn vector_stroke(stroke: &SourceVectorStroke) -> Option<StrokeData> {
    if !stroke.enabled || !stroke.width.is_finite() || stroke.width <= 0.0 {
        return None;
    }
    Some(StrokeData {
        color: normalize_color(stroke.color),
        weight: stroke.width,
        align: stroke.line_alignment,
        cap: stroke.line_cap,
        join: stroke.line_join,
        dash_pattern: stroke
            .dash_pattern
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .collect(),
    })
}

pub fn smart_filter(f: &SourceSmartFilter) -> SmartFilterData {
    SmartFilterData {
        kind: f.kind.clone(),
        enabled: f.enabled,
        opacity: f.opacity.map_or(1.0, normalize_opacity),
        blend_mode: f
            .blend_mode
            .as_deref()
            .map_or(BlendMode::Normal, BlendMode::from_source),
        settings: f.settings.clone(),
    }
}

/// Build the payload of an image or vector layer.
///
/// Invalid vector knots do not fail the layer: the path is dropped and the shape falls
/// back to its bounding rectangle. Image export errors do fail it.
pub fn build_shape(
    layer: &SourceLayer,
    sink: &mut ImageSink,
    export_images: bool,
) -> SceneResult<ShapeBuild> {
    let mut name_suffix = None;
    let vector_path = match layer.active_vector_paths() {
        Some(paths) => match subpaths_to_path_data(paths, layer.bounds) {
            Ok(d) => d.map(|path_data| VectorPathData {
                path_data,
                fill_rule: Default::default(),
            }),
            Err(e) => {
                tracing::warn!(layer = %layer.name, error = %e, "vector path dropped");
                name_suffix = Some(VECTOR_FAILED_SUFFIX);
                None
            }
        },
        None => None,
    };

    let image = match (&layer.image, export_images) {
        (Some(raster), true) => Some(sink.export(&layer.name, ImageRole::Layer, raster)?),
        _ => None,
    };

    let data = ShapeData {
        vector_path,
        vector_fill: layer.vector_fill.as_ref().and_then(vector_fill),
        vector_stroke: layer.vector_stroke.as_ref().and_then(vector_stroke),
        image,
        placed: layer.placed.as_ref().map(|p| PlacedData {
            linked: p.kind == PlacedKind::Linked,
            transform: p.transform.map(|t| AffineData {
                xx: t.xx,
                xy: t.xy,
                yx: t.yx,
                yy: t.yy,
                tx: t.tx,
                ty: t.ty,
            }),
        }),
        smart_filters: layer.smart_filters.iter().map(smart_filter).collect(),
    };

    let kind = match layer.kind {
        LayerKind::Vector => NodeKind::Vector(data),
        _ => NodeKind::Rectangle(data),
    };
    Ok(ShapeBuild { kind, name_suffix })
}

#[cfg(test)]
#[path = "../../tests/unit/build/shape.rs"]
mod tests;
