//! psd2scene converts a decoded PSD layer tree into a design-tool scene graph.
//!
//! The conversion runs in two halves that meet at a serializable [`SceneDocument`]:
//!
//! - [`SceneBuilder`] normalizes a [`SourceDocument`] and builds the target node tree,
//!   exporting layer rasters as it goes
//! - [`ImportSession`] walks a scene document and drives a [`Host`], resolving fonts and
//!   images and degrading nodes that cannot be created
//!
//! [`SceneHost`] is an in-memory host; [`render`] reconstructs its tree as SVG or pixels.
#![forbid(unsafe_code)]

pub mod assets;
pub mod build;
pub mod foundation;
pub mod materialize;
pub mod normalize;
pub mod render;
pub mod scene;
pub mod source;

pub use crate::foundation::core::{Affine, BezPath, Bounds, Point, Rect, Rgba, Vec2};
pub use crate::foundation::error::{SceneError, SceneResult};

pub use crate::assets::fontdb::FontDatabase;
pub use crate::build::builder::{
    BuildOptions, Conversion, ConversionSummary, SceneBuilder, build_tree,
};
pub use crate::build::images::ImageExport;
pub use crate::materialize::fonts::{FontPolicy, FontResolver, FontSource, StaticFonts};
pub use crate::materialize::host::{Host, NodeId};
pub use crate::materialize::images::ImageStore;
pub use crate::materialize::materializer::{
    ImportReport, ImportSession, MaterializeOptions, import,
};
pub use crate::materialize::pacing::{CancelToken, YieldHook};
pub use crate::materialize::scene_host::SceneHost;
pub use crate::render::raster::{RasterOptions, rasterize, write_png};
pub use crate::render::svg::to_svg;
pub use crate::scene::model::{SceneDocument, TargetNode};
pub use crate::source::model::{SourceDocument, SourceLayer};
