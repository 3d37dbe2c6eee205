pub mod fonts;
pub mod host;
pub mod images;
pub mod materializer;
pub mod pacing;
pub mod paint;
pub mod scene_host;
