pub mod builder;
pub mod clipping;
pub mod images;
pub mod shape;
pub mod text;
