pub mod color;
pub mod effects;
pub mod path;
