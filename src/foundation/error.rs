/// Convenience result type used across psd2scene.
pub type SceneResult<T> = Result<T, SceneError>;

/// Top-level error taxonomy used by builder and materializer APIs.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Invalid source document or intermediate tree data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Raster payload could not be decoded or re-encoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A font or image reference could not be resolved.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Non-finite or degenerate geometry.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Vector path reconstruction or parsing failed.
    #[error("path error: {0}")]
    Path(String),

    /// The host object model rejected an operation.
    #[error("host error: {0}")]
    Host(String),

    /// The import was cancelled at a yield point.
    #[error("import cancelled after {processed} nodes")]
    Cancelled { processed: usize },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    /// Build a [`SceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SceneError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`SceneError::Resolution`] value.
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Build a [`SceneError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`SceneError::Path`] value.
    pub fn path(msg: impl Into<String>) -> Self {
        Self::Path(msg.into())
    }

    /// Build a [`SceneError::Host`] value.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Build a [`SceneError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True when this error ends the whole import rather than a single node.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
