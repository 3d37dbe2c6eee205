use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::model::{FORMAT_VERSION, SceneDocument};
use crate::source::model::SourceDocument;

impl SceneDocument {
    /// Parse an intermediate document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SceneResult<Self> {
        let doc: Self = serde_json::from_reader(r)
            .map_err(|e| SceneError::validation(format!("parse scene JSON: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Parse an intermediate document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SceneError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pretty-printed JSON.
    pub fn to_writer<W: std::io::Write>(&self, w: W) -> SceneResult<()> {
        serde_json::to_writer_pretty(w, self)
            .map_err(|e| SceneError::serde(format!("write scene JSON: {e}")))
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> SceneResult<()> {
        let path = path.as_ref();
        let f = File::create(path)
            .map_err(|e| anyhow::anyhow!("create scene JSON '{}': {e}", path.display()))?;
        let mut w = BufWriter::new(f);
        self.to_writer(&mut w)?;
        w.flush()
            .map_err(|e| anyhow::anyhow!("flush scene JSON '{}': {e}", path.display()))?;
        Ok(())
    }

    /// Checks the parts a replaying process cannot recover from.
    pub fn validate(&self) -> SceneResult<()> {
        let major = |v: &str| v.split('.').next().map(str::to_owned);
        if major(&self.version) != major(FORMAT_VERSION) {
            return Err(SceneError::validation(format!(
                "unsupported scene version '{}' (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        let c = self.canvas;
        if !(c.width.is_finite() && c.height.is_finite()) || c.width <= 0.0 || c.height <= 0.0 {
            return Err(SceneError::validation(format!(
                "canvas must be positive, got {}x{}",
                c.width, c.height
            )));
        }
        Ok(())
    }
}

impl SourceDocument {
    /// Parse a parsed-PSD layer tree from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SceneResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| SceneError::validation(format!("parse source document JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SceneError::validation(format!("open source document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
