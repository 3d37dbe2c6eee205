use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rayon::prelude::*;

use crate::foundation::error::{SceneError, SceneResult};

/// Raster bytes available to one import, keyed by file name.
#[derive(Clone, Debug)]
pub enum ImageStore {
    /// Everything decoded before the walk starts.
    Memory(HashMap<String, Vec<u8>>),
    /// Streamed export directory, read lazily by file name.
    Directory(PathBuf),
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::Memory(HashMap::new())
    }
}

impl ImageStore {
    pub fn memory(files: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self::Memory(files.into_iter().collect())
    }

    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self::Directory(dir.into())
    }

    /// Decode an inline base64 manifest. Entries decode in parallel; undecodable entries
    /// are dropped with a warning.
    pub fn from_manifest(manifest: &BTreeMap<String, String>) -> Self {
        let decoded: Vec<(String, Option<Vec<u8>>)> = manifest
            .par_iter()
            .map(|(name, b64)| (name.clone(), STANDARD.decode(b64.trim()).ok()))
            .collect();

        let mut files = HashMap::with_capacity(decoded.len());
        for (name, bytes) in decoded {
            match bytes {
                Some(b) if !b.is_empty() => {
                    files.insert(name, b);
                }
                _ => tracing::warn!(image = %name, "manifest entry is not valid base64, dropped"),
            }
        }
        tracing::debug!(images = files.len(), "image manifest decoded");
        Self::Memory(files)
    }

    pub fn from_manifest_path(path: &Path) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read image manifest '{}'", path.display()))?;
        let manifest: BTreeMap<String, String> = serde_json::from_str(&text)
            .map_err(|e| SceneError::serde(format!("image manifest '{}': {e}", path.display())))?;
        Ok(Self::from_manifest(&manifest))
    }

    /// Bytes for `file_name`, if present. Names that try to leave the directory are refused.
    pub fn get(&self, file_name: &str) -> Option<Cow<'_, [u8]>> {
        match self {
            Self::Memory(files) => files.get(file_name).map(|b| Cow::Borrowed(b.as_slice())),
            Self::Directory(dir) => {
                if !is_plain_file_name(file_name) {
                    tracing::warn!(image = %file_name, "refusing image name outside the store");
                    return None;
                }
                std::fs::read(dir.join(file_name)).ok().map(Cow::Owned)
            }
        }
    }

    /// Entry count for in-memory stores.
    pub fn memory_len(&self) -> Option<usize> {
        match self {
            Self::Memory(files) => Some(files.len()),
            Self::Directory(_) => None,
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/images.rs"]
mod tests;
