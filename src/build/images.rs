use std::collections::BTreeMap;
use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::model::ImageRef;
use crate::source::model::RasterRef;

/// Where exported raster payloads go.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ImageExport {
    /// Keep bytes in the returned bundle, referenced by file name.
    #[default]
    Memory,
    /// Keep bytes in the bundle and also embed them as base64 in the nodes.
    Inline,
    /// Write each image to `dir` as soon as it is met and drop the bytes.
    Stream { dir: PathBuf },
}

/// What an exported image is used for; decides the file name infix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRole {
    Layer,
    Mask,
    Pattern,
}

/// Replace characters hosts and file systems reject, and collapse whitespace runs, with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => out.push('_'),
            c => out.push(c),
        }
    }
    out
}

/// Per-conversion image side channel. Counters restart with every conversion.
#[derive(Debug)]
pub struct ImageSink {
    mode: ImageExport,
    counter: u32,
    streamed: u32,
    files: BTreeMap<String, Vec<u8>>,
}

/// Progress is logged once per this many streamed images.
const STREAM_LOG_EVERY: u32 = 100;

impl ImageSink {
    pub fn new(mode: ImageExport) -> SceneResult<Self> {
        if let ImageExport::Stream { dir } = &mode {
            std::fs::create_dir_all(dir).map_err(|e| {
                anyhow::anyhow!("create image directory '{}': {e}", dir.display())
            })?;
            tracing::info!(dir = %dir.display(), "streaming images to disk");
        }
        Ok(Self {
            mode,
            counter: 0,
            streamed: 0,
            files: BTreeMap::new(),
        })
    }

    /// Sink that embeds every image in its node. Never touches the file system.
    pub fn inline() -> Self {
        Self {
            mode: ImageExport::Inline,
            counter: 0,
            streamed: 0,
            files: BTreeMap::new(),
        }
    }

    fn next_name(&mut self, layer_name: &str, role: ImageRole) -> String {
        let n = self.counter;
        self.counter += 1;
        let base = sanitize_file_name(layer_name);
        match role {
            ImageRole::Layer => format!("{base}_{n}.png"),
            ImageRole::Mask => format!("{base}_mask_{n}.png"),
            ImageRole::Pattern => format!("{base}_pattern_{n}.png"),
        }
    }

    /// Register a raster payload and return the reference nodes should carry.
    ///
    /// Payloads the parser already streamed keep their file name and are never loaded.
    pub fn export(
        &mut self,
        layer_name: &str,
        role: ImageRole,
        raster: &RasterRef,
    ) -> SceneResult<ImageRef> {
        let bytes = match raster {
            RasterRef::Streamed(name) => {
                return Ok(ImageRef {
                    file_name: name.clone(),
                    data: None,
                });
            }
            RasterRef::Inline(bytes) => bytes,
        };
        if bytes.is_empty() {
            return Err(SceneError::decode(format!(
                "empty raster payload on '{layer_name}'"
            )));
        }

        let file_name = self.next_name(layer_name, role);
        let data = match &self.mode {
            ImageExport::Memory => {
                self.files.insert(file_name.clone(), bytes.clone());
                None
            }
            ImageExport::Inline => {
                self.files.insert(file_name.clone(), bytes.clone());
                Some(STANDARD.encode(bytes))
            }
            ImageExport::Stream { dir } => {
                let path = dir.join(&file_name);
                std::fs::write(&path, bytes)
                    .map_err(|e| anyhow::anyhow!("write image '{}': {e}", path.display()))?;
                self.streamed += 1;
                if self.streamed % STREAM_LOG_EVERY == 0 {
                    tracing::info!(written = self.streamed, "images streamed");
                }
                None
            }
        };
        Ok(ImageRef { file_name, data })
    }

    pub fn streamed_count(&self) -> u32 {
        self.streamed
    }

    /// Bytes kept in memory, keyed by file name. Empty in streaming mode.
    pub fn into_files(self) -> BTreeMap<String, Vec<u8>> {
        self.files
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/images.rs"]
mod tests;
