use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;

use crate::foundation::error::{SceneError, SceneResult};
use crate::materialize::fonts::{FontName, FontSource};

/// Font source over a `fontdb` database: system fonts plus optional font directories.
///
/// A style is available only when a face of the family has exactly the weight and slant
/// the style name asks for.
#[derive(Clone, Debug)]
pub struct FontDatabase {
    db: Arc<fontdb::Database>,
}

impl FontDatabase {
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    pub fn system(extra_dirs: &[&Path]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in extra_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database ready");
        Self { db: Arc::new(db) }
    }

    pub fn from_database(db: fontdb::Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Shared database, for renderers that lay out text themselves.
    pub fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }
}

pub(crate) fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "font file skipped");
        }
    }
}

/// Weight and italic flag a style name stands for, e.g. `"Semi Bold Italic"` → (600, true).
pub fn style_traits(style: &str) -> (u16, bool) {
    let key: String = style
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();
    let italic = key.contains("italic") || key.contains("oblique");
    let base = key.replace("italic", "").replace("oblique", "");
    let weight = match base.as_str() {
        "thin" | "hairline" => 100,
        "extralight" | "ultralight" => 200,
        "light" => 300,
        "medium" => 500,
        "semibold" | "demibold" => 600,
        "bold" => 700,
        "extrabold" | "ultrabold" => 800,
        "black" | "heavy" => 900,
        _ => 400,
    };
    (weight, italic)
}

impl FontSource for FontDatabase {
    fn load(&self, font: &FontName) -> SceneResult<()> {
        let (weight, italic) = style_traits(&font.style);
        let found = self.db.faces().any(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(&font.family))
                && face.weight.0 == weight
                && (face.style != fontdb::Style::Normal) == italic
        });
        if found {
            Ok(())
        } else {
            Err(SceneError::resolution(format!("font {font} is not installed")))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fontdb.rs"]
mod tests;
