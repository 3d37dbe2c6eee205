use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::error::SceneResult;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl std::fmt::Display for FontName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.family, self.style)
    }
}

/// Something that can make a font available to the host.
///
/// `load` may block; the resolver runs it on a helper thread and gives up after the policy
/// timeout.
pub trait FontSource: Send + Sync {
    fn load(&self, font: &FontName) -> SceneResult<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPolicy {
    /// Family every unresolved font ends up in.
    pub fallback_family: String,
    /// Budget for one load attempt.
    pub timeout_ms: u64,
}

impl Default for FontPolicy {
    fn default() -> Self {
        Self {
            fallback_family: "Inter".to_owned(),
            timeout_ms: 3000,
        }
    }
}

/// Which step of the resolution chain produced a font.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Exact,
    Mapped,
    DefaultMap,
    Forced,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSubstitution {
    pub requested: FontName,
    pub resolved: FontName,
    pub tier: ResolutionTier,
}

/// Families known to be missing on hosts, with their style buckets.
const FONT_MAPPING: &[(&str, &[(&str, &str)])] = &[
    (
        "Pretendard",
        &[
            ("Black", "Bold"),
            ("ExtraBold", "Bold"),
            ("Bold", "Bold"),
            ("SemiBold", "Semi Bold"),
            ("Medium", "Medium"),
            ("Regular", "Regular"),
            ("Light", "Light"),
            ("ExtraLight", "Light"),
            ("Thin", "Thin"),
        ],
    ),
    (
        "Pretendard Variable",
        &[
            ("Black", "Bold"),
            ("Bold", "Bold"),
            ("SemiBold", "Semi Bold"),
            ("Medium", "Medium"),
            ("Regular", "Regular"),
            ("Light", "Light"),
            ("Thin", "Thin"),
        ],
    ),
    (
        "MADEOuterSans",
        &[
            ("Black", "Bold"),
            ("Bold", "Bold"),
            ("Medium", "Medium"),
            ("Regular", "Regular"),
            ("Light", "Light"),
            ("Thin", "Thin"),
        ],
    ),
    ("MADEOuterSans-Medium", &[("Regular", "Medium")]),
    (
        "NanumGothic",
        &[("Bold", "Bold"), ("ExtraBold", "Bold"), ("Regular", "Regular")],
    ),
    (
        "NanumSquare",
        &[
            ("ExtraBold", "Bold"),
            ("Bold", "Bold"),
            ("Regular", "Regular"),
            ("Light", "Light"),
        ],
    ),
    (
        "Noto Sans KR",
        &[
            ("Black", "Bold"),
            ("Bold", "Bold"),
            ("Medium", "Medium"),
            ("Regular", "Regular"),
            ("Light", "Light"),
            ("Thin", "Thin"),
        ],
    ),
];

/// Style buckets for families with no mapping entry.
const DEFAULT_STYLE_MAP: &[(&str, &str)] = &[
    ("Black", "Bold"),
    ("ExtraBold", "Bold"),
    ("Bold", "Bold"),
    ("SemiBold", "Semi Bold"),
    ("Semi Bold", "Semi Bold"),
    ("Medium", "Medium"),
    ("Regular", "Regular"),
    ("Light", "Light"),
    ("ExtraLight", "Light"),
    ("Extra Light", "Light"),
    ("Thin", "Thin"),
    ("Italic", "Italic"),
    ("Bold Italic", "Bold Italic"),
    ("BoldItalic", "Bold Italic"),
];

fn lookup<'a>(table: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Mapped style for a family in the substitution table, if the family is listed.
pub fn mapped_style(family: &str, style: &str) -> Option<&'static str> {
    let (_, styles) = FONT_MAPPING.iter().find(|(f, _)| *f == family)?;
    Some(
        lookup(styles, style)
            .or_else(|| lookup(styles, "Regular"))
            .unwrap_or("Regular"),
    )
}

pub fn default_style(style: &str) -> &'static str {
    lookup(DEFAULT_STYLE_MAP, style).unwrap_or("Regular")
}

/// Per-import font resolution with a load cache.
pub struct FontResolver {
    source: Arc<dyn FontSource>,
    policy: FontPolicy,
    loaded: HashMap<FontName, bool>,
    resolved: HashMap<FontName, FontName>,
    substitutions: Vec<FontSubstitution>,
}

impl std::fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResolver")
            .field("policy", &self.policy)
            .field("cached", &self.loaded.len())
            .finish_non_exhaustive()
    }
}

impl FontResolver {
    pub fn new(source: Arc<dyn FontSource>, policy: FontPolicy) -> Self {
        Self {
            source,
            policy,
            loaded: HashMap::new(),
            resolved: HashMap::new(),
            substitutions: Vec::new(),
        }
    }

    pub fn policy(&self) -> &FontPolicy {
        &self.policy
    }

    /// Substitutions made so far, one per distinct requested font.
    pub fn substitutions(&self) -> &[FontSubstitution] {
        &self.substitutions
    }

    /// Resolve a requested font to one the host has loaded. Always yields a font; the last
    /// resort is the fallback family in Regular, even if it never loaded.
    pub fn resolve(&mut self, family: &str, style: Option<&str>) -> FontName {
        let style = style.filter(|s| !s.is_empty()).unwrap_or("Regular");
        let requested = FontName::new(family, style);
        if let Some(hit) = self.resolved.get(&requested) {
            return hit.clone();
        }

        let (resolved, tier) = self.resolve_uncached(&requested);
        if tier != ResolutionTier::Exact {
            tracing::info!(from = %requested, to = %resolved, ?tier, "font substituted");
            self.substitutions.push(FontSubstitution {
                requested: requested.clone(),
                resolved: resolved.clone(),
                tier,
            });
        }
        self.resolved.insert(requested, resolved.clone());
        resolved
    }

    fn resolve_uncached(&mut self, requested: &FontName) -> (FontName, ResolutionTier) {
        if self.try_load(requested) {
            return (requested.clone(), ResolutionTier::Exact);
        }

        let fallback = self.policy.fallback_family.clone();
        if let Some(style) = mapped_style(&requested.family, &requested.style) {
            let candidate = FontName::new(fallback.clone(), style);
            if self.try_load(&candidate) {
                return (candidate, ResolutionTier::Mapped);
            }
        }

        let first = default_style(&requested.style);
        for style in [first, "Regular", "Medium", "Bold"] {
            let candidate = FontName::new(fallback.clone(), style);
            if self.try_load(&candidate) {
                return (candidate, ResolutionTier::DefaultMap);
            }
        }

        tracing::warn!(font = %requested, "no font loaded, forcing fallback regular");
        (FontName::new(fallback, "Regular"), ResolutionTier::Forced)
    }

    /// One bounded load attempt. A load that outlives the timeout is abandoned and counts as
    /// a miss.
    fn try_load(&mut self, font: &FontName) -> bool {
        if let Some(ok) = self.loaded.get(font) {
            return *ok;
        }

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let job = font.clone();
        let spawned = std::thread::Builder::new()
            .name("font-load".to_owned())
            .spawn(move || {
                let _ = tx.send(source.load(&job));
            });

        let ok = match spawned {
            Err(e) => {
                tracing::warn!(font = %font, error = %e, "font load thread did not start");
                false
            }
            Ok(_) => match rx.recv_timeout(Duration::from_millis(self.policy.timeout_ms)) {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::debug!(font = %font, error = %e, "font load failed");
                    false
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        font = %font,
                        timeout_ms = self.policy.timeout_ms,
                        "font load timed out"
                    );
                    false
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => false,
            },
        };
        self.loaded.insert(font.clone(), ok);
        ok
    }
}

/// Font source backed by a fixed list, for hosts whose fonts are known up front.
#[derive(Clone, Debug, Default)]
pub struct StaticFonts {
    available: Vec<FontName>,
}

impl StaticFonts {
    pub fn new(available: impl IntoIterator<Item = FontName>) -> Self {
        Self {
            available: available.into_iter().collect(),
        }
    }
}

impl FontSource for StaticFonts {
    fn load(&self, font: &FontName) -> SceneResult<()> {
        if self.available.contains(font) {
            Ok(())
        } else {
            Err(crate::foundation::error::SceneError::resolution(format!(
                "font {font} is not available"
            )))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/fonts.rs"]
mod tests;
