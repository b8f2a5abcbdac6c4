//! Font keys, metrics, and the per-document font cache.
//!
//! [CSS 2.1 § 15 Fonts](https://www.w3.org/TR/CSS2/fonts.html)
//!
//! A font is identified by `(family, size, italic, bold)` where size is
//! measured in tenths of a point. Resolution goes through a pluggable
//! [`FontBackend`]; when the backend cannot produce the requested
//! variant the cache degrades the key step by step (drop italic, drop
//! bold, default family, default size) before giving up with
//! [`StyleError::FontUnavailable`].
//!
//! Style recalculation churns through fonts: a restyle drops every
//! node's font handle and re-requests mostly the same set. To amortize
//! that, the cache keeps up to [`FontCache::MAX_IDLE`] fonts that nothing
//! outside the cache references, evicting the least recently used
//! beyond the cap.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StyleError;

/// A shared, cached font.
pub type FontHandle = Rc<Font>;

/// The lookup key for a font.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    /// Font family name, lower-cased.
    pub family: String,
    /// Size in tenths of a point (`120` = 12pt).
    pub size_tenths: i32,
    /// Italic variant requested.
    pub italic: bool,
    /// Bold variant requested.
    pub bold: bool,
}

impl FontKey {
    /// A key for `family` at `size_tenths`, upright and regular weight.
    #[must_use]
    pub fn new(family: &str, size_tenths: i32) -> Self {
        FontKey {
            family: family.to_ascii_lowercase(),
            size_tenths,
            italic: false,
            bold: false,
        }
    }
}

/// Platform metrics for a resolved font.
///
/// [§ 10.8.1 Leading and half-leading](https://www.w3.org/TR/CSS2/visudet.html#leading)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontMetrics {
    /// Pixels above the baseline.
    pub ascent: i32,
    /// Pixels below the baseline.
    pub descent: i32,
    /// The em square in pixels (the font's pixel size).
    pub em_pixels: i32,
    /// The x-height in pixels.
    pub ex_pixels: i32,
    /// Advance width of the space character in pixels.
    pub space_pixels: i32,
}

/// A resolved font: the key it answers to plus its metrics.
///
/// `key` is the key the font was *requested* under; after degradation
/// the metrics may belong to a plainer variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Font {
    /// The requested key.
    pub key: FontKey,
    /// Metrics from the backend.
    pub metrics: FontMetrics,
}

impl Font {
    /// Total line height (ascent + descent) in pixels.
    #[must_use]
    pub const fn line_pixels(&self) -> i32 {
        self.metrics.ascent + self.metrics.descent
    }
}

/// Platform font source.
///
/// Implementations return `None` when the family or variant is
/// unavailable; the cache then walks its degradation chain.
pub trait FontBackend {
    /// Metrics for `key`, or `None` if no such font exists.
    fn load(&self, key: &FontKey) -> Option<FontMetrics>;
}

/// Deterministic metrics derived from the key alone.
///
/// Suitable as a default backend for headless use and tests: every
/// family resolves, with an em square of the point size at 96 dpi.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticFontBackend;

impl FontBackend for SyntheticFontBackend {
    fn load(&self, key: &FontKey) -> Option<FontMetrics> {
        // 1pt = 4/3 px at 96 dpi; size is in tenths of a point.
        let em = (key.size_tenths * 4 + 15) / 30;
        let em = em.max(1);
        let ascent = (em * 4 + 2) / 5;
        Some(FontMetrics {
            ascent,
            descent: em - ascent,
            em_pixels: em,
            ex_pixels: (em + 1) / 2,
            space_pixels: (em + 1) / 3,
        })
    }
}

struct CacheSlot {
    font: FontHandle,
    last_use: u64,
}

/// Per-document font cache with LRU retention of idle fonts.
pub struct FontCache {
    backend: Box<dyn FontBackend>,
    table: HashMap<FontKey, CacheSlot>,
    clock: u64,
    default_family: String,
    default_size_tenths: i32,
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("fonts", &self.table.len())
            .field("default_family", &self.default_family)
            .finish_non_exhaustive()
    }
}

impl FontCache {
    /// Idle (externally unreferenced) fonts retained before eviction.
    pub const MAX_IDLE: usize = 50;

    /// Create a cache over `backend` with the given fallbacks of last
    /// resort.
    #[must_use]
    pub fn new(backend: Box<dyn FontBackend>, default_family: &str, default_size_tenths: i32) -> Self {
        FontCache {
            backend,
            table: HashMap::new(),
            clock: 0,
            default_family: default_family.to_ascii_lowercase(),
            default_size_tenths,
        }
    }

    /// Intern a font by key.
    ///
    /// # Errors
    ///
    /// [`StyleError::FontUnavailable`] if the backend rejects every step
    /// of the degradation chain.
    pub fn intern(&mut self, key: &FontKey) -> Result<FontHandle, StyleError> {
        self.clock += 1;
        if let Some(slot) = self.table.get_mut(key) {
            slot.last_use = self.clock;
            return Ok(Rc::clone(&slot.font));
        }
        let metrics = self.resolve(key)?;
        let handle = Rc::new(Font {
            key: key.clone(),
            metrics,
        });
        let _ = self.table.insert(
            key.clone(),
            CacheSlot {
                font: Rc::clone(&handle),
                last_use: self.clock,
            },
        );
        self.trim();
        Ok(handle)
    }

    /// Walk the degradation chain until the backend produces metrics.
    fn resolve(&self, key: &FontKey) -> Result<FontMetrics, StyleError> {
        let mut candidate = key.clone();
        if let Some(m) = self.backend.load(&candidate) {
            return Ok(m);
        }
        if candidate.italic {
            candidate.italic = false;
            if let Some(m) = self.backend.load(&candidate) {
                return Ok(m);
            }
        }
        if candidate.bold {
            candidate.bold = false;
            if let Some(m) = self.backend.load(&candidate) {
                return Ok(m);
            }
        }
        candidate.family = self.default_family.clone();
        if let Some(m) = self.backend.load(&candidate) {
            return Ok(m);
        }
        candidate.size_tenths = self.default_size_tenths;
        if let Some(m) = self.backend.load(&candidate) {
            return Ok(m);
        }
        Err(StyleError::FontUnavailable {
            family: key.family.clone(),
            size_tenths: key.size_tenths,
        })
    }

    /// Evict the oldest idle fonts beyond [`Self::MAX_IDLE`]. A font is
    /// idle when the cache holds the only reference to it.
    fn trim(&mut self) {
        let mut idle: Vec<(FontKey, u64)> = self
            .table
            .iter()
            .filter(|(_, slot)| Rc::strong_count(&slot.font) == 1)
            .map(|(key, slot)| (key.clone(), slot.last_use))
            .collect();
        if idle.len() <= Self::MAX_IDLE {
            return;
        }
        idle.sort_by_key(|&(_, last_use)| last_use);
        for (key, _) in idle.drain(..idle.len() - Self::MAX_IDLE) {
            let _ = self.table.remove(&key);
        }
    }

    /// Drop every idle font regardless of the cap (document teardown).
    pub fn purge(&mut self) {
        self.table
            .retain(|_, slot| Rc::strong_count(&slot.font) > 1);
    }

    /// Number of cached fonts (live and idle).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if the cache holds no fonts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
