//! CSS color values and the per-document color pool.
//!
//! [CSS 2.1 § 4.3.6 Colors](https://www.w3.org/TR/CSS2/syndata.html#color-units)
//!
//! Colors are interned case-insensitively by their source spelling:
//! resolving the same color name across thousands of nodes costs one
//! allocation, and equality between computed values reduces to comparing
//! one shared handle. The CSS keyword colors (plus `transparent`) are
//! pinned for the lifetime of the pool so their RGB values are always
//! the CSS-correct ones, independent of any platform color table.

use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

/// A shared, interned color.
pub type ColorHandle = Rc<Color>;

/// A resolved color: the canonical source spelling plus sRGB components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    /// Lower-cased spelling the color was interned under.
    pub name: String,
    /// Red channel (0-255).
    pub red: u8,
    /// Green channel (0-255).
    pub green: u8,
    /// Blue channel (0-255).
    pub blue: u8,
    /// Alpha channel (0-255, 255 = opaque).
    pub alpha: u8,
}

impl Color {
    /// True if nothing would be painted with this color.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        self.alpha == 0
    }

    /// Resolve a color spelling to RGBA components.
    ///
    /// Accepts the CSS2 keyword colors, `transparent`, hex notation
    /// (3/4/6/8 digits, with and without the `#`), and
    /// `rgb()`/`rgba()` functional notation. Returns `None` for
    /// anything else; the caller treats that as a type mismatch.
    #[must_use]
    pub fn resolve(name: &str) -> Option<(u8, u8, u8, u8)> {
        let name = name.trim();
        if let Some(rgb) = keyword_rgb(&name.to_ascii_lowercase()) {
            return Some(rgb);
        }
        if let Some(hex) = name.strip_prefix('#') {
            return from_hex(hex);
        }
        if let Some(args) = name
            .strip_prefix("rgba(")
            .or_else(|| name.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return from_rgb_args(args);
        }
        // A bare hex string ("ffcc00") is accepted as a fallback: legacy
        // documents routinely omit the '#'.
        from_hex(name)
    }
}

/// [§ 4.2.1 of css-color-4](https://www.w3.org/TR/css-color-4/#hex-notation)
///
/// "The three-digit RGB notation (#RGB) is converted into six-digit form
/// (#RRGGBB) by replicating digits, not by adding zeros."
fn from_hex(hex: &str) -> Option<(u8, u8, u8, u8)> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: &str| u8::from_str_radix(&range.repeat(2), 16).ok();
    let pair = |range: &str| u8::from_str_radix(range, 16).ok();
    match hex.len() {
        3 => Some((
            channel(&hex[0..1])?,
            channel(&hex[1..2])?,
            channel(&hex[2..3])?,
            255,
        )),
        4 => Some((
            channel(&hex[0..1])?,
            channel(&hex[1..2])?,
            channel(&hex[2..3])?,
            channel(&hex[3..4])?,
        )),
        6 => Some((pair(&hex[0..2])?, pair(&hex[2..4])?, pair(&hex[4..6])?, 255)),
        8 => Some((
            pair(&hex[0..2])?,
            pair(&hex[2..4])?,
            pair(&hex[4..6])?,
            pair(&hex[6..8])?,
        )),
        _ => None,
    }
}

/// `rgb(r, g, b)` / `rgba(r, g, b, a)` with integer or percentage
/// channels and a 0.0-1.0 alpha.
fn from_rgb_args(args: &str) -> Option<(u8, u8, u8, u8)> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        if let Some(pct) = s.strip_suffix('%') {
            let v: f64 = pct.trim().parse().ok()?;
            Some((v.clamp(0.0, 100.0) * 255.0 / 100.0).round() as u8)
        } else {
            let v: f64 = s.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        }
    };
    let red = channel(parts[0])?;
    let green = channel(parts[1])?;
    let blue = channel(parts[2])?;
    let alpha = if parts.len() == 4 {
        let v: f64 = parts[3].parse().ok()?;
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    } else {
        255
    };
    Some((red, green, blue, alpha))
}

/// The CSS2 keyword colors plus `transparent`.
///
/// [§ 4.3.6 Colors](https://www.w3.org/TR/CSS2/syndata.html#color-units)
const KEYWORDS: &[(&str, (u8, u8, u8, u8))] = &[
    ("aqua", (0x00, 0xff, 0xff, 0xff)),
    ("black", (0x00, 0x00, 0x00, 0xff)),
    ("blue", (0x00, 0x00, 0xff, 0xff)),
    ("fuchsia", (0xff, 0x00, 0xff, 0xff)),
    ("gray", (0x80, 0x80, 0x80, 0xff)),
    ("green", (0x00, 0x80, 0x00, 0xff)),
    ("lime", (0x00, 0xff, 0x00, 0xff)),
    ("maroon", (0x80, 0x00, 0x00, 0xff)),
    ("navy", (0x00, 0x00, 0x80, 0xff)),
    ("olive", (0x80, 0x80, 0x00, 0xff)),
    ("purple", (0x80, 0x00, 0x80, 0xff)),
    ("red", (0xff, 0x00, 0x00, 0xff)),
    ("silver", (0xc0, 0xc0, 0xc0, 0xff)),
    ("teal", (0x00, 0x80, 0x80, 0xff)),
    ("white", (0xff, 0xff, 0xff, 0xff)),
    ("yellow", (0xff, 0xff, 0x00, 0xff)),
    ("transparent", (0x00, 0x00, 0x00, 0x00)),
];

fn keyword_rgb(name: &str) -> Option<(u8, u8, u8, u8)> {
    KEYWORDS
        .iter()
        .find(|(kw, _)| *kw == name)
        .map(|&(_, rgb)| rgb)
}

/// Per-document interning table for colors.
///
/// Lookup is by lower-cased spelling. The keyword colors are inserted at
/// construction and held by the pool itself, so they survive every
/// [`ColorPool::purge`].
#[derive(Debug)]
pub struct ColorPool {
    table: HashMap<String, ColorHandle>,
    pinned: usize,
}

impl ColorPool {
    /// Create a pool with the CSS keyword colors pinned.
    #[must_use]
    pub fn new() -> Self {
        let mut table = HashMap::new();
        for &(name, (red, green, blue, alpha)) in KEYWORDS {
            let _ = table.insert(
                name.to_string(),
                Rc::new(Color {
                    name: name.to_string(),
                    red,
                    green,
                    blue,
                    alpha,
                }),
            );
        }
        ColorPool {
            pinned: table.len(),
            table,
        }
    }

    /// Intern a color by spelling, case-insensitively.
    ///
    /// Returns `None` if the spelling does not resolve to a color.
    pub fn intern(&mut self, name: &str) -> Option<ColorHandle> {
        let key = name.trim().to_ascii_lowercase();
        if let Some(existing) = self.table.get(&key) {
            return Some(Rc::clone(existing));
        }
        let (red, green, blue, alpha) = Color::resolve(&key)?;
        let handle = Rc::new(Color {
            name: key.clone(),
            red,
            green,
            blue,
            alpha,
        });
        let _ = self.table.insert(key, Rc::clone(&handle));
        Some(handle)
    }

    /// A pinned keyword color.
    ///
    /// # Panics
    /// Panics if `name` is not one of the seeded keyword colors.
    #[must_use]
    pub fn keyword(&self, name: &str) -> ColorHandle {
        Rc::clone(self.table.get(name).expect("pinned keyword color"))
    }

    /// Drop table entries nothing else references. Keyword colors stay.
    pub fn purge(&mut self) {
        self.table
            .retain(|_, handle| Rc::strong_count(handle) > 1 || keyword_rgb(&handle.name).is_some());
    }

    /// Number of interned colors beyond the pinned keyword set.
    #[must_use]
    pub fn interned_len(&self) -> usize {
        self.table.len() - self.pinned
    }
}

impl Default for ColorPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_case_insensitive_and_shared() {
        let mut pool = ColorPool::new();
        let a = pool.intern("Red").unwrap();
        let b = pool.intern("RED").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!((a.red, a.green, a.blue), (255, 0, 0));
    }

    #[test]
    fn test_keyword_colors_are_css_correct() {
        let mut pool = ColorPool::new();
        let green = pool.intern("green").unwrap();
        assert_eq!((green.red, green.green, green.blue), (0, 0x80, 0));
        let transparent = pool.intern("transparent").unwrap();
        assert!(transparent.is_transparent());
    }

    #[test]
    fn test_short_hex_expands_by_digit_doubling() {
        let mut pool = ColorPool::new();
        let c = pool.intern("#abc").unwrap();
        assert_eq!((c.red, c.green, c.blue), (0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_bare_hex_is_retried_without_hash() {
        let mut pool = ColorPool::new();
        let c = pool.intern("ffcc00").unwrap();
        assert_eq!((c.red, c.green, c.blue), (0xff, 0xcc, 0x00));
    }

    #[test]
    fn test_rgb_function_with_percentages() {
        let mut pool = ColorPool::new();
        let c = pool.intern("rgb(100%, 0, 50%)").unwrap();
        assert_eq!((c.red, c.green, c.blue), (255, 0, 128));
        let d = pool.intern("rgba(0, 0, 0, 0.5)").unwrap();
        assert_eq!(d.alpha, 128);
    }

    #[test]
    fn test_unresolvable_name_is_rejected() {
        let mut pool = ColorPool::new();
        assert!(pool.intern("not-a-color-at-all").is_none());
    }

    #[test]
    fn test_purge_keeps_pinned_and_live_entries() {
        let mut pool = ColorPool::new();
        let held = pool.intern("#123456").unwrap();
        drop(pool.intern("#654321"));
        assert_eq!(pool.interned_len(), 2);
        pool.purge();
        assert_eq!(pool.interned_len(), 1);
        assert!(pool.intern("red").is_some());
        drop(held);
        pool.purge();
        assert_eq!(pool.interned_len(), 0);
    }
}
