//! Per-document style state: configuration, interning pools, and the
//! prototype value set.
//!
//! Everything the cascade shares across nodes lives here and is passed
//! by reference into every build and restyle call; there are no
//! process-wide tables. Teardown order is therefore structural: a
//! context outlives the handles minted from its pools, and dropping the
//! engine's per-node state before purging the pools leaves them empty.

use std::rc::Rc;

use strum::IntoEnumIterator;

use crate::error::StyleError;
use crate::properties::{Category, Property};
use crate::style::computed::{ComputedValues, ValuesPool};
use crate::values::color::ColorPool;
use crate::values::font::{FontBackend, FontCache, FontKey, SyntheticFontBackend};
use crate::values::keywords::{
    BackgroundAttachment, BackgroundRepeat, BorderStyle, Clear, Direction, Display, Float,
    FontVariant, ListStylePosition, ListStyleType, Overflow, Position, TextAlign, TextDecoration,
    TextTransform, VerticalAlign, Visibility, WhiteSpace,
};
use crate::values::length::pixels;
use crate::values::PropertyMask;

/// Hook evaluating a `script(...)` property value; the returned string
/// is re-parsed as the property's value.
pub type ScriptHook = Box<dyn Fn(&str) -> Option<String>>;

/// Tunable document-wide styling parameters.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    /// Magnification applied to font sizes and border widths.
    pub zoom: f64,
    /// Extra scale applied to font sizes only.
    pub font_scale: f64,
    /// Family of last resort.
    pub default_font_family: String,
    /// Size of last resort, tenths of a point.
    pub default_font_size_tenths: i32,
    /// Point sizes for the seven absolute size keywords
    /// `xx-small` through `xx-large`.
    ///
    /// [§ 15.7 'font-size'](https://www.w3.org/TR/CSS2/fonts.html#propdef-font-size)
    pub font_size_table: [i32; 7],
    /// Pixels per typographic point (96 dpi gives 4/3).
    pub pixels_per_point: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        StyleConfig {
            zoom: 1.0,
            font_scale: 1.0,
            default_font_family: "helvetica".to_string(),
            default_font_size_tenths: 100,
            font_size_table: [8, 9, 10, 11, 13, 17, 24],
            pixels_per_point: 96.0 / 72.0,
        }
    }
}

/// Per-document style context: pools, config, hooks, prototype.
pub struct StyleContext {
    /// Document-wide parameters.
    pub config: StyleConfig,
    /// Interned colors.
    pub colors: ColorPool,
    /// Cached fonts.
    pub fonts: FontCache,
    /// Interned computed-value sets.
    pub values: ValuesPool,
    prototype: ComputedValues,
    script_hook: Option<ScriptHook>,
}

impl std::fmt::Debug for StyleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleContext")
            .field("config", &self.config)
            .field("colors", &self.colors)
            .field("fonts", &self.fonts)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl StyleContext {
    /// Create a context over a font backend.
    ///
    /// # Errors
    ///
    /// [`StyleError::FontUnavailable`] if even the default font cannot
    /// be produced (the prototype value set needs one).
    pub fn new(config: StyleConfig, backend: Box<dyn FontBackend>) -> Result<Self, StyleError> {
        let colors = ColorPool::new();
        let mut fonts = FontCache::new(
            backend,
            &config.default_font_family,
            config.default_font_size_tenths,
        );
        let default_key = FontKey::new(&config.default_font_family, config.default_font_size_tenths);
        let font = fonts.intern(&default_key)?;
        let black = colors.keyword("black");
        let transparent = colors.keyword("transparent");

        let mut prototype = ComputedValues {
            display: Display::default(),
            float: Float::default(),
            clear: Clear::default(),
            position: Position::default(),
            overflow: Overflow::default(),
            visibility: Visibility::default(),
            direction: Direction::default(),
            text_align: TextAlign::default(),
            text_decoration: TextDecoration::default(),
            text_transform: TextTransform::default(),
            white_space: WhiteSpace::default(),
            font_variant: FontVariant::default(),
            list_style_type: ListStyleType::default(),
            list_style_position: ListStylePosition::default(),
            background_attachment: BackgroundAttachment::default(),
            background_repeat: BackgroundRepeat::default(),
            border_top_style: BorderStyle::default(),
            border_right_style: BorderStyle::default(),
            border_bottom_style: BorderStyle::default(),
            border_left_style: BorderStyle::default(),
            outline_style: BorderStyle::default(),
            vertical_align: VerticalAlign::default(),
            width: 0,
            height: 0,
            min_width: 0,
            min_height: 0,
            max_width: 0,
            max_height: 0,
            margin_top: 0,
            margin_right: 0,
            margin_bottom: 0,
            margin_left: 0,
            padding_top: 0,
            padding_right: 0,
            padding_bottom: 0,
            padding_left: 0,
            top: 0,
            right: 0,
            bottom: 0,
            left: 0,
            text_indent: 0,
            letter_spacing: 0,
            word_spacing: 0,
            background_position_x: 0,
            background_position_y: 0,
            border_spacing: 0,
            border_top_width: 0,
            border_right_width: 0,
            border_bottom_width: 0,
            border_left_width: 0,
            outline_width: 0,
            vertical_align_length: 0,
            line_height: 0,
            z_index: pixels::AUTO,
            color: Rc::clone(&black),
            background_color: transparent,
            border_top_color: Rc::clone(&black),
            border_right_color: Rc::clone(&black),
            border_bottom_color: Rc::clone(&black),
            border_left_color: Rc::clone(&black),
            outline_color: black,
            font,
            background_image: None,
            list_style_image: None,
            counter_reset: None,
            counter_increment: None,
            content: None,
            percent_mask: PropertyMask::EMPTY,
        };
        // Length fields take their CSS initial values from the property
        // table rather than repeating them here.
        for prop in Property::iter() {
            if matches!(prop.category(), Category::Length | Category::BorderWidth) {
                if let Some(slot) = prototype.length_mut(prop) {
                    *slot = prop.initial_pixels();
                }
            }
        }
        prototype.line_height = Property::LineHeight.initial_pixels();

        Ok(StyleContext {
            config,
            colors,
            fonts,
            values: ValuesPool::new(),
            prototype,
            script_hook: None,
        })
    }

    /// A context with default configuration and synthetic font metrics.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the synthetic backend accepts any key.
    pub fn headless() -> Result<Self, StyleError> {
        Self::new(StyleConfig::default(), Box::new(SyntheticFontBackend))
    }

    /// The process-wide-equivalent block of CSS initial values, built
    /// once per context.
    #[must_use]
    pub fn prototype(&self) -> &ComputedValues {
        &self.prototype
    }

    /// Install the `script(...)` evaluation hook.
    pub fn set_script_hook(&mut self, hook: ScriptHook) {
        self.script_hook = Some(hook);
    }

    /// Evaluate a script value through the hook, if one is installed.
    #[must_use]
    pub fn eval_script(&self, source: &str) -> Option<String> {
        self.script_hook.as_ref().and_then(|hook| hook(source))
    }

    /// Drop unreferenced pool entries (colors, fonts, value sets).
    pub fn purge_pools(&mut self) {
        self.values.purge();
        self.colors.purge();
        self.fonts.purge();
    }

    /// Pixel count for a quantity in typographic units.
    ///
    /// [§ 4.3.2 Lengths](https://www.w3.org/TR/CSS2/syndata.html#length-units)
    #[must_use]
    pub fn physical_pixels(&self, value: f64, unit: PhysicalUnit) -> f64 {
        let points = match unit {
            PhysicalUnit::Pt => value,
            PhysicalUnit::Pc => value * 12.0,
            PhysicalUnit::In => value * 72.0,
            PhysicalUnit::Cm => value * 72.0 / 2.54,
            PhysicalUnit::Mm => value * 72.0 / 25.4,
        };
        points * self.pixels_per_point()
    }

    /// Pixels per point from the configuration.
    #[must_use]
    pub fn pixels_per_point(&self) -> f64 {
        self.config.pixels_per_point
    }
}

/// Physical length units resolved through a fixed dpi conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalUnit {
    /// Points (1/72 inch).
    Pt,
    /// Picas (12 points).
    Pc,
    /// Inches.
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prototype_has_css_initial_values() {
        let ctx = StyleContext::headless().unwrap();
        let proto = ctx.prototype();
        assert_eq!(proto.display, Display::Inline);
        assert_eq!(proto.width, pixels::AUTO);
        assert_eq!(proto.max_width, pixels::NONE);
        assert_eq!(proto.letter_spacing, pixels::NORMAL);
        assert_eq!(proto.border_top_width, 2);
        assert_eq!(proto.z_index, pixels::AUTO);
        assert!(proto.background_color.is_transparent());
        assert_eq!(proto.color.name, "black");
    }

    #[test]
    fn test_physical_units_convert_through_points() {
        let ctx = StyleContext::headless().unwrap();
        let inch = ctx.physical_pixels(1.0, PhysicalUnit::In);
        assert!((inch - 96.0).abs() < 1e-9);
        let pica = ctx.physical_pixels(1.0, PhysicalUnit::Pc);
        assert!((pica - 16.0).abs() < 1e-9);
    }
}
