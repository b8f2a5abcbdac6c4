//! The per-property descriptor table.
//!
//! Every supported CSS property is a [`Property`] variant; the methods
//! on the enum form a declarative descriptor: how the value is
//! represented ([`Category`]), whether it inherits by default, whether a
//! change to it can be absorbed by a repaint without relayout
//! (`nolayout`), which special keywords and signs a length accepts, the
//! property's bit in the length [`PropertyMask`], and the CSS initial
//! value for length-coded properties.
//!
//! `strum` supplies the kebab-case CSS spelling in both directions, so
//! the parser maps names with `Property::from_str` and diagnostics print
//! them back.

use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::values::PropertyMask;
use crate::values::length::pixels;

/// How a property's value is represented and dispatched by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// One of a fixed keyword set, stored as a small enum.
    Enum,
    /// The compact i32 length encoding.
    Length,
    /// Like `Length`, plus `thin`/`medium`/`thick`; never a percentage.
    BorderWidth,
    /// A shared handle into the color pool.
    Color,
    /// An image reference (`url(...)` or `none`).
    Image,
    /// A `(name, value)+` counter list.
    CounterList,
    /// An integer or `auto`.
    AutoInteger,
    /// Bespoke resolution logic in the builder.
    Custom,
}

/// Keyword/sign admissibility flags for length-coded properties.
pub mod allow {
    /// `auto` is accepted.
    pub const AUTO: u8 = 1 << 0;
    /// `none` is accepted.
    pub const NONE: u8 = 1 << 1;
    /// `normal` is accepted.
    pub const NORMAL: u8 = 1 << 2;
    /// Percentages are accepted.
    pub const PERCENT: u8 = 1 << 3;
    /// Negative quantities are accepted.
    pub const NEGATIVE: u8 = 1 << 4;
}

/// All supported CSS properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
#[allow(missing_docs)]
pub enum Property {
    // Enumerated
    Display,
    Float,
    Clear,
    Position,
    Overflow,
    Visibility,
    Direction,
    TextAlign,
    TextDecoration,
    TextTransform,
    WhiteSpace,
    FontVariant,
    ListStyleType,
    ListStylePosition,
    BackgroundAttachment,
    BackgroundRepeat,
    BorderTopStyle,
    BorderRightStyle,
    BorderBottomStyle,
    BorderLeftStyle,
    OutlineStyle,

    // Length-coded
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    Top,
    Right,
    Bottom,
    Left,
    TextIndent,
    LetterSpacing,
    WordSpacing,
    BackgroundPositionX,
    BackgroundPositionY,
    BorderSpacing,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    OutlineWidth,

    // Integer
    ZIndex,

    // Shared handles
    Color,
    BackgroundColor,
    BorderTopColor,
    BorderRightColor,
    BorderBottomColor,
    BorderLeftColor,
    OutlineColor,
    BackgroundImage,
    ListStyleImage,

    // Counter lists
    CounterReset,
    CounterIncrement,

    // Bespoke
    FontSize,
    FontFamily,
    FontStyle,
    FontWeight,
    LineHeight,
    VerticalAlign,
    Content,
    BackgroundPosition,
}

impl Property {
    /// The representation/dispatch category.
    #[must_use]
    pub const fn category(self) -> Category {
        use Property::*;
        match self {
            Display | Float | Clear | Position | Overflow | Visibility | Direction | TextAlign
            | TextDecoration | TextTransform | WhiteSpace | FontVariant | ListStyleType
            | ListStylePosition | BackgroundAttachment | BackgroundRepeat | BorderTopStyle
            | BorderRightStyle | BorderBottomStyle | BorderLeftStyle | OutlineStyle => {
                Category::Enum
            }
            Width | Height | MinWidth | MinHeight | MaxWidth | MaxHeight | MarginTop
            | MarginRight | MarginBottom | MarginLeft | PaddingTop | PaddingRight
            | PaddingBottom | PaddingLeft | Top | Right | Bottom | Left | TextIndent
            | LetterSpacing | WordSpacing | BackgroundPositionX | BackgroundPositionY
            | BorderSpacing => Category::Length,
            BorderTopWidth | BorderRightWidth | BorderBottomWidth | BorderLeftWidth
            | OutlineWidth => Category::BorderWidth,
            ZIndex => Category::AutoInteger,
            Color | BackgroundColor | BorderTopColor | BorderRightColor | BorderBottomColor
            | BorderLeftColor | OutlineColor => Category::Color,
            BackgroundImage | ListStyleImage => Category::Image,
            CounterReset | CounterIncrement => Category::CounterList,
            FontSize | FontFamily | FontStyle | FontWeight | LineHeight | VerticalAlign
            | Content | BackgroundPosition => Category::Custom,
        }
    }

    /// True if the property inherits by default.
    ///
    /// [§ 6.2 Inheritance](https://www.w3.org/TR/CSS2/cascade.html#inheritance)
    #[must_use]
    pub const fn inherited(self) -> bool {
        use Property::*;
        matches!(
            self,
            Color
                | Direction
                | TextAlign
                | TextTransform
                | TextIndent
                | WhiteSpace
                | Visibility
                | FontVariant
                | FontSize
                | FontFamily
                | FontStyle
                | FontWeight
                | LineHeight
                | LetterSpacing
                | WordSpacing
                | ListStyleType
                | ListStylePosition
                | ListStyleImage
                | BorderSpacing
        )
    }

    /// True if a change to this property alone never moves any box:
    /// repaint suffices, relayout is unnecessary.
    #[must_use]
    pub const fn nolayout(self) -> bool {
        use Property::*;
        matches!(
            self,
            TextDecoration
                | BackgroundAttachment
                | BackgroundRepeat
                | BackgroundPositionX
                | BackgroundPositionY
                | Visibility
                | Color
                | BackgroundColor
                | BorderTopColor
                | BorderRightColor
                | BorderBottomColor
                | BorderLeftColor
                | OutlineColor
                | BackgroundImage
        )
    }

    /// Keyword/sign admissibility for length-coded and custom length
    /// properties (see [`allow`]).
    #[must_use]
    pub const fn allowed(self) -> u8 {
        use Property::*;
        match self {
            Width | Height => allow::AUTO | allow::PERCENT,
            MinWidth | MinHeight => allow::PERCENT,
            MaxWidth | MaxHeight => allow::NONE | allow::PERCENT,
            MarginTop | MarginRight | MarginBottom | MarginLeft => {
                allow::AUTO | allow::PERCENT | allow::NEGATIVE
            }
            PaddingTop | PaddingRight | PaddingBottom | PaddingLeft => allow::PERCENT,
            Top | Right | Bottom | Left => allow::AUTO | allow::PERCENT | allow::NEGATIVE,
            TextIndent => allow::PERCENT | allow::NEGATIVE,
            LetterSpacing | WordSpacing => allow::NORMAL | allow::NEGATIVE,
            BackgroundPositionX | BackgroundPositionY => allow::PERCENT,
            BorderSpacing => 0,
            BorderTopWidth | BorderRightWidth | BorderBottomWidth | BorderLeftWidth
            | OutlineWidth => 0,
            VerticalAlign => allow::PERCENT | allow::NEGATIVE,
            LineHeight => allow::NORMAL | allow::PERCENT,
            _ => 0,
        }
    }

    /// The property's bit in the length [`PropertyMask`], for properties
    /// whose value lives in an i32 length field.
    #[must_use]
    pub const fn length_bit(self) -> Option<u8> {
        use Property::*;
        let bit = match self {
            Width => 0,
            Height => 1,
            MinWidth => 2,
            MinHeight => 3,
            MaxWidth => 4,
            MaxHeight => 5,
            MarginTop => 6,
            MarginRight => 7,
            MarginBottom => 8,
            MarginLeft => 9,
            PaddingTop => 10,
            PaddingRight => 11,
            PaddingBottom => 12,
            PaddingLeft => 13,
            Top => 14,
            Right => 15,
            Bottom => 16,
            Left => 17,
            TextIndent => 18,
            LetterSpacing => 19,
            WordSpacing => 20,
            BackgroundPositionX => 21,
            BackgroundPositionY => 22,
            BorderSpacing => 23,
            BorderTopWidth => 24,
            BorderRightWidth => 25,
            BorderBottomWidth => 26,
            BorderLeftWidth => 27,
            OutlineWidth => 28,
            LineHeight => 29,
            VerticalAlign => 30,
            _ => return None,
        };
        Some(bit)
    }

    /// Mask bits whose percentage-vs-absolute state only affects
    /// painting (the background position pair); every other length bit
    /// is layout-relevant.
    #[must_use]
    pub fn paint_only_mask() -> PropertyMask {
        let mut mask = PropertyMask::EMPTY;
        if let Some(bit) = Property::BackgroundPositionX.length_bit() {
            mask.set(bit);
        }
        if let Some(bit) = Property::BackgroundPositionY.length_bit() {
            mask.set(bit);
        }
        mask
    }

    /// CSS initial value for length-coded properties, in the compact
    /// encoding.
    ///
    /// [Appendix F, Full property table](https://www.w3.org/TR/CSS2/propidx.html)
    #[must_use]
    pub const fn initial_pixels(self) -> i32 {
        use Property::*;
        match self {
            Width | Height | Top | Right | Bottom | Left => pixels::AUTO,
            MaxWidth | MaxHeight => pixels::NONE,
            LetterSpacing | WordSpacing | LineHeight => pixels::NORMAL,
            // 'medium' border width; applies only while the style is
            // visible.
            BorderTopWidth | BorderRightWidth | BorderBottomWidth | BorderLeftWidth
            | OutlineWidth => 2,
            _ => 0,
        }
    }
}

/// Every property whose value lives in an i32 length field, in
/// declaration order.
pub fn all_length_properties() -> impl Iterator<Item = Property> {
    Property::iter().filter(|p| p.length_bit().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn test_css_names_round_trip() {
        assert_eq!(Property::MarginLeft.to_string(), "margin-left");
        assert_eq!(
            Property::from_str("background-position-x").unwrap(),
            Property::BackgroundPositionX
        );
        assert!(Property::from_str("not-a-property").is_err());
    }

    #[test]
    fn test_length_bits_are_unique() {
        let mut seen = HashSet::new();
        for prop in Property::iter() {
            if let Some(bit) = prop.length_bit() {
                assert!(seen.insert(bit), "bit {bit} reused by {prop}");
            }
        }
    }

    #[test]
    fn test_every_length_property_has_a_bit() {
        for prop in Property::iter() {
            if matches!(prop.category(), Category::Length | Category::BorderWidth) {
                assert!(prop.length_bit().is_some(), "{prop} has no mask bit");
            }
        }
    }

    #[test]
    fn test_nolayout_properties_never_need_relayout_flags() {
        assert!(Property::Visibility.nolayout());
        assert!(Property::BackgroundColor.nolayout());
        assert!(!Property::Width.nolayout());
        assert!(!Property::FontSize.nolayout());
    }
}
