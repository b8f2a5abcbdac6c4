//! The interned result of resolving every property for one element.
//!
//! [CSS 2.1 § 6.1 Specified, computed, and actual values](https://www.w3.org/TR/CSS2/cascade.html#value-stages)
//!
//! Most elements in a document resolve to one of a handful of distinct
//! value sets, so sets are deduplicated: two nodes whose resolved
//! properties are identical share one `Rc<ComputedValues>`, and "did
//! this node's style change" reduces to a pointer comparison.

use std::collections::HashSet;
use std::rc::Rc;

use crate::properties::Property;
use crate::values::color::ColorHandle;
use crate::values::counter::{ContentFragment, CounterEntry};
use crate::values::font::FontHandle;
use crate::values::keywords::{
    BackgroundAttachment, BackgroundRepeat, BorderStyle, Clear, Direction, Display, Float,
    FontVariant, ListStylePosition, ListStyleType, Overflow, Position, TextAlign, TextDecoration,
    TextTransform, VerticalAlign, Visibility, WhiteSpace,
};
use crate::values::length::pixels;
use crate::values::PropertyMask;

/// A shared, interned computed-values set.
pub type ValuesHandle = Rc<ComputedValues>;

/// The resolved value of every supported property for one element.
///
/// Length fields use the compact encoding described in
/// [`crate::values::length`]; which of them currently hold scaled
/// percentages is recorded in [`ComputedValues::percent_mask`].
///
/// Equality and hashing are structural. The color and font handles
/// delegate to their pointees, which are themselves interned, so
/// structural equality of two sets implies they would intern to the
/// same instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct ComputedValues {
    // Enumerated properties.
    pub display: Display,
    pub float: Float,
    pub clear: Clear,
    pub position: Position,
    pub overflow: Overflow,
    pub visibility: Visibility,
    pub direction: Direction,
    pub text_align: TextAlign,
    pub text_decoration: TextDecoration,
    pub text_transform: TextTransform,
    pub white_space: WhiteSpace,
    pub font_variant: FontVariant,
    pub list_style_type: ListStyleType,
    pub list_style_position: ListStylePosition,
    pub background_attachment: BackgroundAttachment,
    pub background_repeat: BackgroundRepeat,
    pub border_top_style: BorderStyle,
    pub border_right_style: BorderStyle,
    pub border_bottom_style: BorderStyle,
    pub border_left_style: BorderStyle,
    pub outline_style: BorderStyle,
    pub vertical_align: VerticalAlign,

    // Length-coded properties.
    pub width: i32,
    pub height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub margin_top: i32,
    pub margin_right: i32,
    pub margin_bottom: i32,
    pub margin_left: i32,
    pub padding_top: i32,
    pub padding_right: i32,
    pub padding_bottom: i32,
    pub padding_left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
    pub text_indent: i32,
    pub letter_spacing: i32,
    pub word_spacing: i32,
    pub background_position_x: i32,
    pub background_position_y: i32,
    pub border_spacing: i32,
    pub border_top_width: i32,
    pub border_right_width: i32,
    pub border_bottom_width: i32,
    pub border_left_width: i32,
    pub outline_width: i32,
    /// Pixel offset when `vertical_align` is `Length`; `line-height`
    /// numbers are stored as `-100 * n` (scale factors against the font),
    /// see the builder.
    pub vertical_align_length: i32,
    pub line_height: i32,

    /// `z-index`; [`pixels::AUTO`] encodes `auto`.
    pub z_index: i32,

    // Shared handles.
    pub color: ColorHandle,
    pub background_color: ColorHandle,
    pub border_top_color: ColorHandle,
    pub border_right_color: ColorHandle,
    pub border_bottom_color: ColorHandle,
    pub border_left_color: ColorHandle,
    pub outline_color: ColorHandle,
    pub font: FontHandle,
    pub background_image: Option<Rc<str>>,
    pub list_style_image: Option<Rc<str>>,

    // Lists.
    pub counter_reset: Option<Rc<Vec<CounterEntry>>>,
    pub counter_increment: Option<Rc<Vec<CounterEntry>>>,
    pub content: Option<Rc<Vec<ContentFragment>>>,

    /// Which length fields hold scaled percentages.
    pub percent_mask: PropertyMask,
}

impl ComputedValues {
    /// Read a length field by property. `None` if the property is not
    /// length-coded.
    #[must_use]
    pub fn length(&self, prop: Property) -> Option<i32> {
        use Property::*;
        Some(match prop {
            Width => self.width,
            Height => self.height,
            MinWidth => self.min_width,
            MinHeight => self.min_height,
            MaxWidth => self.max_width,
            MaxHeight => self.max_height,
            MarginTop => self.margin_top,
            MarginRight => self.margin_right,
            MarginBottom => self.margin_bottom,
            MarginLeft => self.margin_left,
            PaddingTop => self.padding_top,
            PaddingRight => self.padding_right,
            PaddingBottom => self.padding_bottom,
            PaddingLeft => self.padding_left,
            Top => self.top,
            Right => self.right,
            Bottom => self.bottom,
            Left => self.left,
            TextIndent => self.text_indent,
            LetterSpacing => self.letter_spacing,
            WordSpacing => self.word_spacing,
            BackgroundPositionX => self.background_position_x,
            BackgroundPositionY => self.background_position_y,
            BorderSpacing => self.border_spacing,
            BorderTopWidth => self.border_top_width,
            BorderRightWidth => self.border_right_width,
            BorderBottomWidth => self.border_bottom_width,
            BorderLeftWidth => self.border_left_width,
            OutlineWidth => self.outline_width,
            LineHeight => self.line_height,
            VerticalAlign => self.vertical_align_length,
            _ => return None,
        })
    }

    /// Mutable access to a length field by property.
    pub(crate) fn length_mut(&mut self, prop: Property) -> Option<&mut i32> {
        use Property::*;
        Some(match prop {
            Width => &mut self.width,
            Height => &mut self.height,
            MinWidth => &mut self.min_width,
            MinHeight => &mut self.min_height,
            MaxWidth => &mut self.max_width,
            MaxHeight => &mut self.max_height,
            MarginTop => &mut self.margin_top,
            MarginRight => &mut self.margin_right,
            MarginBottom => &mut self.margin_bottom,
            MarginLeft => &mut self.margin_left,
            PaddingTop => &mut self.padding_top,
            PaddingRight => &mut self.padding_right,
            PaddingBottom => &mut self.padding_bottom,
            PaddingLeft => &mut self.padding_left,
            Top => &mut self.top,
            Right => &mut self.right,
            Bottom => &mut self.bottom,
            Left => &mut self.left,
            TextIndent => &mut self.text_indent,
            LetterSpacing => &mut self.letter_spacing,
            WordSpacing => &mut self.word_spacing,
            BackgroundPositionX => &mut self.background_position_x,
            BackgroundPositionY => &mut self.background_position_y,
            BorderSpacing => &mut self.border_spacing,
            BorderTopWidth => &mut self.border_top_width,
            BorderRightWidth => &mut self.border_right_width,
            BorderBottomWidth => &mut self.border_bottom_width,
            BorderLeftWidth => &mut self.border_left_width,
            OutlineWidth => &mut self.outline_width,
            LineHeight => &mut self.line_height,
            VerticalAlign => &mut self.vertical_align_length,
            _ => return None,
        })
    }

    /// True if the percentage mask is set for `prop`.
    #[must_use]
    pub fn is_percent(&self, prop: Property) -> bool {
        prop.length_bit()
            .is_some_and(|bit| self.percent_mask.contains(bit))
    }

    /// The property establishes a stacking context when positioned with
    /// a non-`auto` z-index.
    ///
    /// [§ 9.9.1 'z-index'](https://www.w3.org/TR/CSS2/visuren.html#z-index)
    #[must_use]
    pub fn has_explicit_z_index(&self) -> bool {
        self.z_index != pixels::AUTO
    }

    /// True if any border edge or the background would paint.
    ///
    /// Used by the painting-order sorter to discard boxes with nothing
    /// to draw before they enter the z-buckets.
    #[must_use]
    pub fn paints_box(&self) -> bool {
        if !self.background_color.is_transparent() || self.background_image.is_some() {
            return true;
        }
        (self.border_top_style.is_visible() && self.border_top_width > 0)
            || (self.border_right_style.is_visible() && self.border_right_width > 0)
            || (self.border_bottom_style.is_visible() && self.border_bottom_width > 0)
            || (self.border_left_style.is_visible() && self.border_left_width > 0)
            || (self.outline_style.is_visible() && self.outline_width > 0)
    }
}

/// Per-document deduplication table for computed-values sets.
///
/// Holding `Rc`s keyed by their own contents: interning a candidate
/// either finds a structurally equal existing set (the candidate and its
/// transient sub-handles are simply dropped) or moves the candidate in.
#[derive(Debug, Default)]
pub struct ValuesPool {
    table: HashSet<Rc<ComputedValues>>,
}

impl ValuesPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        ValuesPool {
            table: HashSet::new(),
        }
    }

    /// Intern `candidate`, returning the canonical shared instance.
    pub fn intern(&mut self, candidate: ComputedValues) -> ValuesHandle {
        if let Some(existing) = self.table.get(&candidate) {
            return Rc::clone(existing);
        }
        let handle = Rc::new(candidate);
        let _ = self.table.insert(Rc::clone(&handle));
        handle
    }

    /// Drop table entries nothing else references.
    pub fn purge(&mut self) {
        self.table.retain(|handle| Rc::strong_count(handle) > 1);
    }

    /// Number of distinct interned sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
