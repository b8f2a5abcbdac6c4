//! Keyword-valued property enums.
//!
//! Every enumerated property stores one of these small codes in
//! [`ComputedValues`](crate::style::ComputedValues). `strum` provides the
//! CSS keyword spelling in both directions, so the builder parses
//! keywords with `FromStr` and diagnostics print them with `Display`.

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// [CSS 2.1 § 9.2.4 'display'](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Display {
    /// No boxes are generated; the subtree does not render.
    None,
    /// Inline-level box.
    #[default]
    Inline,
    /// Block-level box.
    Block,
    /// Block-level box with a list marker.
    ListItem,
    /// Inline-level block container.
    InlineBlock,
    /// Block-level table.
    Table,
    /// Inline-level table.
    InlineTable,
    /// Table row group.
    TableRowGroup,
    /// Table header group.
    TableHeaderGroup,
    /// Table footer group.
    TableFooterGroup,
    /// Table row.
    TableRow,
    /// Table cell.
    TableCell,
    /// Table caption.
    TableCaption,
}

impl Display {
    /// True for inline-level display values.
    ///
    /// [§ 9.2.2 Inline-level elements](https://www.w3.org/TR/CSS2/visuren.html#inline-level)
    #[must_use]
    pub const fn is_inline_level(self) -> bool {
        matches!(self, Display::Inline | Display::InlineBlock | Display::InlineTable)
    }

    /// The block-level equivalent used when a box is floated, absolutely
    /// positioned, or the root.
    ///
    /// [§ 9.7 Relationships between 'display', 'position', and 'float'](https://www.w3.org/TR/CSS2/visuren.html#dis-pos-flo)
    #[must_use]
    pub const fn blockified(self) -> Display {
        match self {
            Display::None => Display::None,
            Display::InlineTable => Display::Table,
            _ => Display::Block,
        }
    }

    /// True for the table-internal display values that may not establish
    /// their own independent boxes outside a table.
    #[must_use]
    pub const fn is_table_internal(self) -> bool {
        matches!(
            self,
            Display::TableRowGroup
                | Display::TableHeaderGroup
                | Display::TableFooterGroup
                | Display::TableRow
                | Display::TableCell
                | Display::TableCaption
        )
    }
}

/// [§ 9.5.1 'float'](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Float {
    /// The box does not float.
    #[default]
    None,
    /// Float to the left.
    Left,
    /// Float to the right.
    Right,
}

/// [§ 9.5.2 'clear'](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Clear {
    /// No clearance constraint.
    #[default]
    None,
    /// Clear past left floats.
    Left,
    /// Clear past right floats.
    Right,
    /// Clear past all floats.
    Both,
}

/// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Position {
    /// Normal flow.
    #[default]
    Static,
    /// Normal flow, then offset.
    Relative,
    /// Out of flow, positioned against the containing block.
    Absolute,
    /// Out of flow, positioned against the viewport.
    Fixed,
}

/// [§ 11.1.1 'overflow'](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Overflow {
    /// Content is not clipped.
    #[default]
    Visible,
    /// Content is clipped with no scrolling mechanism.
    Hidden,
    /// Content is clipped behind scrollbars.
    Scroll,
    /// Clipping and scrollbars are up to the embedder.
    Auto,
}

/// [§ 11.2 'visibility'](https://www.w3.org/TR/CSS2/visufx.html#visibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Visibility {
    /// The box is visible.
    #[default]
    Visible,
    /// The box is invisible but still affects layout.
    Hidden,
    /// Treated as `hidden` outside table internals.
    Collapse,
}

/// [§ 8.2 'direction'](https://www.w3.org/TR/CSS2/visuren.html#direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Direction {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
}

/// [§ 16.2 'text-align'](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Align to the right edge.
    Right,
    /// Center each line box.
    Center,
    /// Justify to both edges.
    Justify,
}

/// [§ 16.3.1 'text-decoration'](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// Underline the text.
    Underline,
    /// Overline the text.
    Overline,
    /// Strike through the text.
    LineThrough,
}

/// [§ 16.5 'text-transform'](https://www.w3.org/TR/CSS2/text.html#caps-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum TextTransform {
    /// No transformation.
    #[default]
    None,
    /// Capitalize the first letter of each word.
    Capitalize,
    /// Uppercase everything.
    Uppercase,
    /// Lowercase everything.
    Lowercase,
}

/// [§ 16.6 'white-space'](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum WhiteSpace {
    /// Collapse whitespace, wrap as needed.
    #[default]
    Normal,
    /// Preserve whitespace, no wrapping.
    Pre,
    /// Collapse whitespace, no wrapping.
    Nowrap,
}

/// [§ 15.5 'font-variant'](https://www.w3.org/TR/CSS2/fonts.html#small-caps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum FontVariant {
    /// Ordinary glyphs.
    #[default]
    Normal,
    /// Small-caps glyphs.
    SmallCaps,
}

/// [§ 12.5.1 'list-style-type'](https://www.w3.org/TR/CSS2/generate.html#list-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum ListStyleType {
    /// Filled circle marker.
    #[default]
    Disc,
    /// Hollow circle marker.
    Circle,
    /// Filled square marker.
    Square,
    /// `1.` `2.` `3.`
    Decimal,
    /// `a.` `b.` `c.`
    LowerAlpha,
    /// `A.` `B.` `C.`
    UpperAlpha,
    /// `i.` `ii.` `iii.`
    LowerRoman,
    /// `I.` `II.` `III.`
    UpperRoman,
    /// No marker.
    None,
}

/// [§ 12.5.1 'list-style-position'](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum ListStylePosition {
    /// Marker outside the principal box.
    #[default]
    Outside,
    /// Marker as the first inline box of the content.
    Inside,
}

/// [§ 14.2.1 'background-attachment'](https://www.w3.org/TR/CSS2/colors.html#propdef-background-attachment)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum BackgroundAttachment {
    /// Background scrolls with the document.
    #[default]
    Scroll,
    /// Background is fixed to the viewport.
    Fixed,
}

/// [§ 14.2.1 'background-repeat'](https://www.w3.org/TR/CSS2/colors.html#propdef-background-repeat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum BackgroundRepeat {
    /// Tile in both directions.
    #[default]
    Repeat,
    /// Tile horizontally.
    RepeatX,
    /// Tile vertically.
    RepeatY,
    /// Draw once.
    NoRepeat,
}

/// [§ 8.5.3 Border style](https://www.w3.org/TR/CSS2/box.html#border-style-properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum BorderStyle {
    /// No border is drawn (and the computed width is treated as zero).
    #[default]
    None,
    /// Like `none`, but wins border-conflict resolution in tables.
    Hidden,
    /// Dotted line.
    Dotted,
    /// Dashed line.
    Dashed,
    /// Solid line.
    Solid,
    /// Two solid lines.
    Double,
    /// Carved appearance.
    Groove,
    /// Embossed appearance.
    Ridge,
    /// Inset appearance.
    Inset,
    /// Outset appearance.
    Outset,
}

impl BorderStyle {
    /// True if this style paints anything at all.
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, BorderStyle::None | BorderStyle::Hidden)
    }
}

/// [§ 10.8.1 'vertical-align'](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
///
/// `Length` marks a pixel offset carried in the separate
/// `vertical_align_length` field (percentages resolve against
/// `line-height` when the builder finishes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum VerticalAlign {
    /// Align with the parent's baseline.
    #[default]
    Baseline,
    /// Lower to the parent's subscript position.
    Sub,
    /// Raise to the parent's superscript position.
    Super,
    /// Align top with the line box top.
    Top,
    /// Align top with the parent's content-area top.
    TextTop,
    /// Center on the parent's baseline plus half the x-height.
    Middle,
    /// Align bottom with the line box bottom.
    Bottom,
    /// Align bottom with the parent's content-area bottom.
    TextBottom,
    /// A resolved pixel offset; see `vertical_align_length`.
    #[strum(disabled)]
    Length,
}

impl VerticalAlign {
    /// The four values legal on a table cell; anything else is forced
    /// back to `baseline` when the builder finishes a `table-cell` box.
    ///
    /// [§ 17.5.3 Table height algorithms](https://www.w3.org/TR/CSS2/tables.html#height-layout)
    #[must_use]
    pub const fn is_cell_legal(self) -> bool {
        matches!(
            self,
            VerticalAlign::Baseline
                | VerticalAlign::Top
                | VerticalAlign::Middle
                | VerticalAlign::Bottom
        )
    }
}
