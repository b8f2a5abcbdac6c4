//! Assembles one element's computed values from cascaded declarations.
//!
//! [CSS 2.1 § 6.1 Specified, computed, and actual values](https://www.w3.org/TR/CSS2/cascade.html#value-stages)
//!
//! The lifecycle is: seed from the context prototype plus the parent's
//! inherited values, apply declarations in cascade order through
//! [`Builder::set`], then [`Builder::finish`] resolves everything that
//! depends on the final font (em/ex lengths, percentage line-height and
//! vertical-align), applies the CSS fix-ups that depend on several
//! properties at once, and interns the result.
//!
//! An invalid value leaves the property at its previous value, with a
//! one-shot diagnostic; the cascade never aborts over a bad declaration.

use std::rc::Rc;
use std::str::FromStr;

use larch_common::warn_once;

use crate::context::{PhysicalUnit, StyleContext};
use crate::error::StyleError;
use crate::parse::{LengthUnit, Term, parse_terms};
use crate::properties::{Category, Property, allow};
use crate::style::computed::{ComputedValues, ValuesHandle};
use crate::values::PropertyMask;
use crate::values::counter::{ContentFragment, CounterEntry};
use crate::values::font::FontKey;
use crate::values::keywords::{Display, Float, ListStyleType, Position, VerticalAlign};
use crate::values::length::{pixels, rescale_hundredths};

/// Resolves an `attr(...)` reference: `(ancestor_tag_filter, name)` to
/// the attribute's text. Supplied by the cascade, which owns the tree.
pub type AttrLookup<'t> = dyn Fn(Option<&str>, &str) -> Option<String> + 't;

// Explicit-assignment flags for the colors that default to 'color'.
const SET_BORDER_TOP: u8 = 1 << 0;
const SET_BORDER_RIGHT: u8 = 1 << 1;
const SET_BORDER_BOTTOM: u8 = 1 << 2;
const SET_BORDER_LEFT: u8 = 1 << 3;
const SET_OUTLINE: u8 = 1 << 4;

/// In-progress computed values for one element.
pub struct Builder<'a> {
    ctx: &'a mut StyleContext,
    attrs: Option<&'a AttrLookup<'a>>,
    values: ComputedValues,
    parent: Option<ValuesHandle>,
    is_root: bool,

    // Font request, resolved once at finish.
    family: String,
    size_tenths: i32,
    italic: bool,
    bold: bool,

    // Deferred quantities: `value * 100` parked until the font is known.
    em_mask: PropertyMask,
    ex_mask: PropertyMask,
    line_height_percent: bool,
    vertical_align_percent: bool,

    color_set: u8,
}

impl<'a> Builder<'a> {
    /// Start building values for an element.
    ///
    /// `parent` supplies inherited values; `None` means the element is
    /// the document root and inherited properties take their initial
    /// values instead.
    #[must_use]
    pub fn new(
        ctx: &'a mut StyleContext,
        parent: Option<&ValuesHandle>,
        is_root: bool,
    ) -> Self {
        let mut values = ctx.prototype().clone();
        let (family, size_tenths, italic, bold) = match parent {
            Some(p) => {
                // Inherited properties start from the parent.
                values.color = Rc::clone(&p.color);
                values.direction = p.direction;
                values.text_align = p.text_align;
                values.text_transform = p.text_transform;
                values.white_space = p.white_space;
                values.visibility = p.visibility;
                values.font_variant = p.font_variant;
                values.list_style_type = p.list_style_type;
                values.list_style_position = p.list_style_position;
                values.list_style_image = p.list_style_image.clone();
                values.text_indent = p.text_indent;
                values.letter_spacing = p.letter_spacing;
                values.word_spacing = p.word_spacing;
                values.line_height = p.line_height;
                values.border_spacing = p.border_spacing;
                for prop in [
                    Property::TextIndent,
                    Property::LetterSpacing,
                    Property::WordSpacing,
                    Property::BorderSpacing,
                ] {
                    if let Some(bit) = prop.length_bit() {
                        if p.percent_mask.contains(bit) {
                            values.percent_mask.set(bit);
                        }
                    }
                }
                let key = &p.font.key;
                (key.family.clone(), key.size_tenths, key.italic, key.bold)
            }
            None => (
                ctx.config.default_font_family.to_ascii_lowercase(),
                ctx.config.default_font_size_tenths,
                false,
                false,
            ),
        };
        Builder {
            ctx,
            attrs: None,
            values,
            parent: parent.map(Rc::clone),
            is_root,
            family,
            size_tenths,
            italic,
            bold,
            em_mask: PropertyMask::EMPTY,
            ex_mask: PropertyMask::EMPTY,
            line_height_percent: false,
            vertical_align_percent: false,
            color_set: 0,
        }
    }

    /// Install the `attr(...)` resolver for this element.
    #[must_use]
    pub fn with_attr_lookup(mut self, attrs: &'a AttrLookup<'a>) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Apply one cascaded declaration.
    ///
    /// Invalid values are dropped (the property keeps its previous
    /// value) with a one-shot diagnostic.
    pub fn set(&mut self, prop: Property, terms: &[Term]) {
        self.set_inner(prop, terms, 0);
    }

    fn set_inner(&mut self, prop: Property, terms: &[Term], depth: u8) {
        // Script and attribute references substitute text that is then
        // re-parsed as the property value. Bounded in case a script
        // value resolves to another script value.
        if depth > 4 {
            return self.reject(prop);
        }
        if terms.iter().any(|t| matches!(t, Term::Script(_) | Term::Attr { .. })) {
            let Some(resolved) = self.substitute(terms) else {
                // A missing attribute is not an error: the declaration
                // simply does not apply.
                return;
            };
            return self.set_inner(prop, &resolved, depth + 1);
        }
        if terms.len() == 1 && terms[0].is_ident("inherit") {
            return self.inherit(prop);
        }
        match prop.category() {
            Category::Enum => self.set_enum(prop, terms),
            Category::Length => self.set_length(prop, terms, false),
            Category::BorderWidth => self.set_length(prop, terms, true),
            Category::Color => self.set_color(prop, terms),
            Category::Image => self.set_image(prop, terms),
            Category::CounterList => self.set_counter_list(prop, terms),
            Category::AutoInteger => self.set_z_index(terms),
            Category::Custom => self.set_custom(prop, terms),
        }
    }

    fn reject(&mut self, prop: Property) {
        warn_once("css", &format!("invalid value for '{prop}'"));
    }

    /// Expand `script(...)` and `attr(...)` terms into literal terms.
    /// `None` if an attribute reference does not resolve.
    fn substitute(&self, terms: &[Term]) -> Option<Vec<Term>> {
        let mut out = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Term::Script(src) => {
                    let text = self.ctx.eval_script(src)?;
                    out.extend(parse_terms(&text));
                }
                Term::Attr { name, tag } => {
                    let lookup = self.attrs?;
                    let text = lookup(tag.as_deref(), name)?;
                    out.extend(parse_terms(&text));
                }
                other => out.push(other.clone()),
            }
        }
        Some(out)
    }

    /// `inherit`: copy the parent's value. On the root this is a silent
    /// no-op; the prototype already holds the initial values.
    fn inherit(&mut self, prop: Property) {
        let Some(parent) = self.parent.as_ref().map(Rc::clone) else {
            return;
        };
        self.copy_from(&parent, prop);
    }

    fn copy_from(&mut self, src: &ComputedValues, prop: Property) {
        use Property::*;
        match prop {
            Display => self.values.display = src.display,
            Float => self.values.float = src.float,
            Clear => self.values.clear = src.clear,
            Position => self.values.position = src.position,
            Overflow => self.values.overflow = src.overflow,
            Visibility => self.values.visibility = src.visibility,
            Direction => self.values.direction = src.direction,
            TextAlign => self.values.text_align = src.text_align,
            TextDecoration => self.values.text_decoration = src.text_decoration,
            TextTransform => self.values.text_transform = src.text_transform,
            WhiteSpace => self.values.white_space = src.white_space,
            FontVariant => self.values.font_variant = src.font_variant,
            ListStyleType => self.values.list_style_type = src.list_style_type,
            ListStylePosition => self.values.list_style_position = src.list_style_position,
            BackgroundAttachment => {
                self.values.background_attachment = src.background_attachment;
            }
            BackgroundRepeat => self.values.background_repeat = src.background_repeat,
            BorderTopStyle => self.values.border_top_style = src.border_top_style,
            BorderRightStyle => self.values.border_right_style = src.border_right_style,
            BorderBottomStyle => self.values.border_bottom_style = src.border_bottom_style,
            BorderLeftStyle => self.values.border_left_style = src.border_left_style,
            OutlineStyle => self.values.outline_style = src.outline_style,
            ZIndex => self.values.z_index = src.z_index,
            Color => self.values.color = Rc::clone(&src.color),
            BackgroundColor => self.values.background_color = Rc::clone(&src.background_color),
            BorderTopColor => {
                self.values.border_top_color = Rc::clone(&src.border_top_color);
                self.color_set |= SET_BORDER_TOP;
            }
            BorderRightColor => {
                self.values.border_right_color = Rc::clone(&src.border_right_color);
                self.color_set |= SET_BORDER_RIGHT;
            }
            BorderBottomColor => {
                self.values.border_bottom_color = Rc::clone(&src.border_bottom_color);
                self.color_set |= SET_BORDER_BOTTOM;
            }
            BorderLeftColor => {
                self.values.border_left_color = Rc::clone(&src.border_left_color);
                self.color_set |= SET_BORDER_LEFT;
            }
            OutlineColor => {
                self.values.outline_color = Rc::clone(&src.outline_color);
                self.color_set |= SET_OUTLINE;
            }
            BackgroundImage => self.values.background_image = src.background_image.clone(),
            ListStyleImage => self.values.list_style_image = src.list_style_image.clone(),
            CounterReset => self.values.counter_reset = src.counter_reset.clone(),
            CounterIncrement => {
                self.values.counter_increment = src.counter_increment.clone();
            }
            Content => self.values.content = src.content.clone(),
            FontSize => self.size_tenths = src.font.key.size_tenths,
            FontFamily => self.family = src.font.key.family.clone(),
            FontStyle => self.italic = src.font.key.italic,
            FontWeight => self.bold = src.font.key.bold,
            LineHeight => self.values.line_height = src.line_height,
            VerticalAlign => {
                self.values.vertical_align = src.vertical_align;
                self.values.vertical_align_length = src.vertical_align_length;
            }
            BackgroundPosition => {
                self.copy_from(src, BackgroundPositionX);
                self.copy_from(src, BackgroundPositionY);
            }
            _ => {
                // A length-coded property: copy the integer and its
                // percentage state.
                if let (Some(value), Some(bit)) = (src.length(prop), prop.length_bit()) {
                    if let Some(slot) = self.values.length_mut(prop) {
                        *slot = value;
                    }
                    self.em_mask.clear(bit);
                    self.ex_mask.clear(bit);
                    if src.percent_mask.contains(bit) {
                        self.values.percent_mask.set(bit);
                    } else {
                        self.values.percent_mask.clear(bit);
                    }
                }
            }
        }
    }

    fn set_enum(&mut self, prop: Property, terms: &[Term]) {
        let Some(word) = single_ident(terms) else {
            return self.reject(prop);
        };
        let word = word.to_ascii_lowercase();
        macro_rules! assign {
            ($field:ident) => {
                match word.parse() {
                    Ok(v) => self.values.$field = v,
                    Err(_) => return self.reject(prop),
                }
            };
        }
        use Property::*;
        match prop {
            Display => assign!(display),
            Float => assign!(float),
            Clear => assign!(clear),
            Position => assign!(position),
            Overflow => assign!(overflow),
            Visibility => assign!(visibility),
            Direction => assign!(direction),
            TextAlign => assign!(text_align),
            TextDecoration => assign!(text_decoration),
            TextTransform => assign!(text_transform),
            WhiteSpace => assign!(white_space),
            FontVariant => assign!(font_variant),
            ListStyleType => assign!(list_style_type),
            ListStylePosition => assign!(list_style_position),
            BackgroundAttachment => assign!(background_attachment),
            BackgroundRepeat => assign!(background_repeat),
            BorderTopStyle => assign!(border_top_style),
            BorderRightStyle => assign!(border_right_style),
            BorderBottomStyle => assign!(border_bottom_style),
            BorderLeftStyle => assign!(border_left_style),
            OutlineStyle => assign!(outline_style),
            _ => self.reject(prop),
        }
    }

    /// Store a length-coded value: a sentinel keyword, a percentage (bit
    /// in the persistent mask), a deferred em/ex quantity (bit in a
    /// transient mask), or resolved pixels.
    fn set_length(&mut self, prop: Property, terms: &[Term], border: bool) {
        let [term] = terms else {
            return self.reject(prop);
        };
        let allowed = prop.allowed();
        let Some(bit) = prop.length_bit() else {
            return self.reject(prop);
        };
        let stored: i32 = match term {
            Term::Ident(word) => {
                let keyword = match word.to_ascii_lowercase().as_str() {
                    "auto" if allowed & allow::AUTO != 0 => Some(pixels::AUTO),
                    "none" if allowed & allow::NONE != 0 => Some(pixels::NONE),
                    "normal" if allowed & allow::NORMAL != 0 => Some(pixels::NORMAL),
                    "thin" if border => Some(self.zoomed(1)),
                    "medium" if border => Some(self.zoomed(2)),
                    "thick" if border => Some(self.zoomed(4)),
                    _ => None,
                };
                let Some(v) = keyword else {
                    return self.reject(prop);
                };
                self.clear_marks(bit);
                v
            }
            Term::Percent(v) => {
                if allowed & allow::PERCENT == 0 {
                    return self.reject(prop);
                }
                if *v < 0.0 && allowed & allow::NEGATIVE == 0 {
                    return self.reject(prop);
                }
                self.clear_marks(bit);
                self.values.percent_mask.set(bit);
                hundredths(*v)
            }
            Term::Number(v) | Term::Length { value: v, unit: LengthUnit::Px } => {
                if *v < 0.0 && allowed & allow::NEGATIVE == 0 {
                    return self.reject(prop);
                }
                self.clear_marks(bit);
                let px = round_px(*v);
                if border { self.zoomed(px) } else { px }
            }
            Term::Length { value, unit: LengthUnit::Em } => {
                if *value < 0.0 && allowed & allow::NEGATIVE == 0 {
                    return self.reject(prop);
                }
                self.clear_marks(bit);
                self.em_mask.set(bit);
                hundredths(*value)
            }
            Term::Length { value, unit: LengthUnit::Ex } => {
                if *value < 0.0 && allowed & allow::NEGATIVE == 0 {
                    return self.reject(prop);
                }
                self.clear_marks(bit);
                self.ex_mask.set(bit);
                hundredths(*value)
            }
            Term::Length { value, unit } => {
                if *value < 0.0 && allowed & allow::NEGATIVE == 0 {
                    return self.reject(prop);
                }
                let Some(physical) = physical_unit(*unit) else {
                    return self.reject(prop);
                };
                self.clear_marks(bit);
                let px = round_px(self.ctx.physical_pixels(*value, physical));
                if border { self.zoomed(px) } else { px }
            }
            _ => return self.reject(prop),
        };
        if let Some(slot) = self.values.length_mut(prop) {
            *slot = stored;
        }
    }

    fn clear_marks(&mut self, bit: u8) {
        self.values.percent_mask.clear(bit);
        self.em_mask.clear(bit);
        self.ex_mask.clear(bit);
    }

    fn zoomed(&self, px: i32) -> i32 {
        round_px(f64::from(px) * self.ctx.config.zoom)
    }

    fn set_color(&mut self, prop: Property, terms: &[Term]) {
        let [term] = terms else {
            return self.reject(prop);
        };
        let spelling = match term {
            Term::Ident(word) => word.clone(),
            Term::Hash(hex) => format!("#{hex}"),
            _ => return self.reject(prop),
        };
        let Some(handle) = self.ctx.colors.intern(&spelling) else {
            return self.reject(prop);
        };
        use Property::*;
        match prop {
            Color => self.values.color = handle,
            BackgroundColor => self.values.background_color = handle,
            BorderTopColor => {
                self.values.border_top_color = handle;
                self.color_set |= SET_BORDER_TOP;
            }
            BorderRightColor => {
                self.values.border_right_color = handle;
                self.color_set |= SET_BORDER_RIGHT;
            }
            BorderBottomColor => {
                self.values.border_bottom_color = handle;
                self.color_set |= SET_BORDER_BOTTOM;
            }
            BorderLeftColor => {
                self.values.border_left_color = handle;
                self.color_set |= SET_BORDER_LEFT;
            }
            OutlineColor => {
                self.values.outline_color = handle;
                self.color_set |= SET_OUTLINE;
            }
            _ => self.reject(prop),
        }
    }

    fn set_image(&mut self, prop: Property, terms: &[Term]) {
        let [term] = terms else {
            return self.reject(prop);
        };
        let value: Option<Rc<str>> = match term {
            Term::Ident(word) if word.eq_ignore_ascii_case("none") => None,
            Term::Url(url) => Some(Rc::from(url.as_str())),
            _ => return self.reject(prop),
        };
        match prop {
            Property::BackgroundImage => self.values.background_image = value,
            Property::ListStyleImage => self.values.list_style_image = value,
            _ => self.reject(prop),
        }
    }

    /// `counter-reset` / `counter-increment`: `none` or a list of
    /// identifiers each followed by an optional integer.
    fn set_counter_list(&mut self, prop: Property, terms: &[Term]) {
        if terms.len() == 1 && terms[0].is_ident("none") {
            match prop {
                Property::CounterReset => self.values.counter_reset = None,
                Property::CounterIncrement => self.values.counter_increment = None,
                _ => self.reject(prop),
            }
            return;
        }
        let default_delta = if prop == Property::CounterReset { 0 } else { 1 };
        let mut entries = Vec::new();
        let mut iter = terms.iter().peekable();
        while let Some(term) = iter.next() {
            let Term::Ident(name) = term else {
                return self.reject(prop);
            };
            let delta = match iter.peek() {
                Some(Term::Number(n)) => {
                    let n = *n;
                    let _ = iter.next();
                    round_px(n)
                }
                _ => default_delta,
            };
            entries.push(CounterEntry {
                name: name.clone(),
                delta,
            });
        }
        if entries.is_empty() {
            return self.reject(prop);
        }
        let list = Some(Rc::new(entries));
        match prop {
            Property::CounterReset => self.values.counter_reset = list,
            Property::CounterIncrement => self.values.counter_increment = list,
            _ => self.reject(prop),
        }
    }

    fn set_z_index(&mut self, terms: &[Term]) {
        match terms {
            [Term::Ident(word)] if word.eq_ignore_ascii_case("auto") => {
                self.values.z_index = pixels::AUTO;
            }
            [Term::Number(n)] => self.values.z_index = round_px(*n),
            _ => self.reject(Property::ZIndex),
        }
    }

    fn set_custom(&mut self, prop: Property, terms: &[Term]) {
        use Property::*;
        match prop {
            FontSize => self.set_font_size(terms),
            FontFamily => self.set_font_family(terms),
            FontStyle => self.set_font_style(terms),
            FontWeight => self.set_font_weight(terms),
            LineHeight => self.set_line_height(terms),
            VerticalAlign => self.set_vertical_align(terms),
            Content => self.set_content(terms),
            BackgroundPosition => self.set_background_position(terms),
            _ => self.reject(prop),
        }
    }

    /// [§ 15.7 'font-size'](https://www.w3.org/TR/CSS2/fonts.html#propdef-font-size)
    fn set_font_size(&mut self, terms: &[Term]) {
        let parent_tenths = self
            .parent
            .as_ref()
            .map_or(self.ctx.config.default_font_size_tenths, |p| {
                p.font.key.size_tenths
            });
        let tenths = match terms {
            [Term::Ident(word)] => {
                let table = self.ctx.config.font_size_table;
                match word.to_ascii_lowercase().as_str() {
                    "larger" if self.parent.is_some() => {
                        stepped_font_tenths(table, parent_tenths, true)
                    }
                    "smaller" if self.parent.is_some() => {
                        stepped_font_tenths(table, parent_tenths, false)
                    }
                    // On the root there is no size to step from.
                    "larger" | "smaller" => table[2] * 10,
                    keyword => {
                        let index = match keyword {
                            "xx-small" => 0,
                            "x-small" => 1,
                            "small" => 2,
                            "medium" => 3,
                            "large" => 4,
                            "x-large" => 5,
                            "xx-large" => 6,
                            _ => return self.reject(Property::FontSize),
                        };
                        table[index] * 10
                    }
                }
            }
            [Term::Percent(v)] if *v >= 0.0 => round_px(v / 100.0 * f64::from(parent_tenths)),
            [Term::Number(v)] | [Term::Length { value: v, unit: LengthUnit::Px }] if *v >= 0.0 => {
                self.tenths_from_pixels(*v)
            }
            [Term::Length { value, unit: LengthUnit::Em }] if *value >= 0.0 => {
                round_px(value * f64::from(parent_tenths))
            }
            [Term::Length { value, unit: LengthUnit::Ex }] if *value >= 0.0 => {
                round_px(value * f64::from(parent_tenths) / 2.0)
            }
            [Term::Length { value, unit }] if *value >= 0.0 => {
                let Some(physical) = physical_unit(*unit) else {
                    return self.reject(Property::FontSize);
                };
                self.tenths_from_pixels(self.ctx.physical_pixels(*value, physical))
            }
            _ => return self.reject(Property::FontSize),
        };
        self.size_tenths = tenths.max(1);
    }

    fn tenths_from_pixels(&self, px: f64) -> i32 {
        round_px(px / self.ctx.pixels_per_point() * 10.0)
    }

    fn set_font_family(&mut self, terms: &[Term]) {
        let mut families = Vec::new();
        for term in terms {
            match term {
                Term::Ident(word) => families.push(word.clone()),
                Term::Str(s) => families.push(s.clone()),
                _ => return self.reject(Property::FontFamily),
            }
        }
        if families.is_empty() {
            return self.reject(Property::FontFamily);
        }
        self.family = families.join(", ").to_ascii_lowercase();
    }

    fn set_font_style(&mut self, terms: &[Term]) {
        match single_ident(terms).map(str::to_ascii_lowercase).as_deref() {
            Some("normal") => self.italic = false,
            Some("italic" | "oblique") => self.italic = true,
            _ => self.reject(Property::FontStyle),
        }
    }

    /// [§ 15.6 'font-weight'](https://www.w3.org/TR/CSS2/fonts.html#propdef-font-weight)
    fn set_font_weight(&mut self, terms: &[Term]) {
        match terms {
            [Term::Ident(word)] => match word.to_ascii_lowercase().as_str() {
                "normal" | "lighter" => self.bold = false,
                "bold" | "bolder" => self.bold = true,
                _ => self.reject(Property::FontWeight),
            },
            [Term::Number(n)] => self.bold = *n >= 550.0,
            _ => self.reject(Property::FontWeight),
        }
    }

    /// `normal`, a scale factor (stored as `-100 * n`), a percentage of
    /// the font size (resolved at finish), or a length.
    ///
    /// [§ 10.8.1 'line-height'](https://www.w3.org/TR/CSS2/visudet.html#propdef-line-height)
    fn set_line_height(&mut self, terms: &[Term]) {
        let Some(bit) = Property::LineHeight.length_bit() else {
            return;
        };
        match terms {
            [Term::Ident(word)] if word.eq_ignore_ascii_case("normal") => {
                self.clear_marks(bit);
                self.line_height_percent = false;
                self.values.line_height = pixels::NORMAL;
            }
            [Term::Number(n)] if *n >= 0.0 => {
                self.clear_marks(bit);
                self.line_height_percent = false;
                self.values.line_height = -hundredths(*n);
            }
            [Term::Percent(v)] if *v >= 0.0 => {
                self.clear_marks(bit);
                self.line_height_percent = true;
                self.values.line_height = hundredths(*v / 100.0);
            }
            [Term::Length { value, unit: LengthUnit::Px }] if *value >= 0.0 => {
                self.clear_marks(bit);
                self.line_height_percent = false;
                self.values.line_height = round_px(*value);
            }
            [Term::Length { value, unit: LengthUnit::Em }] if *value >= 0.0 => {
                self.clear_marks(bit);
                self.line_height_percent = false;
                self.em_mask.set(bit);
                self.values.line_height = hundredths(*value);
            }
            [Term::Length { value, unit: LengthUnit::Ex }] if *value >= 0.0 => {
                self.clear_marks(bit);
                self.line_height_percent = false;
                self.ex_mask.set(bit);
                self.values.line_height = hundredths(*value);
            }
            [Term::Length { value, unit }] if *value >= 0.0 => {
                let Some(physical) = physical_unit(*unit) else {
                    return self.reject(Property::LineHeight);
                };
                self.clear_marks(bit);
                self.line_height_percent = false;
                self.values.line_height = round_px(self.ctx.physical_pixels(*value, physical));
            }
            _ => self.reject(Property::LineHeight),
        }
    }

    /// A keyword, a length offset, or a percentage of the element's own
    /// line-height (resolved at finish, once line-height is known).
    ///
    /// [§ 10.8.1 'vertical-align'](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
    fn set_vertical_align(&mut self, terms: &[Term]) {
        let Some(bit) = Property::VerticalAlign.length_bit() else {
            return;
        };
        match terms {
            [Term::Ident(word)] => match word.to_ascii_lowercase().parse::<VerticalAlign>() {
                Ok(v) => {
                    self.clear_marks(bit);
                    self.vertical_align_percent = false;
                    self.values.vertical_align = v;
                    self.values.vertical_align_length = 0;
                }
                Err(_) => self.reject(Property::VerticalAlign),
            },
            [Term::Percent(v)] => {
                self.clear_marks(bit);
                self.vertical_align_percent = true;
                self.values.vertical_align = VerticalAlign::Length;
                self.values.vertical_align_length = hundredths(*v / 100.0);
            }
            [Term::Number(v)] | [Term::Length { value: v, unit: LengthUnit::Px }] => {
                self.clear_marks(bit);
                self.vertical_align_percent = false;
                self.values.vertical_align = VerticalAlign::Length;
                self.values.vertical_align_length = round_px(*v);
            }
            [Term::Length { value, unit: LengthUnit::Em }] => {
                self.clear_marks(bit);
                self.vertical_align_percent = false;
                self.values.vertical_align = VerticalAlign::Length;
                self.em_mask.set(bit);
                self.values.vertical_align_length = hundredths(*value);
            }
            [Term::Length { value, unit: LengthUnit::Ex }] => {
                self.clear_marks(bit);
                self.vertical_align_percent = false;
                self.values.vertical_align = VerticalAlign::Length;
                self.ex_mask.set(bit);
                self.values.vertical_align_length = hundredths(*value);
            }
            _ => self.reject(Property::VerticalAlign),
        }
    }

    /// [§ 12.2 The 'content' property](https://www.w3.org/TR/CSS2/generate.html#content)
    fn set_content(&mut self, terms: &[Term]) {
        if let [Term::Ident(word)] = terms {
            if word.eq_ignore_ascii_case("none") || word.eq_ignore_ascii_case("normal") {
                self.values.content = None;
                return;
            }
        }
        let style_of = |name: &Option<String>| {
            name.as_deref()
                .and_then(|s| ListStyleType::from_str(&s.to_ascii_lowercase()).ok())
                .unwrap_or(ListStyleType::Decimal)
        };
        let mut fragments = Vec::new();
        for term in terms {
            match term {
                Term::Str(s) => fragments.push(ContentFragment::Literal(s.clone())),
                Term::Attr { name, .. } => fragments.push(ContentFragment::Attr(name.clone())),
                Term::Counter { name, style } => fragments.push(ContentFragment::Counter {
                    name: name.clone(),
                    style: style_of(style),
                }),
                Term::Counters {
                    name,
                    separator,
                    style,
                } => fragments.push(ContentFragment::Counters {
                    name: name.clone(),
                    separator: separator.clone(),
                    style: style_of(style),
                }),
                _ => return self.reject(Property::Content),
            }
        }
        if fragments.is_empty() {
            return self.reject(Property::Content);
        }
        self.values.content = Some(Rc::new(fragments));
    }

    /// `background-position`: one or two keyword/length/percentage
    /// values, keywords mapping to 0%/50%/100%.
    ///
    /// [§ 14.2.1 'background-position'](https://www.w3.org/TR/CSS2/colors.html#propdef-background-position)
    fn set_background_position(&mut self, terms: &[Term]) {
        if terms.is_empty() || terms.len() > 2 {
            return self.reject(Property::BackgroundPosition);
        }
        // (value, is_percent, axis): axis None means positional.
        let mut classified = Vec::with_capacity(2);
        for term in terms {
            let entry = match term {
                Term::Ident(word) => match word.to_ascii_lowercase().as_str() {
                    "left" => (0, true, Some(0)),
                    "right" => (10_000, true, Some(0)),
                    "top" => (0, true, Some(1)),
                    "bottom" => (10_000, true, Some(1)),
                    "center" => (5_000, true, None),
                    _ => return self.reject(Property::BackgroundPosition),
                },
                Term::Percent(v) => (hundredths(*v), true, None),
                Term::Number(v) | Term::Length { value: v, unit: LengthUnit::Px } => {
                    (round_px(*v), false, None)
                }
                _ => return self.reject(Property::BackgroundPosition),
            };
            classified.push(entry);
        }
        let (x, y) = match classified.as_slice() {
            [one] => (*one, (5_000, true, Some(1))),
            [a, b] => {
                // 'top 50%' style orderings put the vertical keyword
                // first; swap when the axes say so.
                if a.2 == Some(1) || b.2 == Some(0) {
                    (*b, *a)
                } else {
                    (*a, *b)
                }
            }
            _ => return self.reject(Property::BackgroundPosition),
        };
        for (prop, (value, percent, _)) in [
            (Property::BackgroundPositionX, x),
            (Property::BackgroundPositionY, y),
        ] {
            if let Some(bit) = prop.length_bit() {
                self.clear_marks(bit);
                if percent {
                    self.values.percent_mask.set(bit);
                }
            }
            if let Some(slot) = self.values.length_mut(prop) {
                *slot = value;
            }
        }
    }

    /// Resolve everything deferred on the final font, apply the
    /// multi-property fix-ups, and intern the result.
    ///
    /// # Errors
    ///
    /// [`StyleError::FontUnavailable`] if the font cache exhausts its
    /// degradation chain.
    pub fn finish(mut self) -> Result<ValuesHandle, StyleError> {
        // 1. Resolve the font; zoom and font scale apply to the
        //    requested size.
        let scale = self.ctx.config.zoom * self.ctx.config.font_scale;
        let key = FontKey {
            family: self.family.clone(),
            size_tenths: round_px(f64::from(self.size_tenths) * scale).max(1),
            italic: self.italic,
            bold: self.bold,
        };
        let font = self.ctx.fonts.intern(&key)?;
        let em = font.metrics.em_pixels;
        let ex = font.metrics.ex_pixels;
        self.values.font = font;

        // 2. Rescale deferred em/ex quantities.
        for prop in crate::properties::all_length_properties() {
            let Some(bit) = prop.length_bit() else { continue };
            let unit = if self.em_mask.contains(bit) {
                em
            } else if self.ex_mask.contains(bit) {
                ex
            } else {
                continue;
            };
            if let Some(slot) = self.values.length_mut(prop) {
                *slot = rescale_hundredths(*slot, unit);
            }
        }

        // 3. Percentage line-height resolves against the font size.
        if self.line_height_percent {
            self.values.line_height = rescale_hundredths(self.values.line_height, em);
        }

        // 4. Percentage vertical-align resolves against the used
        //    line-height.
        if self.vertical_align_percent {
            let line = match self.values.line_height {
                pixels::NORMAL => self.values.font.line_pixels(),
                v if v < 0 => rescale_hundredths(-v, em),
                v => v,
            };
            self.values.vertical_align_length =
                rescale_hundredths(self.values.vertical_align_length, line);
        }

        // 5. Unset border and outline colors take the value of 'color'.
        if self.color_set & SET_BORDER_TOP == 0 {
            self.values.border_top_color = Rc::clone(&self.values.color);
        }
        if self.color_set & SET_BORDER_RIGHT == 0 {
            self.values.border_right_color = Rc::clone(&self.values.color);
        }
        if self.color_set & SET_BORDER_BOTTOM == 0 {
            self.values.border_bottom_color = Rc::clone(&self.values.color);
        }
        if self.color_set & SET_BORDER_LEFT == 0 {
            self.values.border_left_color = Rc::clone(&self.values.color);
        }
        if self.color_set & SET_OUTLINE == 0 {
            self.values.outline_color = Rc::clone(&self.values.color);
        }

        // 6. An invisible border style zeroes the computed width.
        if !self.values.border_top_style.is_visible() {
            self.values.border_top_width = 0;
        }
        if !self.values.border_right_style.is_visible() {
            self.values.border_right_width = 0;
        }
        if !self.values.border_bottom_style.is_visible() {
            self.values.border_bottom_width = 0;
        }
        if !self.values.border_left_style.is_visible() {
            self.values.border_left_width = 0;
        }
        if !self.values.outline_style.is_visible() {
            self.values.outline_width = 0;
        }

        // 7. Table cells only honor four vertical-align values.
        if self.values.display == Display::TableCell
            && !self.values.vertical_align.is_cell_legal()
        {
            self.values.vertical_align = VerticalAlign::Baseline;
            self.values.vertical_align_length = 0;
        }

        // 8. Floated, absolutely positioned, and root boxes compute a
        //    block-level display.
        if self.is_root
            || self.values.float != Float::None
            || matches!(self.values.position, Position::Absolute | Position::Fixed)
        {
            self.values.display = self.values.display.blockified();
        }

        // 9. Relative offsets are over-constrained; one side of each
        //    pair mirrors the other.
        if self.values.position == Position::Relative {
            self.mirror_relative_pair(Property::Left, Property::Right);
            self.mirror_relative_pair(Property::Top, Property::Bottom);
        }

        Ok(self.ctx.values.intern(self.values))
    }

    /// [§ 9.4.3 Relative positioning](https://www.w3.org/TR/CSS2/visuren.html#relative-positioning):
    /// `a` wins when both sides are set; `auto` computes to the
    /// negation of the other side, or zero when both are `auto`.
    fn mirror_relative_pair(&mut self, a: Property, b: Property) {
        let (Some(bit_a), Some(bit_b)) = (a.length_bit(), b.length_bit()) else {
            return;
        };
        let va = self.values.length(a).unwrap_or(pixels::AUTO);
        let vb = self.values.length(b).unwrap_or(pixels::AUTO);
        let (new_a, new_b, percent) = match (va, vb) {
            (pixels::AUTO, pixels::AUTO) => (0, 0, false),
            (pixels::AUTO, v) => (-v, v, self.values.percent_mask.contains(bit_b)),
            (v, _) => (v, -v, self.values.percent_mask.contains(bit_a)),
        };
        if let Some(slot) = self.values.length_mut(a) {
            *slot = new_a;
        }
        if let Some(slot) = self.values.length_mut(b) {
            *slot = new_b;
        }
        if percent {
            self.values.percent_mask.set(bit_a);
            self.values.percent_mask.set(bit_b);
        } else {
            self.values.percent_mask.clear(bit_a);
            self.values.percent_mask.clear(bit_b);
        }
    }
}

fn single_ident(terms: &[Term]) -> Option<&str> {
    match terms {
        [Term::Ident(word)] => Some(word.as_str()),
        _ => None,
    }
}

fn round_px(v: f64) -> i32 {
    v.round() as i32
}

/// `larger`/`smaller` move the parent size by the point delta between
/// the adjacent entries of the size table surrounding it.
fn stepped_font_tenths(table: [i32; 7], parent_tenths: i32, larger: bool) -> i32 {
    let points = parent_tenths / 10;
    let delta = if larger {
        let mut i = 0;
        while i < 5 && table[i] < points {
            i += 1;
        }
        table[i + 1] - table[i]
    } else {
        let mut i = 1;
        while i < 6 && table[i] < points {
            i += 1;
        }
        table[i - 1] - table[i]
    };
    parent_tenths + delta * 10
}

fn hundredths(v: f64) -> i32 {
    (v * 100.0).round() as i32
}

const fn physical_unit(unit: LengthUnit) -> Option<PhysicalUnit> {
    match unit {
        LengthUnit::Pt => Some(PhysicalUnit::Pt),
        LengthUnit::Pc => Some(PhysicalUnit::Pc),
        LengthUnit::In => Some(PhysicalUnit::In),
        LengthUnit::Cm => Some(PhysicalUnit::Cm),
        LengthUnit::Mm => Some(PhysicalUnit::Mm),
        _ => None,
    }
}
