//! Classifies the difference between two computed-value sets.
//!
//! Restyling a node yields a new interned set; the engine compares it
//! with the previous one to decide how much downstream work the change
//! requires. Interning makes the common case free: an unchanged node
//! compares pointer-equal and is dismissed in one instruction.

use std::rc::Rc;

use crate::properties::Property;
use crate::style::computed::ComputedValues;

/// How much work a node's style change requires, in increasing order of
/// cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StyleChange {
    /// Same interned set; nothing to do.
    Unchanged,
    /// Only paint-level properties differ; boxes do not move.
    Repaint,
    /// Geometry-affecting properties differ; layout must rerun.
    Relayout,
    /// Generated content or counter lists differ; the node's generated
    /// boxes must be rebuilt (which implies relayout).
    Content,
}

impl StyleChange {
    /// The stronger of two classifications.
    #[must_use]
    pub fn max(self, other: StyleChange) -> StyleChange {
        if other > self { other } else { self }
    }
}

/// Classify the transition from `old` to `new`.
///
/// `None` for `old` means the node has never been styled, which always
/// requires layout.
#[must_use]
pub fn classify(old: Option<&Rc<ComputedValues>>, new: &Rc<ComputedValues>) -> StyleChange {
    let Some(old) = old else {
        return StyleChange::Relayout;
    };
    if Rc::ptr_eq(old, new) {
        return StyleChange::Unchanged;
    }
    if old.content != new.content
        || old.counter_reset != new.counter_reset
        || old.counter_increment != new.counter_increment
    {
        return StyleChange::Content;
    }
    if layout_equal(old, new) {
        // The sets differ (they are distinct interned instances), but
        // only in paint-level fields.
        StyleChange::Repaint
    } else {
        StyleChange::Relayout
    }
}

/// True if every geometry-affecting field matches.
///
/// The excluded fields are exactly the `nolayout` set from the property
/// table: decorations, colors, the background (image, attachment,
/// repeat, position), and visibility.
fn layout_equal(a: &ComputedValues, b: &ComputedValues) -> bool {
    let paint_only = Property::paint_only_mask();
    a.display == b.display
        && a.float == b.float
        && a.clear == b.clear
        && a.position == b.position
        && a.overflow == b.overflow
        && a.direction == b.direction
        && a.text_align == b.text_align
        && a.text_transform == b.text_transform
        && a.white_space == b.white_space
        && a.font_variant == b.font_variant
        && a.list_style_type == b.list_style_type
        && a.list_style_position == b.list_style_position
        && a.list_style_image == b.list_style_image
        && a.border_top_style == b.border_top_style
        && a.border_right_style == b.border_right_style
        && a.border_bottom_style == b.border_bottom_style
        && a.border_left_style == b.border_left_style
        && a.outline_style == b.outline_style
        && a.vertical_align == b.vertical_align
        && a.vertical_align_length == b.vertical_align_length
        && a.width == b.width
        && a.height == b.height
        && a.min_width == b.min_width
        && a.min_height == b.min_height
        && a.max_width == b.max_width
        && a.max_height == b.max_height
        && a.margin_top == b.margin_top
        && a.margin_right == b.margin_right
        && a.margin_bottom == b.margin_bottom
        && a.margin_left == b.margin_left
        && a.padding_top == b.padding_top
        && a.padding_right == b.padding_right
        && a.padding_bottom == b.padding_bottom
        && a.padding_left == b.padding_left
        && a.top == b.top
        && a.right == b.right
        && a.bottom == b.bottom
        && a.left == b.left
        && a.text_indent == b.text_indent
        && a.letter_spacing == b.letter_spacing
        && a.word_spacing == b.word_spacing
        && a.border_spacing == b.border_spacing
        && a.border_top_width == b.border_top_width
        && a.border_right_width == b.border_right_width
        && a.border_bottom_width == b.border_bottom_width
        && a.border_left_width == b.border_left_width
        && a.outline_width == b.outline_width
        && a.line_height == b.line_height
        && a.z_index == b.z_index
        && Rc::ptr_eq(&a.font, &b.font)
        && a.percent_mask.difference(paint_only) == b.percent_mask.difference(paint_only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StyleContext;
    use crate::parse::parse_terms;
    use crate::style::builder::Builder;

    fn styled(ctx: &mut StyleContext, decls: &[(Property, &str)]) -> Rc<ComputedValues> {
        let mut builder = Builder::new(ctx, None, false);
        for (prop, value) in decls {
            builder.set(*prop, &parse_terms(value));
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_identical_sets_are_unchanged() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[(Property::Color, "red")]);
        let b = styled(&mut ctx, &[(Property::Color, "red")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Unchanged);
    }

    #[test]
    fn test_color_change_is_repaint_only() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[(Property::BackgroundColor, "red")]);
        let b = styled(&mut ctx, &[(Property::BackgroundColor, "blue")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Repaint);
    }

    #[test]
    fn test_visibility_change_is_repaint_only() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[]);
        let b = styled(&mut ctx, &[(Property::Visibility, "hidden")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Repaint);
    }

    #[test]
    fn test_width_change_needs_relayout() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[(Property::Width, "100px")]);
        let b = styled(&mut ctx, &[(Property::Width, "200px")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Relayout);
    }

    #[test]
    fn test_percent_vs_absolute_width_needs_relayout() {
        let mut ctx = StyleContext::headless().unwrap();
        // 50% stores 5000; 5000px stores the same integer, so only the
        // mask distinguishes them.
        let a = styled(&mut ctx, &[(Property::Width, "50%")]);
        let b = styled(&mut ctx, &[(Property::Width, "5000px")]);
        assert_eq!(a.width, b.width);
        assert_eq!(classify(Some(&a), &b), StyleChange::Relayout);
    }

    #[test]
    fn test_background_position_percent_state_is_paint_only() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[(Property::BackgroundPosition, "50% 50%")]);
        let b = styled(&mut ctx, &[(Property::BackgroundPosition, "5000px 5000px")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Repaint);
    }

    #[test]
    fn test_font_change_needs_relayout() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[]);
        let b = styled(&mut ctx, &[(Property::FontSize, "24pt")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Relayout);
    }

    #[test]
    fn test_counter_and_content_changes_rank_highest() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[]);
        let b = styled(&mut ctx, &[(Property::CounterIncrement, "chapter")]);
        assert_eq!(classify(Some(&a), &b), StyleChange::Content);
        let c = styled(&mut ctx, &[(Property::Content, "\"x\"")]);
        assert_eq!(classify(Some(&a), &c), StyleChange::Content);
    }

    #[test]
    fn test_first_style_needs_relayout() {
        let mut ctx = StyleContext::headless().unwrap();
        let a = styled(&mut ctx, &[]);
        assert_eq!(classify(None, &a), StyleChange::Relayout);
    }
}
