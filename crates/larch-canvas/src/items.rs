//! Display-list primitives.
//!
//! Every drawn thing is an [`ItemRecord`] behind an [`ItemHandle`]. The
//! handle is the item's identity: a retained snapshot and the live
//! canvas share the same record, and the damage diff recognizes "the
//! same item moved" by pointer equality rather than by any id scheme.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use larch_common::Rect;
use larch_dom::NodeId;
use larch_style::{FontHandle, ValuesHandle};

/// A shared display-list item.
pub type ItemHandle = Rc<ItemRecord>;

/// One drawn primitive: the owning node plus the kind-specific payload.
#[derive(Debug)]
pub struct ItemRecord {
    /// The document node this item renders.
    pub node: NodeId,
    /// The primitive payload.
    pub kind: ItemKind,
}

/// The primitive kinds a canvas can hold.
#[derive(Debug)]
pub enum ItemKind {
    /// A run of text on one baseline.
    Text(TextItem),
    /// A text-decoration line.
    Line(LineItem),
    /// A border/background box.
    Box(BoxItem),
    /// A replaced image.
    Image(ImageItem),
    /// An embedded widget.
    Window(WindowItem),
    /// A position bookmark or fixed-position origin reset.
    Marker(MarkerItem),
}

impl ItemRecord {
    /// The item's extent in its scope's local coordinates.
    ///
    /// Text extends a full line (ascent above the baseline, descent
    /// below); boxes include their outline, which paints outside the
    /// border edge; markers are zero-area.
    #[must_use]
    pub fn bbox(&self) -> Rect {
        match &self.kind {
            ItemKind::Text(t) => Rect::new(
                t.x,
                t.baseline - t.font.metrics.ascent,
                t.width(),
                t.font.line_pixels(),
            ),
            ItemKind::Line(l) => {
                let depth = l.underline_offset.max(l.through_offset) + 1;
                Rect::new(l.x, l.y, l.w, depth)
            }
            ItemKind::Box(b) => b.rect.expanded(b.values.outline_width.max(0)),
            ItemKind::Image(i) => i.rect,
            ItemKind::Window(w) => w.rect,
            ItemKind::Marker(m) => Rect::new(m.x, m.y, 0, 0),
        }
    }
}

/// A text run: position, font, and a growable string.
///
/// Layout emits one draw call per word or glyph cluster; adjacent runs
/// on the same baseline coalesce into one item by appending to the
/// string and widening the advance, so the width and text sit behind
/// `Cell`/`RefCell` while everything else stays immutable.
#[derive(Debug)]
pub struct TextItem {
    /// Left edge.
    pub x: i32,
    /// Baseline y coordinate.
    pub baseline: i32,
    /// Index of the first text token this run covers, for sub-range
    /// addressing back into the source text node.
    pub index: usize,
    /// The run's font.
    pub font: FontHandle,
    width: Cell<i32>,
    text: RefCell<String>,
}

impl TextItem {
    pub(crate) fn new(x: i32, baseline: i32, index: usize, font: FontHandle, text: &str, width: i32) -> Self {
        TextItem {
            x,
            baseline,
            index,
            font,
            width: Cell::new(width),
            text: RefCell::new(text.to_string()),
        }
    }

    /// The run's advance width in pixels.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width.get()
    }

    /// The accumulated text of the run.
    #[must_use]
    pub fn text(&self) -> Ref<'_, String> {
        self.text.borrow()
    }

    /// Append a continuation run.
    pub(crate) fn extend(&self, text: &str, advance: i32) {
        self.text.borrow_mut().push_str(text);
        self.width.set(self.width.get() + advance);
    }
}

/// A text-decoration line spanning `w` pixels.
///
/// The line box's top is `y`; the underline and line-through rows are
/// offsets below it, so the painter can draw either (or both) from one
/// item.
#[derive(Debug)]
pub struct LineItem {
    /// Left edge.
    pub x: i32,
    /// Top of the decorated line box.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Underline row, relative to `y`.
    pub underline_offset: i32,
    /// Line-through row, relative to `y`.
    pub through_offset: i32,
    /// Style of the decorated node (decoration kind and color).
    pub values: ValuesHandle,
}

/// Border-drawing suppression flags for boxes split across lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxFlags(pub u8);

impl BoxFlags {
    /// The left border is suppressed (the box continues a previous
    /// line's fragment).
    pub const OPEN_LEFT: BoxFlags = BoxFlags(1 << 0);
    /// The right border is suppressed (the box continues on the next
    /// line).
    pub const OPEN_RIGHT: BoxFlags = BoxFlags(1 << 1);

    /// True if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: BoxFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of both flag sets.
    #[must_use]
    pub const fn with(self, other: BoxFlags) -> BoxFlags {
        BoxFlags(self.0 | other.0)
    }
}

/// A border/background box.
#[derive(Debug)]
pub struct BoxItem {
    /// The border-box rectangle.
    pub rect: Rect,
    /// The owning node's computed values (borders, background, outline).
    pub values: ValuesHandle,
    /// Which borders to suppress.
    pub flags: BoxFlags,
}

/// A replaced image.
#[derive(Debug)]
pub struct ImageItem {
    /// Where the image paints.
    pub rect: Rect,
    /// The image source reference.
    pub src: String,
}

/// An embedded widget occupying a rectangle of the document.
///
/// The platform layer positions the real widget lazily and caches the
/// screen coordinates it last used; the damage diff resets the cache to
/// an off-screen sentinel so the next layout pass repositions it.
#[derive(Debug)]
pub struct WindowItem {
    /// Where the widget belongs, in canvas coordinates.
    pub rect: Rect,
    cached_pos: Cell<(i32, i32)>,
}

impl WindowItem {
    /// Sentinel meaning "not positioned yet".
    pub const UNPLACED: (i32, i32) = (-10000, -10000);

    pub(crate) fn new(rect: Rect) -> Self {
        WindowItem {
            rect,
            cached_pos: Cell::new(Self::UNPLACED),
        }
    }

    /// The screen position the widget was last placed at.
    #[must_use]
    pub fn cached_position(&self) -> (i32, i32) {
        self.cached_pos.get()
    }

    /// Record the screen position the widget was placed at.
    pub fn set_cached_position(&self, x: i32, y: i32) {
        self.cached_pos.set((x, y));
    }

    /// Forget the cached position, forcing the next pass to reposition.
    pub fn invalidate_position(&self) {
        self.cached_pos.set(Self::UNPLACED);
    }
}

/// What a marker item means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Subsequent siblings are fixed-position content: the search origin
    /// resets to the viewport scroll position here.
    Fixed,
    /// A line-box bookmark, consumed by find-and-remove lookup.
    LineBox,
}

/// A zero-area position bookmark.
#[derive(Debug)]
pub struct MarkerItem {
    /// Bookmark x.
    pub x: i32,
    /// Bookmark y.
    pub y: i32,
    /// Interpretation of the marker.
    pub kind: MarkerKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use larch_style::{FontKey, StyleContext};

    fn font() -> FontHandle {
        let mut ctx = StyleContext::headless().unwrap();
        ctx.fonts.intern(&FontKey::new("helvetica", 100)).unwrap()
    }

    #[test]
    fn test_text_bbox_spans_ascent_and_descent() {
        let f = font();
        let item = ItemRecord {
            node: NodeId(1),
            kind: ItemKind::Text(TextItem::new(10, 30, 0, Rc::clone(&f), "hi", 14)),
        };
        let b = item.bbox();
        assert_eq!(b.x, 10);
        assert_eq!(b.y, 30 - f.metrics.ascent);
        assert_eq!(b.w, 14);
        assert_eq!(b.h, f.line_pixels());
    }

    #[test]
    fn test_text_extension_grows_width_and_text() {
        let t = TextItem::new(0, 10, 0, font(), "foo", 20);
        t.extend(" bar", 25);
        assert_eq!(t.width(), 45);
        assert_eq!(*t.text(), "foo bar");
    }

    #[test]
    fn test_window_position_cache_invalidates_to_sentinel() {
        let w = WindowItem::new(Rect::new(0, 0, 40, 40));
        assert_eq!(w.cached_position(), WindowItem::UNPLACED);
        w.set_cached_position(100, 200);
        assert_eq!(w.cached_position(), (100, 200));
        w.invalidate_position();
        assert_eq!(w.cached_position(), WindowItem::UNPLACED);
    }

    #[test]
    fn test_box_flags_combine() {
        let f = BoxFlags::OPEN_LEFT.with(BoxFlags::OPEN_RIGHT);
        assert!(f.contains(BoxFlags::OPEN_LEFT));
        assert!(f.contains(BoxFlags::OPEN_RIGHT));
        assert!(!BoxFlags::default().contains(BoxFlags::OPEN_LEFT));
    }
}
