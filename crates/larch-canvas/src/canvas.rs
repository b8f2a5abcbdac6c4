//! The canvas: a tree of origin/clip scopes holding drawn primitives.
//!
//! Layout appends primitives in visitation order; painting derives its
//! own order later (see [`crate::sorter`]). The tree shape replaces
//! bracket markers in a flat list: an origin scope records the bounding
//! box of everything under it so a viewport-bounded traversal can skip
//! the whole subtree with one comparison, and a clip scope carries the
//! overflow region its contents are clipped to.

use std::rc::Rc;

use larch_common::Rect;
use larch_dom::NodeId;
use larch_style::{FontHandle, ValuesHandle};

use crate::items::{
    BoxFlags, BoxItem, ImageItem, ItemHandle, ItemKind, ItemRecord, LineItem, MarkerItem,
    MarkerKind, TextItem, WindowItem,
};

/// One text drawing request.
///
/// `index` addresses the run's first token within the node's text, so
/// a consumer can map any sub-range of the string back to source
/// positions.
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    /// The characters of the run.
    pub text: &'a str,
    /// Left edge.
    pub x: i32,
    /// Baseline y coordinate.
    pub baseline: i32,
    /// Advance width, measured by the layout engine.
    pub width: i32,
    /// First-token index into the owning text node.
    pub index: usize,
}

/// The clip record of an overflow scope.
#[derive(Debug)]
pub struct ClipRecord {
    /// The node whose `overflow` property clips (and may scroll) the
    /// scope's contents.
    pub node: NodeId,
    /// Clip width in the scope's local frame.
    pub w: i32,
    /// Clip height in the scope's local frame.
    pub h: i32,
}

/// One entry in a scope's ordered child list.
#[derive(Debug)]
pub enum ScopeChild {
    /// A leaf primitive.
    Item(ItemHandle),
    /// A nested scope.
    Scope(Scope),
}

/// A coordinate scope: a translation, an optional clip, a recorded
/// bounding box, and ordered children.
#[derive(Debug)]
pub struct Scope {
    /// Translation applied to everything inside.
    pub dx: i32,
    /// Translation applied to everything inside.
    pub dy: i32,
    /// Set when this is an overflow (clip) scope.
    pub clip: Option<ClipRecord>,
    /// Extent of the contents in the scope's local frame; for a clip
    /// scope, the clip rectangle itself (scrolling moves the contents,
    /// never the visible region).
    pub bbox: Rect,
    pub(crate) children: Vec<ScopeChild>,
}

impl Scope {
    /// The scope's children in draw order.
    #[must_use]
    pub fn children(&self) -> &[ScopeChild] {
        &self.children
    }
}

/// A display list under construction.
///
/// The running bounding box is the union of every drawn item's extent
/// in the canvas's current local frame; [`Canvas::wrap_overflow`]
/// resets the frame for subsequent siblings.
#[derive(Debug, Default)]
pub struct Canvas {
    pub(crate) root: Vec<ScopeChild>,
    bbox: Rect,
    size_only: bool,
}

impl Canvas {
    /// An empty canvas.
    #[must_use]
    pub fn new() -> Self {
        Canvas::default()
    }

    /// A measuring canvas: draw calls extend the bounding box but
    /// allocate no items. Used by layout measurement passes.
    #[must_use]
    pub fn measure() -> Self {
        Canvas {
            size_only: true,
            ..Canvas::default()
        }
    }

    /// The union of all drawn extents in the current local frame.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bbox
    }

    /// Top-level children in draw order.
    #[must_use]
    pub fn children(&self) -> &[ScopeChild] {
        &self.root
    }

    /// Mutable access to the top-level children, for incremental
    /// relayout: a driver may re-translate a spliced scope in place
    /// instead of rebuilding it, keeping item identity for the damage
    /// diff.
    pub fn children_mut(&mut self) -> &mut [ScopeChild] {
        &mut self.root
    }

    /// Number of primitives in the whole tree.
    #[must_use]
    pub fn item_count(&self) -> usize {
        fn count(children: &[ScopeChild]) -> usize {
            children
                .iter()
                .map(|c| match c {
                    ScopeChild::Item(_) => 1,
                    ScopeChild::Scope(s) => count(&s.children),
                })
                .sum()
        }
        count(&self.root)
    }

    fn push(&mut self, node: NodeId, kind: ItemKind) -> Option<ItemHandle> {
        let record = ItemRecord { node, kind };
        self.bbox = self.bbox.union(&record.bbox());
        if self.size_only {
            return None;
        }
        let handle = Rc::new(record);
        self.root.push(ScopeChild::Item(Rc::clone(&handle)));
        Some(handle)
    }

    /// Draw a text run.
    ///
    /// A run that continues the previous text item (same node, font,
    /// and baseline, starting where it ended) extends that item in
    /// place instead of allocating a new one.
    pub fn draw_text(&mut self, node: NodeId, run: TextRun<'_>, font: &FontHandle) {
        if let Some(ScopeChild::Item(last)) = self.root.last() {
            if last.node == node {
                if let ItemKind::Text(prev) = &last.kind {
                    if Rc::ptr_eq(&prev.font, font)
                        && prev.baseline == run.baseline
                        && prev.x + prev.width() == run.x
                    {
                        prev.extend(run.text, run.width);
                        let bbox = last.bbox();
                        self.bbox = self.bbox.union(&bbox);
                        return;
                    }
                }
            }
        }
        let _ = self.push(
            node,
            ItemKind::Text(TextItem::new(
                run.x,
                run.baseline,
                run.index,
                Rc::clone(font),
                run.text,
                run.width,
            )),
        );
    }

    /// Draw a text-decoration line.
    pub fn draw_line(&mut self, node: NodeId, line: LineItem) {
        let _ = self.push(node, ItemKind::Line(line));
    }

    /// Draw a border/background box. Returns the rectangle actually
    /// covered, which includes the outline painting outside the border
    /// edge.
    pub fn draw_box(
        &mut self,
        node: NodeId,
        rect: Rect,
        values: &ValuesHandle,
        flags: BoxFlags,
    ) -> Rect {
        let drawn = rect.expanded(values.outline_width.max(0));
        let _ = self.push(
            node,
            ItemKind::Box(BoxItem {
                rect,
                values: Rc::clone(values),
                flags,
            }),
        );
        drawn
    }

    /// Draw a replaced image.
    pub fn draw_image(&mut self, node: NodeId, rect: Rect, src: &str) {
        let _ = self.push(
            node,
            ItemKind::Image(ImageItem {
                rect,
                src: src.to_string(),
            }),
        );
    }

    /// Reserve a rectangle for an embedded widget.
    pub fn draw_window(&mut self, node: NodeId, rect: Rect) {
        let _ = self.push(node, ItemKind::Window(WindowItem::new(rect)));
    }

    /// Add a position bookmark or fixed-origin reset.
    pub fn add_marker(&mut self, node: NodeId, x: i32, y: i32, kind: MarkerKind) {
        let _ = self.push(node, ItemKind::Marker(MarkerItem { x, y, kind }));
    }

    /// Find, remove, and return the position of `node`'s line-box
    /// bookmark, in canvas coordinates.
    pub fn get_marker(&mut self, node: NodeId) -> Option<(i32, i32)> {
        fn take(children: &mut Vec<ScopeChild>, node: NodeId, ox: i32, oy: i32) -> Option<(i32, i32)> {
            let mut found = None;
            for (i, child) in children.iter().enumerate() {
                let ScopeChild::Item(item) = child else {
                    continue;
                };
                if item.node != node {
                    continue;
                }
                if let ItemKind::Marker(m) = &item.kind {
                    if m.kind == MarkerKind::LineBox {
                        found = Some((i, m.x + ox, m.y + oy));
                        break;
                    }
                }
            }
            if let Some((i, x, y)) = found {
                let _ = children.remove(i);
                return Some((x, y));
            }
            for child in children.iter_mut() {
                if let ScopeChild::Scope(s) = child {
                    let (dx, dy) = (s.dx, s.dy);
                    if let Some(pos) = take(&mut s.children, node, ox + dx, oy + dy) {
                        return Some(pos);
                    }
                }
            }
            None
        }
        take(&mut self.root, node, 0, 0)
    }

    /// Wrap everything drawn so far in a skippable scope recording the
    /// current bounding box. A bounded traversal whose range misses the
    /// recorded extent steps over the whole scope.
    pub fn wrap_origin(&mut self) {
        if self.root.is_empty() && self.bbox.is_empty() {
            return;
        }
        let children = std::mem::take(&mut self.root);
        self.root.push(ScopeChild::Scope(Scope {
            dx: 0,
            dy: 0,
            clip: None,
            bbox: self.bbox,
            children,
        }));
    }

    /// Wrap everything drawn so far in a clip scope for `node`'s
    /// overflow region, then reset the bounding box to `(0, 0, w, h)`:
    /// the clipped region is all later siblings can see of the contents.
    pub fn wrap_overflow(&mut self, node: NodeId, w: i32, h: i32) {
        let clip = Rect::new(0, 0, w, h);
        let children = std::mem::take(&mut self.root);
        if !children.is_empty() {
            self.root.push(ScopeChild::Scope(Scope {
                dx: 0,
                dy: 0,
                clip: Some(ClipRecord { node, w, h }),
                bbox: clip,
                children,
            }));
        }
        self.bbox = clip;
    }

    /// Splice another canvas in as a child scope translated by
    /// `(x, y)`. Item identity is preserved: records moved here still
    /// compare equal to snapshot references taken before the splice.
    pub fn append(&mut self, src: Canvas, x: i32, y: i32) {
        self.bbox = self.bbox.union(&src.bbox.translated(x, y));
        if self.size_only || src.root.is_empty() {
            return;
        }
        self.root.push(ScopeChild::Scope(Scope {
            dx: x,
            dy: y,
            clip: None,
            bbox: src.bbox,
            children: src.root,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larch_style::{FontKey, StyleContext};

    fn fixture() -> (StyleContext, ValuesHandle, FontHandle) {
        let mut ctx = StyleContext::headless().unwrap();
        let values = larch_style::style::Builder::new(&mut ctx, None, false)
            .finish()
            .unwrap();
        let font = ctx.fonts.intern(&FontKey::new("helvetica", 100)).unwrap();
        (ctx, values, font)
    }

    #[test]
    fn test_bounds_union_all_drawn_extents() {
        let (_ctx, values, _font) = fixture();
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(NodeId(1), Rect::new(0, 0, 10, 10), &values, BoxFlags::default());
        let _ = canvas.draw_box(NodeId(2), Rect::new(50, 40, 10, 10), &values, BoxFlags::default());
        assert_eq!(canvas.bounds(), Rect::from_corners(0, 0, 60, 50));
        assert_eq!(canvas.item_count(), 2);
    }

    #[test]
    fn test_measure_canvas_tracks_bounds_without_items() {
        let (_ctx, values, _font) = fixture();
        let mut canvas = Canvas::measure();
        let _ = canvas.draw_box(NodeId(1), Rect::new(5, 5, 20, 20), &values, BoxFlags::default());
        assert_eq!(canvas.bounds(), Rect::new(5, 5, 20, 20));
        assert_eq!(canvas.item_count(), 0);
    }

    #[test]
    fn test_adjacent_text_runs_coalesce() {
        let (_ctx, _values, font) = fixture();
        let mut canvas = Canvas::new();
        canvas.draw_text(
            NodeId(1),
            TextRun {
                text: "hello",
                x: 0,
                baseline: 20,
                width: 30,
                index: 0,
            },
            &font,
        );
        canvas.draw_text(
            NodeId(1),
            TextRun {
                text: " world",
                x: 30,
                baseline: 20,
                width: 36,
                index: 5,
            },
            &font,
        );
        assert_eq!(canvas.item_count(), 1);
        let ScopeChild::Item(item) = &canvas.children()[0] else {
            panic!("expected an item");
        };
        let ItemKind::Text(run) = &item.kind else {
            panic!("expected text");
        };
        assert_eq!(*run.text(), "hello world");
        assert_eq!(run.width(), 66);
        // A run at a different baseline starts a new item.
        canvas.draw_text(
            NodeId(1),
            TextRun {
                text: "below",
                x: 0,
                baseline: 40,
                width: 30,
                index: 11,
            },
            &font,
        );
        assert_eq!(canvas.item_count(), 2);
    }

    #[test]
    fn test_draw_box_returns_outline_inclusive_rect() {
        let mut ctx = StyleContext::headless().unwrap();
        let mut builder = larch_style::style::Builder::new(&mut ctx, None, false);
        builder.set(
            larch_style::Property::OutlineWidth,
            &larch_style::parse::parse_terms("3px"),
        );
        builder.set(
            larch_style::Property::OutlineStyle,
            &larch_style::parse::parse_terms("solid"),
        );
        let values = builder.finish().unwrap();
        let mut canvas = Canvas::new();
        let drawn = canvas.draw_box(NodeId(1), Rect::new(10, 10, 20, 20), &values, BoxFlags::default());
        assert_eq!(drawn, Rect::new(7, 7, 26, 26));
        assert_eq!(canvas.bounds(), drawn);
    }

    #[test]
    fn test_wrap_origin_records_extent_and_keeps_bounds() {
        let (_ctx, values, _font) = fixture();
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(NodeId(1), Rect::new(0, 100, 10, 10), &values, BoxFlags::default());
        canvas.wrap_origin();
        assert_eq!(canvas.bounds(), Rect::new(0, 100, 10, 10));
        let ScopeChild::Scope(scope) = &canvas.children()[0] else {
            panic!("expected a scope");
        };
        assert_eq!(scope.bbox, Rect::new(0, 100, 10, 10));
        assert!(scope.clip.is_none());
    }

    #[test]
    fn test_wrap_overflow_resets_local_frame() {
        let (_ctx, values, _font) = fixture();
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(NodeId(2), Rect::new(0, 0, 500, 900), &values, BoxFlags::default());
        canvas.wrap_overflow(NodeId(1), 100, 80);
        assert_eq!(canvas.bounds(), Rect::new(0, 0, 100, 80));
        let ScopeChild::Scope(scope) = &canvas.children()[0] else {
            panic!("expected a scope");
        };
        assert!(scope.clip.is_some());
        assert_eq!(scope.bbox, Rect::new(0, 0, 100, 80));
    }

    #[test]
    fn test_append_translates_bounds_and_preserves_identity() {
        let (_ctx, values, _font) = fixture();
        let mut inner = Canvas::new();
        let _ = inner.draw_box(NodeId(3), Rect::new(0, 0, 10, 10), &values, BoxFlags::default());
        let ScopeChild::Item(before) = &inner.children()[0] else {
            panic!("expected an item");
        };
        let before = Rc::clone(before);

        let mut outer = Canvas::new();
        outer.append(inner, 100, 200);
        assert_eq!(outer.bounds(), Rect::new(100, 200, 10, 10));
        let ScopeChild::Scope(scope) = &outer.children()[0] else {
            panic!("expected a scope");
        };
        let ScopeChild::Item(after) = &scope.children()[0] else {
            panic!("expected an item");
        };
        assert!(Rc::ptr_eq(&before, after));
    }

    #[test]
    fn test_marker_is_found_and_removed_once() {
        let (_ctx, _values, _font) = fixture();
        let mut canvas = Canvas::new();
        canvas.add_marker(NodeId(4), 15, 25, MarkerKind::LineBox);
        canvas.wrap_origin();
        let mut outer = Canvas::new();
        outer.append(canvas, 10, 10);
        assert_eq!(outer.get_marker(NodeId(4)), Some((25, 35)));
        assert_eq!(outer.get_marker(NodeId(4)), None);
    }
}
