//! Snapshots of the visible display list and the damage diff between
//! two of them.
//!
//! A snapshot retains the painting-order sequence of visible items by
//! sharing the live canvas's records, so diffing two snapshots can
//! recognize "the same item" across passes by handle identity and
//! classify each position as untouched, moved, dirty, deleted, or
//! created. The union of the marked geometries, widened by one pixel
//! against anti-aliasing seams, is the region the embedder must
//! repaint.

use std::collections::HashSet;
use std::rc::Rc;

use larch_common::Rect;
use larch_dom::{DomTree, NodeId};
use larch_style::StackingIndex;

use crate::canvas::Canvas;
use crate::items::{ItemHandle, ItemKind, ItemRecord};
use crate::search::{ScrollProvider, SearchWindow};

/// One visible item at the absolute geometry it painted with.
#[derive(Debug)]
pub struct SnapEntry {
    item: ItemHandle,
    rect: Rect,
}

impl SnapEntry {
    /// The captured item.
    #[must_use]
    pub fn item(&self) -> &ItemHandle {
        &self.item
    }

    /// The item's absolute extent at capture time.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }
}

/// The visible painting-order sequence at one point in time.
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: Vec<SnapEntry>,
}

impl Snapshot {
    /// Captured entries in painting order.
    #[must_use]
    pub fn entries(&self) -> &[SnapEntry] {
        &self.entries
    }

    /// Number of captured items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Canvas {
    /// Capture the painting-order sequence of items visible in
    /// `viewport`. Records are shared with the live canvas, not copied.
    #[must_use]
    pub fn snapshot(
        &self,
        viewport: Rect,
        scroll: Option<&ScrollProvider<'_>>,
        tree: &DomTree,
        stacking: &StackingIndex,
    ) -> Snapshot {
        let window = SearchWindow {
            y_range: Some((viewport.y, viewport.bottom())),
            viewport_scroll: (viewport.x, viewport.y),
        };
        let entries = self
            .collect_paint_order(window, scroll, tree, stacking)
            .into_iter()
            .map(|entry| SnapEntry {
                rect: entry.item.bbox().translated(entry.origin_x, entry.origin_y),
                item: entry.item,
            })
            .collect();
        Snapshot { entries }
    }
}

/// The region that must repaint to go from `old` to `new`.
///
/// Both snapshots are in the same canonical painting order, so a
/// lock-step merge walk classifies every position: an identical item at
/// identical geometry whose node was not in `restyled` costs nothing;
/// a moved item damages both geometries; a restyled one damages the
/// new; items on one side only damage the side they are on. Damaged
/// window items additionally lose their cached screen position so the
/// embedder repositions them.
///
/// Returns `None` when nothing visible changed; otherwise the union of
/// damaged geometries expanded by one pixel.
#[must_use]
pub fn damage(old: &Snapshot, new: &Snapshot, restyled: &HashSet<NodeId>) -> Option<Rect> {
    let old_ids: HashSet<*const ItemRecord> =
        old.entries.iter().map(|e| Rc::as_ptr(&e.item)).collect();
    let new_ids: HashSet<*const ItemRecord> =
        new.entries.iter().map(|e| Rc::as_ptr(&e.item)).collect();

    let mut region = Rect::ZERO;
    let mut mark = |entry: &SnapEntry| {
        region = region.union(&entry.rect);
        if let ItemKind::Window(window) = &entry.item.kind {
            window.invalidate_position();
        }
    };

    let mut i = 0;
    let mut j = 0;
    while i < old.entries.len() && j < new.entries.len() {
        let a = &old.entries[i];
        let b = &new.entries[j];
        if Rc::ptr_eq(&a.item, &b.item) {
            if a.rect != b.rect {
                // Moved: both the vacated and the occupied geometry.
                mark(a);
                mark(b);
            } else if restyled.contains(&a.item.node) {
                mark(b);
            }
            i += 1;
            j += 1;
        } else if !new_ids.contains(&Rc::as_ptr(&a.item)) {
            // Deleted.
            mark(a);
            i += 1;
        } else if !old_ids.contains(&Rc::as_ptr(&b.item)) {
            // Created.
            mark(b);
            j += 1;
        } else {
            // Both survive but their relative paint order flipped;
            // repaint both to be safe.
            mark(a);
            mark(b);
            i += 1;
            j += 1;
        }
    }
    for entry in &old.entries[i..] {
        mark(entry);
    }
    for entry in &new.entries[j..] {
        mark(entry);
    }

    if region.is_empty() {
        None
    } else {
        Some(region.expanded(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::BoxFlags;
    use larch_dom::{AttributesMap, ElementData, NodeType};
    use larch_style::StyleEngine;

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str, style: &str) -> NodeId {
        let mut attrs = AttributesMap::new();
        let _ = attrs.insert("style".to_string(), style.to_string());
        let id = tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs,
        }));
        tree.append_child(parent, id);
        id
    }

    fn styled_document() -> (DomTree, StyleEngine, NodeId) {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html", "");
        let body = element(&mut tree, html, "body", "");
        let div = element(&mut tree, body, "div", "background-color: red");
        let mut engine = StyleEngine::headless().unwrap();
        engine.mark_dirty(NodeId::ROOT);
        let _ = engine.restyle(&tree).unwrap();
        (tree, engine, div)
    }

    const VIEWPORT: Rect = Rect::new(0, 0, 800, 600);

    #[test]
    fn test_same_state_diffs_to_no_damage() {
        let (tree, engine, div) = styled_document();
        let values = Rc::clone(engine.computed_values(&tree, div).unwrap());
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(div, Rect::new(10, 10, 50, 50), &values, BoxFlags::default());

        let a = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
        let b = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
        assert_eq!(a.len(), 1);
        assert_eq!(damage(&a, &b, &HashSet::new()), None);
    }

    #[test]
    fn test_restyled_node_damages_its_geometry() {
        let (tree, engine, div) = styled_document();
        let values = Rc::clone(engine.computed_values(&tree, div).unwrap());
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(div, Rect::new(10, 10, 50, 50), &values, BoxFlags::default());

        let a = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
        let b = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
        let restyled: HashSet<NodeId> = [div].into_iter().collect();
        let hit = damage(&a, &b, &restyled).unwrap();
        assert_eq!(hit, Rect::new(10, 10, 50, 50).expanded(1));
    }

    #[test]
    fn test_created_and_deleted_items_damage_their_side() {
        let (tree, engine, div) = styled_document();
        let values = Rc::clone(engine.computed_values(&tree, div).unwrap());

        let mut before = Canvas::new();
        let _ = before.draw_box(div, Rect::new(0, 0, 20, 20), &values, BoxFlags::default());
        let old = before.snapshot(VIEWPORT, None, &tree, engine.stacking());

        let mut after = Canvas::new();
        let _ = after.draw_box(div, Rect::new(100, 100, 20, 20), &values, BoxFlags::default());
        let new = after.snapshot(VIEWPORT, None, &tree, engine.stacking());

        // Different records: the old one is deleted, the new created.
        let hit = damage(&old, &new, &HashSet::new()).unwrap();
        assert_eq!(hit, Rect::from_corners(0, 0, 120, 120).expanded(1));
    }

    #[test]
    fn test_damaged_window_loses_cached_position() {
        let (tree, engine, div) = styled_document();
        let mut before = Canvas::new();
        before.draw_window(div, Rect::new(10, 10, 40, 40));
        let old = before.snapshot(VIEWPORT, None, &tree, engine.stacking());

        let ItemKind::Window(window) = &old.entries()[0].item().kind else {
            panic!("expected a window");
        };
        window.set_cached_position(10, 10);

        let empty = Canvas::new().snapshot(VIEWPORT, None, &tree, engine.stacking());
        assert!(damage(&old, &empty, &HashSet::new()).is_some());
        let ItemKind::Window(window) = &old.entries()[0].item().kind else {
            panic!("expected a window");
        };
        assert_eq!(window.cached_position(), crate::items::WindowItem::UNPLACED);
    }

    #[test]
    fn test_snapshot_is_viewport_scoped() {
        let (tree, engine, div) = styled_document();
        let values = Rc::clone(engine.computed_values(&tree, div).unwrap());
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(div, Rect::new(0, 10, 50, 50), &values, BoxFlags::default());
        let _ = canvas.draw_box(div, Rect::new(0, 5000, 50, 50), &values, BoxFlags::default());

        let snap = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.entries()[0].rect(), Rect::new(0, 10, 50, 50));
    }
}
