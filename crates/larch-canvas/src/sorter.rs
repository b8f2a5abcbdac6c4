//! Painting-order replay of a search.
//!
//! The canvas holds items in layout-visitation order, which is not CSS
//! painting order once floats, positioning, and z-index are involved.
//! [`Canvas::sorted_search`] buckets every visible item by the stacking
//! rank its node resolved to (see the stacking index) and replays the
//! items in ascending rank, preserving insertion order within a rank.

use std::rc::Rc;

use larch_dom::DomTree;
use larch_style::StackingIndex;
use larch_style::values::keywords::TextDecoration;

use crate::canvas::Canvas;
use crate::items::{ItemHandle, ItemKind};
use crate::search::{OverflowRegion, ScrollProvider, SearchWindow};

/// The rank an item paints at, or `None` if it paints nothing.
///
/// Text and decoration lines order by their node's inline rank; a box
/// orders by its own stacking rank when the node establishes a context
/// (its background paints before everything inside the context),
/// otherwise by the inline or block rank matching its display level.
/// Boxes and lines with nothing visible to draw are discarded here so
/// they never enter the buckets.
fn paint_rank(item: &ItemHandle, tree: &DomTree, stacking: &StackingIndex) -> Option<i32> {
    let ranks = stacking.ranks_for(tree, item.node)?;
    match &item.kind {
        ItemKind::Marker(_) => None,
        ItemKind::Text(_) => Some(ranks.inline),
        ItemKind::Line(line) => {
            if line.values.text_decoration == TextDecoration::None {
                None
            } else {
                Some(ranks.inline)
            }
        }
        ItemKind::Box(boxed) => {
            if !boxed.values.paints_box() {
                None
            } else if stacking.is_context(item.node) {
                Some(ranks.stacking)
            } else if boxed.values.display.is_inline_level() {
                Some(ranks.inline)
            } else {
                Some(ranks.block)
            }
        }
        ItemKind::Image(_) | ItemKind::Window(_) => {
            if stacking.is_context(item.node) {
                Some(ranks.stacking)
            } else {
                Some(ranks.block)
            }
        }
    }
}

/// One collected entry: rank, then insertion order.
pub(crate) struct PaintEntry {
    pub(crate) item: ItemHandle,
    pub(crate) origin_x: i32,
    pub(crate) origin_y: i32,
    pub(crate) overflow: Option<OverflowRegion>,
}

impl Canvas {
    pub(crate) fn collect_paint_order(
        &self,
        window: SearchWindow,
        scroll: Option<&ScrollProvider<'_>>,
        tree: &DomTree,
        stacking: &StackingIndex,
    ) -> Vec<PaintEntry> {
        let mut keyed: Vec<(i32, PaintEntry)> = Vec::new();
        let _ = self.search(window, scroll, &mut |item, ox, oy, overflow| {
            if let Some(rank) = paint_rank(item, tree, stacking) {
                keyed.push((
                    rank,
                    PaintEntry {
                        item: Rc::clone(item),
                        origin_x: ox,
                        origin_y: oy,
                        overflow: overflow.copied(),
                    },
                ));
            }
            true
        });
        // Stable: items within one rank keep their draw order.
        keyed.sort_by_key(|&(rank, _)| rank);
        keyed.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Visit every visible item in CSS painting order.
    ///
    /// Runs [`Canvas::search`] over the window, buckets the visible
    /// items by stacking rank, and replays them in ascending rank.
    pub fn sorted_search<F>(
        &self,
        window: SearchWindow,
        scroll: Option<&ScrollProvider<'_>>,
        tree: &DomTree,
        stacking: &StackingIndex,
        cb: &mut F,
    ) where
        F: FnMut(&ItemHandle, i32, i32, Option<&OverflowRegion>),
    {
        for entry in self.collect_paint_order(window, scroll, tree, stacking) {
            cb(
                &entry.item,
                entry.origin_x,
                entry.origin_y,
                entry.overflow.as_ref(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::BoxFlags;
    use larch_common::Rect;
    use larch_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};
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

    #[test]
    fn test_z_index_overrides_draw_order() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html", "");
        let body = element(&mut tree, html, "body", "");
        let high = element(
            &mut tree,
            body,
            "div",
            "position: absolute; z-index: 5; background-color: red",
        );
        let low = element(
            &mut tree,
            body,
            "div",
            "position: absolute; z-index: 2; background-color: blue",
        );
        let mut engine = StyleEngine::headless().unwrap();
        engine.mark_dirty(NodeId::ROOT);
        let _ = engine.restyle(&tree).unwrap();

        let mut canvas = Canvas::new();
        // Layout emits the high-z box first; paint order must not.
        let hv = Rc::clone(engine.computed_values(&tree, high).unwrap());
        let lv = Rc::clone(engine.computed_values(&tree, low).unwrap());
        let _ = canvas.draw_box(high, Rect::new(0, 0, 10, 10), &hv, BoxFlags::default());
        let _ = canvas.draw_box(low, Rect::new(20, 0, 10, 10), &lv, BoxFlags::default());

        let mut order = Vec::new();
        canvas.sorted_search(
            SearchWindow::default(),
            None,
            &tree,
            engine.stacking(),
            &mut |item, _, _, _| order.push(item.node),
        );
        assert_eq!(order, vec![low, high]);
    }

    #[test]
    fn test_boxes_with_nothing_to_paint_are_filtered() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html", "");
        let body = element(&mut tree, html, "body", "");
        let plain = element(&mut tree, body, "div", "");
        let painted = element(&mut tree, body, "div", "background-color: green");
        let mut engine = StyleEngine::headless().unwrap();
        engine.mark_dirty(NodeId::ROOT);
        let _ = engine.restyle(&tree).unwrap();

        let mut canvas = Canvas::new();
        let pv = Rc::clone(engine.computed_values(&tree, plain).unwrap());
        let gv = Rc::clone(engine.computed_values(&tree, painted).unwrap());
        let _ = canvas.draw_box(plain, Rect::new(0, 0, 10, 10), &pv, BoxFlags::default());
        let _ = canvas.draw_box(painted, Rect::new(0, 20, 10, 10), &gv, BoxFlags::default());

        let mut order = Vec::new();
        canvas.sorted_search(
            SearchWindow::default(),
            None,
            &tree,
            engine.stacking(),
            &mut |item, _, _, _| order.push(item.node),
        );
        assert_eq!(order, vec![painted]);
    }
}
