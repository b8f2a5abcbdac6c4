//! Viewport-bounded traversal of the canvas tree.
//!
//! The traversal keeps a running origin (the sum of enclosing scope
//! translations), an overflow stack (the active clip region and its
//! scroll state), and skips any scope whose recorded vertical extent
//! misses the query range. The skip is what makes viewport repaint
//! cheap for long documents: everything above and below the window is
//! stepped over one scope at a time.

use larch_common::Rect;
use larch_dom::NodeId;

use crate::canvas::{Canvas, Scope, ScopeChild};
use crate::items::{ItemHandle, ItemKind, MarkerKind};

/// Per-node scroll offsets for scrollable overflow regions.
pub type ScrollProvider<'a> = dyn Fn(NodeId) -> (i32, i32) + 'a;

/// The active clip region at a callback, in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowRegion {
    /// The node whose overflow region clips the item.
    pub node: NodeId,
    /// The visible rectangle, intersected with enclosing clips.
    pub clip: Rect,
    /// The region's horizontal scroll offset.
    pub scroll_x: i32,
    /// The region's vertical scroll offset.
    pub scroll_y: i32,
}

/// What a search visits and in which vertical window.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchWindow {
    /// Inclusive vertical range in absolute coordinates; `None` visits
    /// everything.
    pub y_range: Option<(i32, i32)>,
    /// The viewport scroll position, adopted as the origin by
    /// fixed-position content.
    pub viewport_scroll: (i32, i32),
}

impl SearchWindow {
    /// A window over `[y_min, y_max]` with no viewport scroll.
    #[must_use]
    pub fn rows(y_min: i32, y_max: i32) -> Self {
        SearchWindow {
            y_range: Some((y_min, y_max)),
            viewport_scroll: (0, 0),
        }
    }

    /// True if a local extent, placed at `oy`, misses the range.
    fn misses(&self, bbox: &Rect, oy: i32) -> bool {
        match self.y_range {
            Some((y_min, y_max)) => oy + bbox.y > y_max || oy + bbox.bottom() < y_min,
            None => false,
        }
    }
}

impl Canvas {
    /// Visit every item intersecting the window, in draw order.
    ///
    /// The callback receives the item, the accumulated origin of its
    /// scope, and the active overflow region, and returns `false` to
    /// abort the traversal (hit testing stops at the first match).
    /// Returns `false` if the traversal was aborted.
    pub fn search<F>(
        &self,
        window: SearchWindow,
        scroll: Option<&ScrollProvider<'_>>,
        cb: &mut F,
    ) -> bool
    where
        F: FnMut(&ItemHandle, i32, i32, Option<&OverflowRegion>) -> bool,
    {
        let mut stack: Vec<OverflowRegion> = Vec::new();
        walk(&self.root, 0, 0, window, scroll, &mut stack, cb)
    }
}

fn walk<F>(
    children: &[ScopeChild],
    origin_x: i32,
    origin_y: i32,
    window: SearchWindow,
    scroll: Option<&ScrollProvider<'_>>,
    stack: &mut Vec<OverflowRegion>,
    cb: &mut F,
) -> bool
where
    F: FnMut(&ItemHandle, i32, i32, Option<&OverflowRegion>) -> bool,
{
    // The origin is mutable within one child list: a fixed marker
    // re-bases everything after it onto the viewport scroll position.
    let mut ox = origin_x;
    let mut oy = origin_y;
    for child in children {
        match child {
            ScopeChild::Scope(scope) => {
                if !enter_scope(scope, ox, oy, window, scroll, stack, cb) {
                    return false;
                }
            }
            ScopeChild::Item(item) => {
                if let ItemKind::Marker(m) = &item.kind {
                    if m.kind == MarkerKind::Fixed {
                        ox = window.viewport_scroll.0;
                        oy = window.viewport_scroll.1;
                    }
                    // Markers are structural; the callback never sees
                    // them.
                    continue;
                }
                if window.misses(&item.bbox(), oy) {
                    continue;
                }
                if !cb(item, ox, oy, stack.last()) {
                    return false;
                }
            }
        }
    }
    true
}

fn enter_scope<F>(
    scope: &Scope,
    ox: i32,
    oy: i32,
    window: SearchWindow,
    scroll: Option<&ScrollProvider<'_>>,
    stack: &mut Vec<OverflowRegion>,
    cb: &mut F,
) -> bool
where
    F: FnMut(&ItemHandle, i32, i32, Option<&OverflowRegion>) -> bool,
{
    let sx = ox + scope.dx;
    let sy = oy + scope.dy;
    if window.misses(&scope.bbox, sy) {
        return true;
    }
    let Some(clip) = &scope.clip else {
        return walk(&scope.children, sx, sy, window, scroll, stack, cb);
    };
    let (scroll_x, scroll_y) = scroll.map_or((0, 0), |p| p(clip.node));
    let absolute = Rect::new(sx, sy, clip.w, clip.h);
    let region = OverflowRegion {
        node: clip.node,
        clip: stack
            .last()
            .map_or(absolute, |outer| absolute.intersect(&outer.clip)),
        scroll_x,
        scroll_y,
    };
    stack.push(region);
    // Scrolled content shifts up/left within the clip region.
    let keep_going = walk(
        &scope.children,
        sx - scroll_x,
        sy - scroll_y,
        window,
        scroll,
        stack,
        cb,
    );
    let _ = stack.pop();
    keep_going
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::BoxFlags;
    use larch_style::ValuesHandle;
    use larch_style::style::Builder;
    use larch_style::StyleContext;

    fn plain_values() -> ValuesHandle {
        let mut ctx = StyleContext::headless().unwrap();
        Builder::new(&mut ctx, None, false).finish().unwrap()
    }

    fn visited(canvas: &Canvas, window: SearchWindow) -> Vec<(NodeId, i32, i32)> {
        let mut out = Vec::new();
        assert!(canvas.search(window, None, &mut |item, ox, oy, _| {
            out.push((item.node, ox, oy));
            true
        }));
        out
    }

    #[test]
    fn test_unbounded_search_visits_in_draw_order() {
        let values = plain_values();
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(NodeId(1), Rect::new(0, 0, 10, 10), &values, BoxFlags::default());
        let _ = canvas.draw_box(NodeId(2), Rect::new(0, 50, 10, 10), &values, BoxFlags::default());
        let order = visited(&canvas, SearchWindow::default());
        assert_eq!(order, vec![(NodeId(1), 0, 0), (NodeId(2), 0, 0)]);
    }

    #[test]
    fn test_out_of_range_scope_is_skipped_whole() {
        let values = plain_values();
        let mut far = Canvas::new();
        let _ = far.draw_box(NodeId(1), Rect::new(0, 0, 10, 10), &values, BoxFlags::default());
        far.wrap_origin();

        let mut canvas = Canvas::new();
        canvas.append(far, 0, 5000);
        let _ = canvas.draw_box(NodeId(2), Rect::new(0, 20, 10, 10), &values, BoxFlags::default());

        let order = visited(&canvas, SearchWindow::rows(0, 100));
        assert_eq!(order, vec![(NodeId(2), 0, 0)]);
        // Widening the window reaches the distant scope, with its
        // translation accumulated into the origin.
        let order = visited(&canvas, SearchWindow::rows(4990, 5100));
        assert_eq!(order, vec![(NodeId(1), 0, 5000)]);
    }

    #[test]
    fn test_overflow_scope_reports_clip_and_scroll() {
        let values = plain_values();
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(NodeId(3), Rect::new(0, 0, 200, 400), &values, BoxFlags::default());
        canvas.wrap_overflow(NodeId(9), 100, 50);

        let offsets = |node: NodeId| if node == NodeId(9) { (0, 30) } else { (0, 0) };
        let mut seen = Vec::new();
        assert!(canvas.search(
            SearchWindow::default(),
            Some(&offsets),
            &mut |item, ox, oy, overflow| {
                let region = overflow.copied();
                seen.push((item.node, ox, oy, region));
                true
            }
        ));
        assert_eq!(seen.len(), 1);
        let (node, ox, oy, region) = seen[0];
        assert_eq!(node, NodeId(3));
        // Content shifts up by the scroll offset.
        assert_eq!((ox, oy), (0, -30));
        let region = region.unwrap();
        assert_eq!(region.clip, Rect::new(0, 0, 100, 50));
        assert_eq!((region.scroll_x, region.scroll_y), (0, 30));
    }

    #[test]
    fn test_fixed_marker_rebases_origin_to_viewport_scroll() {
        let values = plain_values();
        let mut canvas = Canvas::new();
        let _ = canvas.draw_box(NodeId(1), Rect::new(0, 0, 10, 10), &values, BoxFlags::default());
        canvas.add_marker(NodeId(0), 0, 0, MarkerKind::Fixed);
        let _ = canvas.draw_box(NodeId(2), Rect::new(0, 0, 10, 10), &values, BoxFlags::default());

        let window = SearchWindow {
            y_range: None,
            viewport_scroll: (0, 300),
        };
        let order = visited(&canvas, window);
        assert_eq!(order, vec![(NodeId(1), 0, 0), (NodeId(2), 0, 300)]);
    }

    #[test]
    fn test_callback_abort_stops_traversal() {
        let values = plain_values();
        let mut canvas = Canvas::new();
        for i in 0..5 {
            let _ = canvas.draw_box(
                NodeId(i + 1),
                Rect::new(0, 0, 10, 10),
                &values,
                BoxFlags::default(),
            );
        }
        let mut count = 0;
        let finished = canvas.search(SearchWindow::default(), None, &mut |_, _, _, _| {
            count += 1;
            count < 2
        });
        assert!(!finished);
        assert_eq!(count, 2);
    }
}
