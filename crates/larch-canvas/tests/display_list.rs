//! End-to-end display-list scenarios: canvases assembled the way a
//! layout pass assembles them, queried and diffed the way the repaint
//! scheduler queries and diffs them.

use std::collections::HashSet;
use std::rc::Rc;

use larch_canvas::{BoxFlags, Canvas, ScopeChild, SearchWindow, TextRun, damage};
use larch_common::Rect;
use larch_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};
use larch_style::parse::Origin;
use larch_style::{FontKey, StyleEngine};

const VIEWPORT: Rect = Rect::new(0, 0, 800, 600);

fn element(tree: &mut DomTree, parent: NodeId, tag: &str, style: &str) -> NodeId {
    let mut attrs = AttributesMap::new();
    if !style.is_empty() {
        let _ = attrs.insert("style".to_string(), style.to_string());
    }
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

#[test]
fn test_moved_scope_damages_old_and_new_geometry() {
    let (tree, engine, div) = styled_document();
    let values = Rc::clone(engine.computed_values(&tree, div).unwrap());

    let mut inner = Canvas::new();
    let _ = inner.draw_box(div, Rect::new(0, 0, 50, 50), &values, BoxFlags::default());
    let mut canvas = Canvas::new();
    canvas.append(inner, 10, 10);

    let old = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
    assert_eq!(old.entries()[0].rect(), Rect::new(10, 10, 50, 50));

    // Incremental relayout shifts the spliced scope without rebuilding
    // it, so the record inside keeps its identity.
    let ScopeChild::Scope(scope) = &mut canvas.children_mut()[0] else {
        panic!("expected a scope");
    };
    scope.dx = 60;

    let new = canvas.snapshot(VIEWPORT, None, &tree, engine.stacking());
    assert_eq!(new.entries()[0].rect(), Rect::new(60, 10, 50, 50));
    assert!(Rc::ptr_eq(old.entries()[0].item(), new.entries()[0].item()));

    let hit = damage(&old, &new, &HashSet::new()).unwrap();
    assert_eq!(hit, Rect::from_corners(10, 10, 110, 60).expanded(1));
}

#[test]
fn test_splice_moves_item_without_losing_identity() {
    let (tree, engine, div) = styled_document();
    let values = Rc::clone(engine.computed_values(&tree, div).unwrap());

    let mut inner = Canvas::new();
    let _ = inner.draw_box(div, Rect::new(0, 0, 20, 20), &values, BoxFlags::default());
    let old = inner.snapshot(VIEWPORT, None, &tree, engine.stacking());

    let mut outer = Canvas::new();
    outer.append(inner, 200, 0);
    let new = outer.snapshot(VIEWPORT, None, &tree, engine.stacking());

    assert!(Rc::ptr_eq(old.entries()[0].item(), new.entries()[0].item()));
    let hit = damage(&old, &new, &HashSet::new()).unwrap();
    assert_eq!(hit, Rect::from_corners(0, 0, 220, 20).expanded(1));
}

#[test]
fn test_bounds_and_skipping_hold_across_mixed_assembly() {
    let (tree, engine, div) = styled_document();
    let values = Rc::clone(engine.computed_values(&tree, div).unwrap());

    let mut page = Canvas::new();
    let _ = page.draw_box(div, Rect::new(0, 0, 100, 20), &values, BoxFlags::default());

    let mut para = Canvas::new();
    let _ = para.draw_box(div, Rect::new(0, 0, 80, 40), &values, BoxFlags::default());
    para.wrap_origin();
    page.append(para, 0, 30);

    let mut scrolled = Canvas::new();
    let _ = scrolled.draw_box(div, Rect::new(0, 0, 200, 400), &values, BoxFlags::default());
    scrolled.wrap_overflow(div, 100, 50);
    page.append(scrolled, 0, 80);

    // The clip region caps the scrollable content's contribution.
    assert_eq!(page.bounds(), Rect::from_corners(0, 0, 100, 130));

    // A window over the clipped region visits only its contents, at
    // the accumulated origin and under the absolute clip.
    let mut seen = Vec::new();
    assert!(page.search(SearchWindow::rows(75, 200), None, &mut |item, ox, oy, overflow| {
        seen.push((item.node, ox, oy, overflow.map(|o| o.clip)));
        true
    }));
    assert_eq!(seen, vec![(div, 0, 80, Some(Rect::new(0, 80, 100, 50)))]);

    // A window over the top strip sees only the leading box.
    let mut seen = Vec::new();
    assert!(page.search(SearchWindow::rows(0, 25), None, &mut |item, ox, oy, _| {
        seen.push((item.node, ox, oy));
        true
    }));
    assert_eq!(seen, vec![(div, 0, 0)]);
}

#[test]
fn test_stylesheet_drives_painting_order_end_to_end() {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html", "");
    let body = element(&mut tree, html, "body", "");
    let para = element(&mut tree, body, "p", "");
    let text = tree.alloc(NodeType::Text("hello".to_string()));
    tree.append_child(para, text);
    let overlay = element(&mut tree, body, "div", "");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet(
        "p { background-color: silver }\n\
         div { position: absolute; z-index: 10; background-color: red }",
        Origin::Author,
    );
    let _ = engine.restyle(&tree).unwrap();

    let font = engine
        .context_mut()
        .fonts
        .intern(&FontKey::new("helvetica", 100))
        .unwrap();
    let pv = Rc::clone(engine.computed_values(&tree, para).unwrap());
    let ov = Rc::clone(engine.computed_values(&tree, overlay).unwrap());

    // Layout emits the overlay first; painting order must not.
    let mut canvas = Canvas::new();
    let _ = canvas.draw_box(overlay, Rect::new(40, 0, 30, 30), &ov, BoxFlags::default());
    let _ = canvas.draw_box(para, Rect::new(0, 0, 100, 20), &pv, BoxFlags::default());
    canvas.draw_text(
        text,
        TextRun {
            text: "hello",
            x: 2,
            baseline: 14,
            width: 30,
            index: 0,
        },
        &font,
    );

    let mut order = Vec::new();
    canvas.sorted_search(
        SearchWindow::default(),
        None,
        &tree,
        engine.stacking(),
        &mut |item, _, _, _| order.push(item.node),
    );
    // Block background, then inline text, then the positive-z context.
    assert_eq!(order, vec![para, text, overlay]);
}
