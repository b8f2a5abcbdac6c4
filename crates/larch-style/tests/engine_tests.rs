//! Integration tests for the style engine: full documents styled
//! through stylesheets, restyled incrementally, and torn down.

use std::rc::Rc;

use larch_dom::{AttributesMap, DomTree, DynamicFlags, ElementData, NodeId, NodeType};
use larch_style::parse::Origin;
use larch_style::{StyleEngine, ValuesHandle};

fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
    let id = tree.alloc(NodeType::Element(ElementData {
        tag_name: tag.to_string(),
        attrs: AttributesMap::new(),
    }));
    tree.append_child(parent, id);
    id
}

fn document() -> (DomTree, NodeId) {
    let mut tree = DomTree::new();
    let html = element(&mut tree, NodeId::ROOT, "html");
    let body = element(&mut tree, html, "body");
    (tree, body)
}

fn values(engine: &StyleEngine, tree: &DomTree, node: NodeId) -> ValuesHandle {
    Rc::clone(engine.computed_values(tree, node).unwrap())
}

#[test]
fn test_origin_and_importance_order_end_to_end() {
    let (mut tree, body) = document();
    let para = element(&mut tree, body, "p");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet("p { color: black; margin-top: 1px }", Origin::Agent);
    engine.add_stylesheet(
        "p { color: navy; margin-top: 2px; padding-top: 3px !important }",
        Origin::User,
    );
    engine.add_stylesheet(
        "p { color: red; margin-top: 4px; padding-top: 9px !important }",
        Origin::Author,
    );
    let _ = engine.restyle(&tree).unwrap();

    let v = values(&engine, &tree, para);
    // Author normal beats user and agent normals.
    assert_eq!(v.color.name, "red");
    assert_eq!(v.margin_top, 4);
    // User important outranks even author important.
    assert_eq!(v.padding_top, 3);
}

#[test]
fn test_identical_elements_share_one_values_set() {
    let (mut tree, body) = document();
    let list = element(&mut tree, body, "ul");
    let a = element(&mut tree, list, "li");
    let b = element(&mut tree, list, "li");
    let c = element(&mut tree, list, "li");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet("li { color: teal; margin-left: 8px }", Origin::Author);
    let _ = engine.restyle(&tree).unwrap();

    let va = values(&engine, &tree, a);
    assert!(Rc::ptr_eq(&va, &values(&engine, &tree, b)));
    assert!(Rc::ptr_eq(&va, &values(&engine, &tree, c)));
}

#[test]
fn test_idle_restyle_preserves_identity() {
    let (mut tree, body) = document();
    let div = element(&mut tree, body, "div");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet("div { width: 40px }", Origin::Author);
    let _ = engine.restyle(&tree).unwrap();
    let before = values(&engine, &tree, div);

    // Nothing changed underneath; a forced pass is a no-op.
    engine.mark_dirty(div);
    let outcome = engine.restyle(&tree).unwrap();
    assert!(!outcome.paint);
    assert!(!outcome.layout);
    assert!(Rc::ptr_eq(&before, &values(&engine, &tree, div)));
}

#[test]
fn test_change_severity_escalates_with_the_property() {
    let (mut tree, body) = document();
    let div = element(&mut tree, body, "div");
    let _ = tree.set_attribute(div, "style", "background-color: silver");

    let mut engine = StyleEngine::headless().unwrap();
    engine.mark_dirty(NodeId::ROOT);
    let _ = engine.restyle(&tree).unwrap();

    // A color swap repaints without moving anything.
    let _ = tree.set_attribute(div, "style", "background-color: teal");
    engine.attribute_changed(div, "style");
    let outcome = engine.restyle(&tree).unwrap();
    assert!(outcome.paint);
    assert!(!outcome.layout);

    // A geometry change forces layout too.
    let _ = tree.set_attribute(div, "style", "background-color: teal; width: 120px");
    engine.attribute_changed(div, "style");
    let outcome = engine.restyle(&tree).unwrap();
    assert!(outcome.layout);
    assert!(outcome.paint);
}

#[test]
fn test_hover_flag_swaps_matched_rules() {
    let (mut tree, body) = document();
    let anchor = element(&mut tree, body, "a");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet("a { color: blue }\na:hover { color: red }", Origin::Author);
    let _ = engine.restyle(&tree).unwrap();
    assert_eq!(values(&engine, &tree, anchor).color.name, "blue");

    let _ = tree.set_dynamic_flags(anchor, DynamicFlags::HOVER);
    engine.dynamic_flags_changed(anchor);
    let outcome = engine.restyle(&tree).unwrap();
    assert!(outcome.paint);
    assert_eq!(values(&engine, &tree, anchor).color.name, "red");
}

#[test]
fn test_list_numbering_through_a_stylesheet() {
    let (mut tree, body) = document();
    let list = element(&mut tree, body, "ol");
    let first = element(&mut tree, list, "li");
    let second = element(&mut tree, list, "li");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet(
        "ol { counter-reset: item }\n\
         li { counter-increment: item }\n\
         li:before { content: counter(item) \". \" }",
        Origin::Author,
    );
    let _ = engine.restyle(&tree).unwrap();

    assert_eq!(engine.before_content(first), Some("1. "));
    assert_eq!(engine.before_content(second), Some("2. "));
}

#[test]
fn test_clear_document_resets_interned_pools() {
    let (mut tree, body) = document();
    let _ = element(&mut tree, body, "div");

    let mut engine = StyleEngine::headless().unwrap();
    engine.add_stylesheet("div { color: #123456 }", Origin::Author);
    let _ = engine.restyle(&tree).unwrap();
    assert!(!engine.context().values.is_empty());
    assert!(engine.context().colors.interned_len() > 0);

    engine.clear_document();
    assert!(engine.context().values.is_empty());
    assert_eq!(engine.context().colors.interned_len(), 0);
}
