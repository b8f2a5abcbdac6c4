//! Node tree consumed by the Larch style engine.
//!
//! This crate provides an arena-based document tree in the shape the
//! cascade expects: elements with attributes, text leaves, and cheap
//! document-order comparison.
//!
//! # Design
//!
//! Nodes live in a single vector and refer to each other through
//! [`NodeId`] indices, giving O(1) access and traversal without borrow
//! checker friction. Nodes are allocated in document order, so a
//! [`NodeId`]'s index doubles as the node's document-order sequence
//! number: `a.0 < b.0` means `a` precedes `b` whenever both were
//! attached in source order.

use std::collections::HashMap;

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A type-safe index into the document tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// Also serves as the document-order sequence number used by the cascade
/// and the stacking comparator for tree-order tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Dynamic pseudo-class state for one element.
///
/// [§ 5.11.3 Dynamic pseudo-classes](https://www.w3.org/TR/CSS2/selector.html#dynamic-pseudo-classes)
///
/// The event front end flips these bits; the cascade consumes them when
/// matching `:hover`-style selectors. Stored as a bitmask so a whole
/// element's state compares in one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct DynamicFlags(pub u8);

impl DynamicFlags {
    /// `:hover` is active.
    pub const HOVER: DynamicFlags = DynamicFlags(1 << 0);
    /// `:active` is active.
    pub const ACTIVE: DynamicFlags = DynamicFlags(1 << 1);
    /// `:focus` is active.
    pub const FOCUS: DynamicFlags = DynamicFlags(1 << 2);
    /// `:link` applies (unvisited hyperlink).
    pub const LINK: DynamicFlags = DynamicFlags(1 << 3);
    /// `:visited` applies.
    pub const VISITED: DynamicFlags = DynamicFlags(1 << 4);

    /// True if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: DynamicFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of both masks.
    #[must_use]
    pub const fn with(self, other: DynamicFlags) -> DynamicFlags {
        DynamicFlags(self.0 | other.0)
    }

    /// `self` with the bits of `other` cleared.
    #[must_use]
    pub const fn without(self, other: DynamicFlags) -> DynamicFlags {
        DynamicFlags(self.0 & !other.0)
    }
}

/// One node in the tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
#[derive(Debug, Clone)]
pub struct Node {
    /// What kind of node this is, with the kind-specific payload.
    pub node_type: NodeType,
    /// Parent node, or `None` for the document root (and detached nodes).
    pub parent: Option<NodeId>,
    /// Children in document order.
    pub children: Vec<NodeId>,
}

/// The kind of a node.
#[derive(Debug, Clone)]
pub enum NodeType {
    /// The document itself; always at [`NodeId::ROOT`].
    Document,
    /// An element with a tag name and attributes.
    Element(ElementData),
    /// A text leaf. Text nodes delegate styling to their parent element.
    Text(String),
    /// A comment; ignored by styling and layout.
    Comment(String),
}

/// Element-specific data.
///
/// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element's local name, lowercased by the (out-of-scope) parser.
    pub tag_name: String,
    /// The element's attribute list.
    pub attrs: AttributesMap,
}

impl ElementData {
    /// The element's `id` attribute, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    /// The element's space-separated class list.
    #[must_use]
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs
            .get("class")
            .map(String::as_str)
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    /// True if `class` appears in the element's class list.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// An attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// The raw inline `style` attribute, if present.
    #[must_use]
    pub fn style_attr(&self) -> Option<&str> {
        self.attr("style")
    }
}

/// Arena-based document tree.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// All nodes live in one vector indexed by [`NodeId`]. The document node
/// occupies slot 0. Allocation order is document order (see [`NodeId`]).
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    /// Dynamic pseudo-class state, parallel to `nodes`.
    flags: Vec<DynamicFlags>,
}

impl DomTree {
    /// Create a tree holding only the document node.
    #[must_use]
    pub fn new() -> Self {
        DomTree {
            nodes: vec![Node {
                node_type: NodeType::Document,
                parent: None,
                children: Vec::new(),
            }],
            flags: vec![DynamicFlags::default()],
        }
    }

    /// The root document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// A node by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// A mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes (including the document node).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the document node is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node and return its id.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
        });
        self.flags.push(DynamicFlags::default());
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach `child` from its parent, leaving the subtree allocated but
    /// unreachable. Callers owning per-node side state (the style engine)
    /// are notified through their own mutation hooks.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != child);
        }
    }

    /// Set an attribute on an element node. Returns true if the node is
    /// an element (and therefore something changed).
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(id.0).map(|n| &mut n.node_type) {
            Some(NodeType::Element(data)) => {
                let _ = data.attrs.insert(name.to_string(), value.to_string());
                true
            }
            _ => false,
        }
    }

    /// The node's parent.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The node's children in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The sibling immediately before `id`, if any.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    /// Iterate ancestors from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// True if `ancestor` is a proper ancestor of `id`.
    #[must_use]
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Iterate the subtree rooted at `id` in document order (pre-order),
    /// including `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Element data if the node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Element(data)) => Some(data),
            _ => None,
        }
    }

    /// Text content if the node is a text leaf.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The element's lowercase tag name, if the node is an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag_name.as_str())
    }

    /// The document element (first element child of the document).
    ///
    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&id| self.as_element(id).is_some())
    }

    /// The dynamic pseudo-class state of a node.
    #[must_use]
    pub fn dynamic_flags(&self, id: NodeId) -> DynamicFlags {
        self.flags.get(id.0).copied().unwrap_or_default()
    }

    /// Replace the dynamic pseudo-class state of a node, returning the
    /// previous state. The caller is responsible for marking the node
    /// dirty for restyle when the state changed.
    pub fn set_dynamic_flags(&mut self, id: NodeId, flags: DynamicFlags) -> DynamicFlags {
        let slot = &mut self.flags[id.0];
        std::mem::replace(slot, flags)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let children = self.tree.children(id);
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
        let id = tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs: AttributesMap::new(),
        }));
        tree.append_child(parent, id);
        id
    }

    #[test]
    fn test_allocation_order_is_document_order() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html");
        let body = element(&mut tree, html, "body");
        let p = element(&mut tree, body, "p");
        assert!(html < body);
        assert!(body < p);
    }

    #[test]
    fn test_descendants_walks_preorder() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html");
        let body = element(&mut tree, html, "body");
        let a = element(&mut tree, body, "a");
        let b = element(&mut tree, body, "b");
        let order: Vec<NodeId> = tree.descendants(html).collect();
        assert_eq!(order, vec![html, body, a, b]);
    }

    #[test]
    fn test_detach_removes_subtree_from_traversal() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html");
        let body = element(&mut tree, html, "body");
        let div = element(&mut tree, body, "div");
        let _inner = element(&mut tree, div, "span");
        tree.detach(div);
        let order: Vec<NodeId> = tree.descendants(html).collect();
        assert_eq!(order, vec![html, body]);
        assert!(tree.parent(div).is_none());
    }

    #[test]
    fn test_classes_split_on_whitespace() {
        let mut tree = DomTree::new();
        let div = element(&mut tree, NodeId::ROOT, "div");
        assert!(tree.set_attribute(div, "class", "note  warning"));
        let data = tree.as_element(div).unwrap();
        assert!(data.has_class("note"));
        assert!(data.has_class("warning"));
        assert!(!data.has_class("other"));
    }

    #[test]
    fn test_dynamic_flags_roundtrip() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, NodeId::ROOT, "a");
        let old = tree.set_dynamic_flags(a, DynamicFlags::HOVER.with(DynamicFlags::LINK));
        assert_eq!(old, DynamicFlags::default());
        assert!(tree.dynamic_flags(a).contains(DynamicFlags::HOVER));
        assert!(!tree.dynamic_flags(a).contains(DynamicFlags::ACTIVE));
    }
}
