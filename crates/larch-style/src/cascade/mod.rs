//! The cascade engine: drives styling for a whole document.
//!
//! [CSS 2.1 § 6.4 The cascade](https://www.w3.org/TR/CSS2/cascade.html#cascade)
//!
//! The engine owns the stylesheet rules, the per-node style state, and
//! the dirty set. Mutations (attribute edits, dynamic pseudo-class
//! flips, subtree insertion) mark restyle roots; [`StyleEngine::restyle`]
//! drains them in document order, restyling each dirty subtree in one
//! pre-order pass that maintains the counter scope stack, regenerates
//! `:before`/`:after` content, and updates stacking membership on the
//! way out.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use larch_dom::{DomTree, NodeId, NodeType};

use crate::context::{StyleConfig, StyleContext};
use crate::error::StyleError;
use crate::parse::{self, Declaration, Origin, PseudoElement, StyleRule, Term, parse_inline};
use crate::properties::Property;
use crate::stacking::StackingIndex;
use crate::style::builder::Builder;
use crate::style::compare::{StyleChange, classify};
use crate::style::computed::ValuesHandle;
use crate::values::counter::format_counter;
use crate::values::font::{FontBackend, SyntheticFontBackend};
use crate::values::keywords::Display;

/// What a restyle pass requires of the embedder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestyleOutcome {
    /// At least one node needs repainting.
    pub paint: bool,
    /// At least one node needs layout (implies `paint`).
    pub layout: bool,
    /// Generated content changed; content boxes must be rebuilt
    /// (implies `layout`).
    pub content: bool,
    /// The root or body-equivalent restyled; the whole viewport must be
    /// repainted (their background can cover it).
    pub full_repaint: bool,
    /// Stacking membership changed and the index was re-sorted; paint
    /// order may differ even where geometry did not.
    pub stacking_changed: bool,
}

impl RestyleOutcome {
    fn absorb(&mut self, change: StyleChange) {
        match change {
            StyleChange::Unchanged => {}
            StyleChange::Repaint => self.paint = true,
            StyleChange::Relayout => {
                self.paint = true;
                self.layout = true;
            }
            StyleChange::Content => {
                self.paint = true;
                self.layout = true;
                self.content = true;
            }
        }
    }
}

/// Per-node style state.
struct NodeState {
    values: ValuesHandle,
    /// Resolved `:before` generated content, if any.
    before: Option<String>,
    /// Resolved `:after` generated content, if any.
    after: Option<String>,
}

/// Counter scope stack: one frame per open element.
///
/// [§ 12.4.1 Nested counters and scope](https://www.w3.org/TR/CSS2/generate.html#scope)
#[derive(Default)]
struct CounterStack {
    frames: Vec<HashMap<String, i32>>,
}

impl CounterStack {
    fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    fn pop_frame(&mut self) {
        let _ = self.frames.pop();
    }

    fn reset(&mut self, name: &str, value: i32) {
        if let Some(frame) = self.frames.last_mut() {
            let _ = frame.insert(name.to_string(), value);
        }
    }

    fn increment(&mut self, name: &str, delta: i32) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(value) = frame.get_mut(name) {
                *value += delta;
                return;
            }
        }
        // Incrementing a counter nobody reset starts a scope at zero.
        self.reset(name, delta);
    }

    /// The innermost value, or 0 if the counter was never created.
    fn value(&self, name: &str) -> i32 {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
            .unwrap_or(0)
    }

    /// Every nested value, outermost first.
    fn values(&self, name: &str) -> Vec<i32> {
        self.frames
            .iter()
            .filter_map(|frame| frame.get(name).copied())
            .collect()
    }
}

/// Per-document cascade engine.
pub struct StyleEngine {
    ctx: StyleContext,
    rules: Vec<StyleRule>,
    next_order: u32,
    state: HashMap<NodeId, NodeState>,
    /// Parsed inline `style` attributes. The parse is attribute-text
    /// invariant, so it survives restyles and is dropped only when the
    /// attribute itself changes.
    inline_cache: HashMap<NodeId, Rc<Vec<Declaration>>>,
    dirty: BTreeSet<NodeId>,
    stacking: StackingIndex,
}

impl std::fmt::Debug for StyleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleEngine")
            .field("rules", &self.rules.len())
            .field("styled_nodes", &self.state.len())
            .field("dirty", &self.dirty.len())
            .finish_non_exhaustive()
    }
}

impl StyleEngine {
    /// Create an engine over a font backend.
    ///
    /// # Errors
    ///
    /// Propagates [`StyleError::FontUnavailable`] from context creation.
    pub fn new(config: StyleConfig, backend: Box<dyn FontBackend>) -> Result<Self, StyleError> {
        Ok(StyleEngine {
            ctx: StyleContext::new(config, backend)?,
            rules: Vec::new(),
            next_order: 0,
            state: HashMap::new(),
            inline_cache: HashMap::new(),
            dirty: BTreeSet::new(),
            stacking: StackingIndex::new(),
        })
    }

    /// An engine with default configuration and synthetic font metrics.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the synthetic backend accepts any key.
    pub fn headless() -> Result<Self, StyleError> {
        Self::new(StyleConfig::default(), Box::new(SyntheticFontBackend))
    }

    /// The shared style context (pools, configuration).
    #[must_use]
    pub fn context(&self) -> &StyleContext {
        &self.ctx
    }

    /// Mutable access to the shared style context.
    pub fn context_mut(&mut self) -> &mut StyleContext {
        &mut self.ctx
    }

    /// The stacking index, valid after the last [`StyleEngine::restyle`].
    #[must_use]
    pub fn stacking(&self) -> &StackingIndex {
        &self.stacking
    }

    /// Parse and add a stylesheet. Marks the whole document dirty.
    pub fn add_stylesheet(&mut self, source: &str, origin: Origin) {
        let rules = parse::parse_stylesheet(source, origin, &mut self.next_order);
        self.rules.extend(rules);
        self.dirty.clear();
        let _ = self.dirty.insert(NodeId::ROOT);
    }

    /// Number of rules across all added sheets.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Mark `node`'s subtree for restyle.
    pub fn mark_dirty(&mut self, node: NodeId) {
        let _ = self.dirty.insert(node);
    }

    /// An attribute changed on `node`: invalidate the inline-style cache
    /// when it is the `style` attribute, and mark the subtree dirty
    /// (attribute selectors and `attr()` references may depend on any
    /// attribute).
    pub fn attribute_changed(&mut self, node: NodeId, name: &str) {
        if name.eq_ignore_ascii_case("style") {
            let _ = self.inline_cache.remove(&node);
        }
        self.mark_dirty(node);
    }

    /// Dynamic pseudo-class state changed on `node`.
    pub fn dynamic_flags_changed(&mut self, node: NodeId) {
        self.mark_dirty(node);
    }

    /// A node was detached or destroyed: drop its style state (and its
    /// descendants' on the next restyle of an ancestor).
    pub fn node_removed(&mut self, node: NodeId) {
        let _ = self.state.remove(&node);
        let _ = self.inline_cache.remove(&node);
        let _ = self.dirty.remove(&node);
        if self.stacking.remove(node) {
            // Paint order shifts when an ordered node disappears.
            let _ = self.dirty.insert(NodeId::ROOT);
        }
    }

    /// Forget everything about the document. Pools are purged after the
    /// per-node handles are dropped, so they come out empty.
    pub fn clear_document(&mut self) {
        self.state.clear();
        self.inline_cache.clear();
        self.dirty.clear();
        self.stacking.clear();
        self.ctx.purge_pools();
    }

    /// The computed values for `node`. Text nodes delegate to their
    /// parent element.
    #[must_use]
    pub fn computed_values(&self, tree: &DomTree, node: NodeId) -> Option<&ValuesHandle> {
        if let Some(state) = self.state.get(&node) {
            return Some(&state.values);
        }
        match tree.get(node).map(|n| &n.node_type) {
            Some(NodeType::Text(_)) => {
                let parent = tree.parent(node)?;
                self.state.get(&parent).map(|s| &s.values)
            }
            _ => None,
        }
    }

    /// Resolved `:before` content for `node`, if any.
    #[must_use]
    pub fn before_content(&self, node: NodeId) -> Option<&str> {
        self.state.get(&node).and_then(|s| s.before.as_deref())
    }

    /// Resolved `:after` content for `node`, if any.
    #[must_use]
    pub fn after_content(&self, node: NodeId) -> Option<&str> {
        self.state.get(&node).and_then(|s| s.after.as_deref())
    }

    /// Restyle every dirty subtree, in document order.
    ///
    /// # Errors
    ///
    /// [`StyleError::FontUnavailable`] if a build exhausts the font
    /// degradation chain.
    pub fn restyle(&mut self, tree: &DomTree) -> Result<RestyleOutcome, StyleError> {
        let mut outcome = RestyleOutcome::default();
        while let Some(root) = self.take_restyle_root(tree) {
            let Some(start) = element_at_or_under(tree, root) else {
                continue;
            };
            let parent_values = tree
                .parent(start)
                .and_then(|p| self.state.get(&p))
                .map(|s| Rc::clone(&s.values));
            let mut counters = self.seed_counters(tree, start);
            self.style_node(tree, start, parent_values.as_ref(), &mut counters, &mut outcome)?;
        }
        if outcome.stacking_changed {
            self.stacking.restack(tree);
        }
        Ok(outcome)
    }

    /// Pop the topmost dirty node, discarding dirty descendants of the
    /// chosen root (they restyle with it). If an ancestor of the chosen
    /// node has never been styled, widen to the document element.
    fn take_restyle_root(&mut self, tree: &DomTree) -> Option<NodeId> {
        let first = self.dirty.iter().next().copied()?;
        let mut root = first;
        let _ = self.dirty.remove(&first);
        for ancestor in tree.ancestors(first) {
            let unstyled_element =
                tree.as_element(ancestor).is_some() && !self.state.contains_key(&ancestor);
            if self.dirty.remove(&ancestor) || unstyled_element {
                root = ancestor;
            }
        }
        self.dirty
            .retain(|&n| !(n == root || tree.is_descendant_of(n, root)));
        Some(root)
    }

    /// Rebuild the counter stack as it stood on entry to `node`: one
    /// frame per ancestor with its resets and increments applied, and
    /// the subtrees preceding the path at each level replayed from
    /// their stored values so earlier siblings keep their counts.
    fn seed_counters(&self, tree: &DomTree, node: NodeId) -> CounterStack {
        let mut stack = CounterStack::default();
        let mut chain: Vec<NodeId> = tree.ancestors(node).collect();
        chain.reverse();
        chain.push(node);
        for (i, &ancestor) in chain.iter().enumerate().take(chain.len() - 1) {
            stack.push_frame();
            if let Some(state) = self.state.get(&ancestor) {
                if state.values.display != Display::None {
                    apply_counters(&mut stack, &state.values);
                }
            }
            for &child in tree.children(ancestor) {
                if child == chain[i + 1] {
                    break;
                }
                self.replay_counters(tree, child, &mut stack);
            }
        }
        stack
    }

    /// Replay an already-styled subtree's counter effects the way the
    /// full walk applies them, without restyling anything.
    fn replay_counters(&self, tree: &DomTree, node: NodeId, stack: &mut CounterStack) {
        if tree.as_element(node).is_none() {
            return;
        }
        stack.push_frame();
        if let Some(state) = self.state.get(&node) {
            if state.values.display != Display::None {
                apply_counters(stack, &state.values);
            }
        }
        for &child in tree.children(node) {
            self.replay_counters(tree, child, stack);
        }
        stack.pop_frame();
    }

    /// Style one element and recurse through its children.
    fn style_node(
        &mut self,
        tree: &DomTree,
        node: NodeId,
        parent: Option<&ValuesHandle>,
        counters: &mut CounterStack,
        outcome: &mut RestyleOutcome,
    ) -> Result<(), StyleError> {
        let Some(element) = tree.as_element(node) else {
            return Ok(());
        };
        let is_root = tree.document_element() == Some(node);

        // Cascade: matching rules sorted by (priority, specificity,
        // source order), inline style last among author declarations.
        let mut matched: Vec<(Origin, u32, u32, Rc<Vec<Declaration>>, Option<PseudoElement>)> =
            Vec::new();
        for rule in &self.rules {
            if rule.selector.matches(tree, node) {
                matched.push((
                    rule.origin,
                    rule.specificity,
                    rule.source_order,
                    Rc::clone(&rule.declarations),
                    rule.selector.pseudo_element(),
                ));
            }
        }
        let inline: Option<Rc<Vec<Declaration>>> =
            if let Some(cached) = self.inline_cache.get(&node) {
                Some(Rc::clone(cached))
            } else if let Some(text) = element.style_attr() {
                let parsed = Rc::new(parse_inline(text));
                let _ = self.inline_cache.insert(node, Rc::clone(&parsed));
                Some(parsed)
            } else {
                None
            };

        // Expand to per-declaration order: priority rank depends on the
        // individual declaration's !important flag.
        let mut ordered: Vec<(u8, u32, u32, &Declaration)> = Vec::new();
        let mut before_decls: Vec<(u8, u32, u32, &Declaration)> = Vec::new();
        let mut after_decls: Vec<(u8, u32, u32, &Declaration)> = Vec::new();
        for (origin, specificity, order, declarations, pseudo) in &matched {
            let sink = match pseudo {
                None => &mut ordered,
                Some(PseudoElement::Before) => &mut before_decls,
                Some(PseudoElement::After) => &mut after_decls,
            };
            for decl in declarations.iter() {
                sink.push((
                    priority_rank(*origin, decl.important),
                    *specificity,
                    *order,
                    decl,
                ));
            }
        }
        if let Some(inline) = inline.as_ref() {
            for decl in inline.iter() {
                // Inline style is author-origin and beats any stylesheet
                // rule of equal priority.
                ordered.push((
                    priority_rank(Origin::Author, decl.important),
                    u32::MAX,
                    u32::MAX,
                    decl,
                ));
            }
        }
        ordered.sort_by_key(|&(rank, specificity, order, _)| (rank, specificity, order));
        before_decls.sort_by_key(|&(rank, specificity, order, _)| (rank, specificity, order));
        after_decls.sort_by_key(|&(rank, specificity, order, _)| (rank, specificity, order));

        let attr_lookup = make_attr_lookup(tree, node);
        let mut builder = Builder::new(&mut self.ctx, parent, is_root).with_attr_lookup(&attr_lookup);
        for (_, _, _, decl) in &ordered {
            builder.set(decl.property, &decl.terms);
        }
        let values = builder.finish()?;

        let old = self.state.get(&node).map(|s| Rc::clone(&s.values));
        let change = classify(old.as_ref(), &values);
        outcome.absorb(change);
        if change != StyleChange::Unchanged && (is_root || element.tag_name == "body") {
            outcome.full_repaint = true;
        }

        let rendered = values.display != Display::None;

        // Counters advance only through rendered boxes.
        counters.push_frame();
        if rendered {
            apply_counters(counters, &values);
        }

        let before = if rendered {
            self.resolve_generated(tree, node, &before_decls, counters)
        } else {
            None
        };

        let old_before = self.state.get(&node).and_then(|s| s.before.clone());
        if before != old_before {
            outcome.content = true;
            outcome.layout = true;
            outcome.paint = true;
        }

        // Children inherit from this node's finished values.
        for &child in tree.children(node) {
            self.style_node(tree, child, Some(&values), counters, outcome)?;
        }

        let after = if rendered {
            self.resolve_generated(tree, node, &after_decls, counters)
        } else {
            None
        };
        let old_after = self.state.get(&node).and_then(|s| s.after.clone());
        if after != old_after {
            outcome.content = true;
            outcome.layout = true;
            outcome.paint = true;
        }
        counters.pop_frame();

        // Membership uses the node's new position/float/z-index.
        if self.stacking.update(node, &values, is_root) {
            outcome.stacking_changed = true;
            outcome.paint = true;
        }

        let _ = self.state.insert(
            node,
            NodeState {
                values,
                before,
                after,
            },
        );
        Ok(())
    }

    /// Resolve the winning `content` declaration of a pseudo-element
    /// rule set into a string.
    fn resolve_generated(
        &self,
        tree: &DomTree,
        node: NodeId,
        decls: &[(u8, u32, u32, &Declaration)],
        counters: &CounterStack,
    ) -> Option<String> {
        // Last writer wins; only 'content' produces output here.
        let winning = decls
            .iter()
            .rev()
            .find(|(_, _, _, d)| d.property == Property::Content)?;
        let terms = &winning.3.terms;
        if let [Term::Ident(word)] = terms.as_slice() {
            if word.eq_ignore_ascii_case("none") || word.eq_ignore_ascii_case("normal") {
                return None;
            }
        }
        let mut out = String::new();
        for term in terms {
            match term {
                Term::Str(s) => out.push_str(s),
                Term::Attr { name, tag } => {
                    let lookup = make_attr_lookup(tree, node);
                    if let Some(text) = lookup(tag.as_deref(), name) {
                        out.push_str(&text);
                    }
                }
                Term::Counter { name, style } => {
                    let style = parse_list_style(style.as_deref());
                    out.push_str(&format_counter(counters.value(name), style));
                }
                Term::Counters {
                    name,
                    separator,
                    style,
                } => {
                    let style = parse_list_style(style.as_deref());
                    let parts: Vec<String> = counters
                        .values(name)
                        .into_iter()
                        .map(|v| format_counter(v, style))
                        .collect();
                    out.push_str(&parts.join(separator));
                }
                Term::Script(src) => {
                    if let Some(text) = self.ctx.eval_script(src) {
                        out.push_str(&text);
                    }
                }
                _ => return None,
            }
        }
        Some(out)
    }
}

fn parse_list_style(name: Option<&str>) -> crate::values::keywords::ListStyleType {
    name.and_then(|s| s.to_ascii_lowercase().parse().ok())
        .unwrap_or(crate::values::keywords::ListStyleType::Decimal)
}

/// `node` if it is an element, the document element for the document
/// node, the parent for text/comments (their element restyles them).
fn element_at_or_under(tree: &DomTree, node: NodeId) -> Option<NodeId> {
    match tree.get(node).map(|n| &n.node_type) {
        Some(NodeType::Element(_)) => Some(node),
        Some(NodeType::Document) => tree.document_element(),
        _ => tree.parent(node),
    }
}

/// Cascade priority: agent < user < author < author-important <
/// user-important.
///
/// [§ 6.4.1 Cascading order](https://www.w3.org/TR/CSS2/cascade.html#cascading-order)
const fn priority_rank(origin: Origin, important: bool) -> u8 {
    match (origin, important) {
        (Origin::Agent, _) => 0,
        (Origin::User, false) => 1,
        (Origin::Author, false) => 2,
        (Origin::Author, true) => 3,
        (Origin::User, true) => 4,
    }
}

/// Apply a node's counter-reset then counter-increment to the stack.
fn apply_counters(stack: &mut CounterStack, values: &crate::style::ComputedValues) {
    if let Some(resets) = &values.counter_reset {
        for entry in resets.iter() {
            stack.reset(&entry.name, entry.delta);
        }
    }
    if let Some(increments) = &values.counter_increment {
        for entry in increments.iter() {
            stack.increment(&entry.name, entry.delta);
        }
    }
}

/// `attr(name)` looks at the element itself; `attr(tag name)` walks the
/// element and its ancestors for the nearest element with that tag.
fn make_attr_lookup<'t>(
    tree: &'t DomTree,
    node: NodeId,
) -> impl Fn(Option<&str>, &str) -> Option<String> + 't {
    move |tag: Option<&str>, name: &str| -> Option<String> {
        match tag {
            None => tree
                .as_element(node)
                .and_then(|e| e.attr(name))
                .map(str::to_string),
            Some(tag) => std::iter::once(node)
                .chain(tree.ancestors(node))
                .filter_map(|id| tree.as_element(id))
                .find(|e| e.tag_name.eq_ignore_ascii_case(tag))
                .and_then(|e| e.attr(name))
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larch_dom::{AttributesMap, DynamicFlags, ElementData};

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
        let id = tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs: AttributesMap::new(),
        }));
        tree.append_child(parent, id);
        id
    }

    fn document() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html");
        let body = element(&mut tree, html, "body");
        (tree, html, body)
    }

    #[test]
    fn test_cascade_applies_specificity_and_order() {
        let (mut tree, _, body) = document();
        let p = element(&mut tree, body, "p");
        assert!(tree.set_attribute(p, "class", "note"));
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet(
            "p { color: red } p.note { color: green } p { color: blue }",
            Origin::Author,
        );
        let _ = engine.restyle(&tree).unwrap();
        // .note outranks both bare `p` rules regardless of order.
        let values = engine.computed_values(&tree, p).unwrap();
        assert_eq!(values.color.name, "green");
    }

    #[test]
    fn test_important_inverts_author_over_user() {
        let (mut tree, _, body) = document();
        let p = element(&mut tree, body, "p");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("p { color: red !important }", Origin::User);
        engine.add_stylesheet("p { color: blue !important }", Origin::Author);
        engine.add_stylesheet("p { color: yellow }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let values = engine.computed_values(&tree, p).unwrap();
        assert_eq!(values.color.name, "red");
    }

    #[test]
    fn test_inline_style_beats_stylesheets() {
        let (mut tree, _, body) = document();
        let p = element(&mut tree, body, "p");
        assert!(tree.set_attribute(p, "style", "color: purple"));
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("p { color: red }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let values = engine.computed_values(&tree, p).unwrap();
        assert_eq!(values.color.name, "purple");
    }

    #[test]
    fn test_inheritance_flows_through_unmatched_elements() {
        let (mut tree, _, body) = document();
        let div = element(&mut tree, body, "div");
        let span = element(&mut tree, div, "span");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("body { color: teal }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let values = engine.computed_values(&tree, span).unwrap();
        assert_eq!(values.color.name, "teal");
    }

    #[test]
    fn test_text_nodes_delegate_to_parent() {
        let (mut tree, _, body) = document();
        let p = element(&mut tree, body, "p");
        let text = tree.alloc(NodeType::Text("hello".to_string()));
        tree.append_child(p, text);
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("p { color: red }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let via_text = engine.computed_values(&tree, text).unwrap();
        let via_parent = engine.computed_values(&tree, p).unwrap();
        assert!(Rc::ptr_eq(via_text, via_parent));
    }

    #[test]
    fn test_sharing_across_siblings() {
        let (mut tree, _, body) = document();
        let a = element(&mut tree, body, "p");
        let b = element(&mut tree, body, "p");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("p { margin-top: 4px }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let va = engine.computed_values(&tree, a).unwrap();
        let vb = engine.computed_values(&tree, b).unwrap();
        assert!(Rc::ptr_eq(va, vb));
    }

    #[test]
    fn test_restyle_classifies_change_severity() {
        let (mut tree, _, body) = document();
        let p = element(&mut tree, body, "p");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("p { color: red }", Origin::Author);
        let first = engine.restyle(&tree).unwrap();
        assert!(first.layout);

        // Nothing dirty: a second pass is a no-op.
        let idle = engine.restyle(&tree).unwrap();
        assert_eq!(idle, RestyleOutcome::default());

        // Flip a paint-only property via inline style.
        assert!(tree.set_attribute(p, "style", "background-color: yellow"));
        engine.attribute_changed(p, "style");
        let repaint = engine.restyle(&tree).unwrap();
        assert!(repaint.paint);
        assert!(!repaint.layout);

        // Now a geometry property.
        assert!(tree.set_attribute(p, "style", "background-color: yellow; width: 100px"));
        engine.attribute_changed(p, "style");
        let relayout = engine.restyle(&tree).unwrap();
        assert!(relayout.layout);
    }

    #[test]
    fn test_dynamic_pseudo_class_restyle() {
        let (mut tree, _, body) = document();
        let a = element(&mut tree, body, "a");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("a { color: blue } a:hover { color: red }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        assert_eq!(engine.computed_values(&tree, a).unwrap().color.name, "blue");

        let _ = tree.set_dynamic_flags(a, DynamicFlags::HOVER);
        engine.dynamic_flags_changed(a);
        let outcome = engine.restyle(&tree).unwrap();
        assert!(outcome.paint);
        assert_eq!(engine.computed_values(&tree, a).unwrap().color.name, "red");
    }

    #[test]
    fn test_counters_and_generated_content() {
        let (mut tree, _, body) = document();
        let list = element(&mut tree, body, "ol");
        let first = element(&mut tree, list, "li");
        let second = element(&mut tree, list, "li");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet(
            "ol { counter-reset: item } \
             li { counter-increment: item } \
             li:before { content: counter(item) \". \" }",
            Origin::Author,
        );
        let outcome = engine.restyle(&tree).unwrap();
        assert!(outcome.content);
        assert_eq!(engine.before_content(first), Some("1. "));
        assert_eq!(engine.before_content(second), Some("2. "));
    }

    #[test]
    fn test_counters_skip_display_none_subtrees() {
        let (mut tree, _, body) = document();
        let list = element(&mut tree, body, "ol");
        let first = element(&mut tree, list, "li");
        let hidden = element(&mut tree, list, "li");
        assert!(tree.set_attribute(hidden, "style", "display: none"));
        let third = element(&mut tree, list, "li");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet(
            "ol { counter-reset: item } \
             li { counter-increment: item } \
             li:before { content: counter(item) }",
            Origin::Author,
        );
        let _ = engine.restyle(&tree).unwrap();
        assert_eq!(engine.before_content(first), Some("1"));
        assert_eq!(engine.before_content(hidden), None);
        assert_eq!(engine.before_content(third), Some("2"));
    }

    #[test]
    fn test_counters_survive_partial_restyle_of_a_later_item() {
        let (mut tree, _, body) = document();
        let list = element(&mut tree, body, "ol");
        let _first = element(&mut tree, list, "li");
        let _second = element(&mut tree, list, "li");
        let third = element(&mut tree, list, "li");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet(
            "ol { counter-reset: item } \
             li { counter-increment: item } \
             li:before { content: counter(item) }",
            Origin::Author,
        );
        let _ = engine.restyle(&tree).unwrap();
        assert_eq!(engine.before_content(third), Some("3"));

        // An unrelated edit on the last item must not renumber it.
        assert!(tree.set_attribute(third, "class", "current"));
        engine.attribute_changed(third, "class");
        let _ = engine.restyle(&tree).unwrap();
        assert_eq!(engine.before_content(third), Some("3"));
    }

    #[test]
    fn test_attr_reference_resolves_against_ancestors() {
        let (mut tree, _, body) = document();
        let table = element(&mut tree, body, "table");
        assert!(tree.set_attribute(table, "cellpadding", "6"));
        let cell = element(&mut tree, table, "td");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("td { padding-top: attr(table cellpadding) }", Origin::Agent);
        let _ = engine.restyle(&tree).unwrap();
        let values = engine.computed_values(&tree, cell).unwrap();
        assert_eq!(values.padding_top, 6);
    }

    #[test]
    fn test_script_values_resolve_through_the_hook() {
        let (mut tree, _, body) = document();
        let p = element(&mut tree, body, "p");
        let mut engine = StyleEngine::headless().unwrap();
        engine
            .context_mut()
            .set_script_hook(Box::new(|src| {
                (src == "theme-color").then(|| "maroon".to_string())
            }));
        engine.add_stylesheet("p { color: script(theme-color) }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let values = engine.computed_values(&tree, p).unwrap();
        assert_eq!(values.color.name, "maroon");
    }

    #[test]
    fn test_partial_restyle_touches_only_the_subtree() {
        let (mut tree, _, body) = document();
        let left = element(&mut tree, body, "div");
        let right = element(&mut tree, body, "div");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("div { color: black }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        let right_before = Rc::clone(engine.computed_values(&tree, right).unwrap());

        assert!(tree.set_attribute(left, "style", "color: red"));
        engine.attribute_changed(left, "style");
        let _ = engine.restyle(&tree).unwrap();
        assert_eq!(engine.computed_values(&tree, left).unwrap().color.name, "red");
        // The untouched sibling keeps its interned instance.
        assert!(Rc::ptr_eq(
            engine.computed_values(&tree, right).unwrap(),
            &right_before
        ));
    }

    #[test]
    fn test_stacking_updates_flow_from_restyle() {
        let (mut tree, _, body) = document();
        let a = element(&mut tree, body, "div");
        let b = element(&mut tree, body, "div");
        assert!(tree.set_attribute(a, "id", "a"));
        assert!(tree.set_attribute(b, "id", "b"));
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet(
            "#a { position: absolute; z-index: 5 } #b { position: absolute; z-index: 2 }",
            Origin::Author,
        );
        let outcome = engine.restyle(&tree).unwrap();
        assert!(outcome.stacking_changed);
        let ra = engine.stacking().ranks_for(&tree, a).unwrap();
        let rb = engine.stacking().ranks_for(&tree, b).unwrap();
        assert!(ra.stacking > rb.stacking);
    }

    #[test]
    fn test_clear_document_empties_pools() {
        let (mut tree, _, body) = document();
        let _p = element(&mut tree, body, "p");
        let mut engine = StyleEngine::headless().unwrap();
        engine.add_stylesheet("p { color: #123456 }", Origin::Author);
        let _ = engine.restyle(&tree).unwrap();
        assert!(!engine.context().values.is_empty());
        engine.clear_document();
        assert!(engine.context().values.is_empty());
        assert_eq!(engine.context().colors.interned_len(), 0);
    }
}
