//! Selectors: parsing, specificity, and matching against the tree.
//!
//! [CSS 2.1 § 5 Selectors](https://www.w3.org/TR/CSS2/selector.html)
//!
//! Matching runs right to left: the rightmost simple selector is tested
//! against the candidate element, then combinators walk ancestors. A
//! descendant combinator may retry at every ancestor; a child
//! combinator is anchored to the immediate parent.

use larch_dom::{DomTree, DynamicFlags, ElementData, NodeId};

/// How an attribute selector compares against the element.
///
/// [§ 5.8 Attribute selectors](https://www.w3.org/TR/CSS2/selector.html#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    /// `[name]` - the attribute is present.
    Exists,
    /// `[name="value"]` - the attribute equals the value exactly.
    Exact(String),
    /// `[name~="value"]` - the value appears in the space-separated list.
    Includes(String),
}

/// One attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSelector {
    /// Attribute name.
    pub name: String,
    /// Comparison.
    pub op: AttrOp,
}

/// The generated-content pseudo-elements.
///
/// [§ 12.1 The :before and :after pseudo-elements](https://www.w3.org/TR/CSS2/generate.html#before-after-content)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElement {
    /// `:before` generated content.
    Before,
    /// `:after` generated content.
    After,
}

/// One compound of type/id/class/attribute/pseudo-class conditions, all
/// of which must hold on a single element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleSelector {
    /// Required tag name, lowercased; `None` matches any element.
    pub tag: Option<String>,
    /// Required `id` attribute.
    pub id: Option<String>,
    /// Required classes (all of them).
    pub classes: Vec<String>,
    /// Attribute conditions.
    pub attrs: Vec<AttrSelector>,
    /// Required dynamic pseudo-class state.
    pub dynamic: DynamicFlags,
    /// Count of dynamic pseudo-classes, for specificity.
    pub pseudo_count: u32,
    /// `:before`/`:after`, legal on the subject compound only. Matching
    /// ignores it; the cascade partitions rules by it.
    pub pseudo_element: Option<PseudoElement>,
}

impl SimpleSelector {
    fn matches(&self, element: &ElementData, flags: DynamicFlags) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        for attr in &self.attrs {
            let value = element.attr(&attr.name);
            let ok = match &attr.op {
                AttrOp::Exists => value.is_some(),
                AttrOp::Exact(want) => value == Some(want.as_str()),
                AttrOp::Includes(want) => value
                    .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == want)),
            };
            if !ok {
                return false;
            }
        }
        flags.contains(self.dynamic)
    }
}

/// How a compound relates to the compound to its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// First compound in the chain; no relation.
    Subject,
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the immediate parent.
    Child,
}

/// A full selector: compounds stored right to left (subject first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Compounds, subject first. Each carries the combinator linking it
    /// to the compound before it in this vector (to its right in
    /// source).
    pub parts: Vec<(Combinator, SimpleSelector)>,
}

impl Selector {
    /// Specificity packed as `a * 0x10000 + b * 0x100 + c`, where `a`
    /// counts ids, `b` classes/attributes/pseudo-classes, and `c` type
    /// selectors.
    ///
    /// [§ 6.4.3 Calculating a selector's specificity](https://www.w3.org/TR/CSS2/cascade.html#specificity)
    #[must_use]
    pub fn specificity(&self) -> u32 {
        let mut a = 0u32;
        let mut b = 0u32;
        let mut c = 0u32;
        for (_, simple) in &self.parts {
            if simple.id.is_some() {
                a += 1;
            }
            b += simple.classes.len() as u32;
            b += simple.attrs.len() as u32;
            b += simple.pseudo_count;
            if simple.tag.is_some() {
                c += 1;
            }
            if simple.pseudo_element.is_some() {
                c += 1;
            }
        }
        a.min(0xff) * 0x10000 + b.min(0xff) * 0x100 + c.min(0xff)
    }

    /// The subject compound's pseudo-element, if any.
    #[must_use]
    pub fn pseudo_element(&self) -> Option<PseudoElement> {
        self.parts.first().and_then(|(_, s)| s.pseudo_element)
    }

    /// Test the selector against `node`.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        let Some((_, subject)) = self.parts.first() else {
            return false;
        };
        if !subject.matches(element, tree.dynamic_flags(node)) {
            return false;
        }
        self.match_ancestors(tree, node, 1)
    }

    /// Match `self.parts[from..]` against ancestors of `node`.
    fn match_ancestors(&self, tree: &DomTree, node: NodeId, from: usize) -> bool {
        let Some((combinator, simple)) = self.parts.get(from) else {
            return true;
        };
        match combinator {
            Combinator::Subject => true,
            Combinator::Child => {
                let Some(parent) = tree.parent(node) else {
                    return false;
                };
                let Some(element) = tree.as_element(parent) else {
                    return false;
                };
                simple.matches(element, tree.dynamic_flags(parent))
                    && self.match_ancestors(tree, parent, from + 1)
            }
            Combinator::Descendant => {
                let mut current = tree.parent(node);
                while let Some(ancestor) = current {
                    if let Some(element) = tree.as_element(ancestor) {
                        if simple.matches(element, tree.dynamic_flags(ancestor))
                            && self.match_ancestors(tree, ancestor, from + 1)
                        {
                            return true;
                        }
                    }
                    current = tree.parent(ancestor);
                }
                false
            }
        }
    }
}

/// Parse one selector (no comma groups). `None` if unparsable.
#[must_use]
pub fn parse_selector(source: &str) -> Option<Selector> {
    // Tokenize into compounds separated by combinators, left to right,
    // then reverse so the subject comes first.
    let mut parts: Vec<(Combinator, SimpleSelector)> = Vec::new();
    let mut pending = Combinator::Subject;
    let mut rest = source.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('>') {
            if parts.is_empty() {
                return None;
            }
            pending = Combinator::Child;
            rest = after.trim_start();
            continue;
        }
        // A combinator only splits outside brackets and quotes;
        // `[rel="nofollow external"]` stays one compound.
        let mut end = rest.len();
        let mut depth = 0_usize;
        let mut quote: Option<char> = None;
        for (i, c) in rest.char_indices() {
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' => quote = Some(c),
                    '[' => depth += 1,
                    ']' => depth = depth.saturating_sub(1),
                    c if depth == 0 && (c.is_whitespace() || c == '>') => {
                        end = i;
                        break;
                    }
                    _ => {}
                },
            }
        }
        let (compound_text, tail) = rest.split_at(end);
        let simple = parse_simple(compound_text)?;
        parts.push((pending, simple));
        pending = Combinator::Descendant;
        rest = tail.trim_start();
    }
    if parts.is_empty() {
        return None;
    }
    // Stored subject-first: the combinator on each compound must describe
    // its link to the compound on its right in source, which after the
    // reversal is the entry before it.
    let mut reversed: Vec<(Combinator, SimpleSelector)> = Vec::with_capacity(parts.len());
    let combinators: Vec<Combinator> = parts.iter().map(|(c, _)| *c).collect();
    for (i, (_, simple)) in parts.into_iter().enumerate().rev() {
        let link = if i + 1 < combinators.len() {
            combinators[i + 1]
        } else {
            Combinator::Subject
        };
        reversed.push((link, simple));
    }
    Some(Selector { parts: reversed })
}

/// Parse one compound: `tag#id.class[attr=v]:pseudo`.
fn parse_simple(source: &str) -> Option<SimpleSelector> {
    let mut simple = SimpleSelector::default();
    let mut chars = source.char_indices().peekable();
    let ident_end = |s: &str, start: usize| -> usize {
        s[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .map_or(s.len(), |off| start + off)
    };
    // Leading type selector or universal.
    if let Some(&(start, c)) = chars.peek() {
        if c == '*' {
            let _ = chars.next();
        } else if c.is_ascii_alphabetic() {
            let end = ident_end(source, start);
            simple.tag = Some(source[start..end].to_ascii_lowercase());
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                let _ = chars.next();
            }
        }
    }
    while let Some((start, c)) = chars.next() {
        match c {
            '#' => {
                let end = ident_end(source, start + 1);
                if end == start + 1 {
                    return None;
                }
                simple.id = Some(source[start + 1..end].to_string());
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    let _ = chars.next();
                }
            }
            '.' => {
                let end = ident_end(source, start + 1);
                if end == start + 1 {
                    return None;
                }
                simple.classes.push(source[start + 1..end].to_string());
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    let _ = chars.next();
                }
            }
            ':' => {
                let end = ident_end(source, start + 1);
                let name = &source[start + 1..end];
                let flag = match name.to_ascii_lowercase().as_str() {
                    "hover" => Some(DynamicFlags::HOVER),
                    "active" => Some(DynamicFlags::ACTIVE),
                    "focus" => Some(DynamicFlags::FOCUS),
                    "link" => Some(DynamicFlags::LINK),
                    "visited" => Some(DynamicFlags::VISITED),
                    "before" => {
                        simple.pseudo_element = Some(PseudoElement::Before);
                        None
                    }
                    "after" => {
                        simple.pseudo_element = Some(PseudoElement::After);
                        None
                    }
                    _ => return None,
                };
                if let Some(flag) = flag {
                    simple.dynamic = simple.dynamic.with(flag);
                    simple.pseudo_count += 1;
                }
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    let _ = chars.next();
                }
            }
            '[' => {
                let close = source[start..].find(']')? + start;
                let inner = &source[start + 1..close];
                simple.attrs.push(parse_attr(inner)?);
                while chars.peek().is_some_and(|&(i, _)| i <= close) {
                    let _ = chars.next();
                }
            }
            _ => return None,
        }
    }
    Some(simple)
}

fn parse_attr(inner: &str) -> Option<AttrSelector> {
    let inner = inner.trim();
    if let Some((name, value)) = inner.split_once("~=") {
        return Some(AttrSelector {
            name: name.trim().to_string(),
            op: AttrOp::Includes(super::unquote(value).to_string()),
        });
    }
    if let Some((name, value)) = inner.split_once('=') {
        return Some(AttrSelector {
            name: name.trim().to_string(),
            op: AttrOp::Exact(super::unquote(value).to_string()),
        });
    }
    if inner.is_empty() {
        return None;
    }
    Some(AttrSelector {
        name: inner.to_string(),
        op: AttrOp::Exists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use larch_dom::{AttributesMap, DomTree, ElementData, NodeType};

    fn element(tree: &mut DomTree, parent: NodeId, tag: &str) -> NodeId {
        let id = tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs: AttributesMap::new(),
        }));
        tree.append_child(parent, id);
        id
    }

    #[test]
    fn test_specificity_counts_ids_classes_types() {
        let s = parse_selector("div.note#main:hover").unwrap();
        // one id, one class + one pseudo, one type
        assert_eq!(s.specificity(), 0x10000 + 2 * 0x100 + 1);
        let t = parse_selector("p em").unwrap();
        assert_eq!(t.specificity(), 2);
    }

    #[test]
    fn test_descendant_combinator_walks_all_ancestors() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html");
        let body = element(&mut tree, html, "body");
        let div = element(&mut tree, body, "div");
        let p = element(&mut tree, div, "p");
        let sel = parse_selector("body p").unwrap();
        assert!(sel.matches(&tree, p));
        assert!(!sel.matches(&tree, div));
    }

    #[test]
    fn test_child_combinator_is_anchored() {
        let mut tree = DomTree::new();
        let html = element(&mut tree, NodeId::ROOT, "html");
        let body = element(&mut tree, html, "body");
        let div = element(&mut tree, body, "div");
        let p = element(&mut tree, div, "p");
        assert!(parse_selector("div > p").unwrap().matches(&tree, p));
        assert!(!parse_selector("body > p").unwrap().matches(&tree, p));
    }

    #[test]
    fn test_class_and_id_conditions() {
        let mut tree = DomTree::new();
        let div = element(&mut tree, NodeId::ROOT, "div");
        assert!(tree.set_attribute(div, "class", "note urgent"));
        assert!(tree.set_attribute(div, "id", "main"));
        assert!(parse_selector(".note.urgent").unwrap().matches(&tree, div));
        assert!(parse_selector("#main").unwrap().matches(&tree, div));
        assert!(!parse_selector(".missing").unwrap().matches(&tree, div));
    }

    #[test]
    fn test_attribute_selectors() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, NodeId::ROOT, "a");
        assert!(tree.set_attribute(a, "rel", "nofollow external"));
        assert!(parse_selector("a[rel]").unwrap().matches(&tree, a));
        assert!(parse_selector("a[rel~=external]").unwrap().matches(&tree, a));
        assert!(!parse_selector("a[rel=external]").unwrap().matches(&tree, a));
        assert!(
            parse_selector("a[rel=\"nofollow external\"]")
                .unwrap()
                .matches(&tree, a)
        );
        // Whitespace and `>` inside a quoted value are not combinators.
        assert_eq!(parse_selector("a[title=\"x > y\"]").unwrap().parts.len(), 1);
        assert_eq!(
            parse_selector("p a[rel=\"nofollow external\"]")
                .unwrap()
                .parts
                .len(),
            2
        );
    }

    #[test]
    fn test_dynamic_pseudo_classes_read_flags() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, NodeId::ROOT, "a");
        let sel = parse_selector("a:hover").unwrap();
        assert!(!sel.matches(&tree, a));
        let _ = tree.set_dynamic_flags(a, DynamicFlags::HOVER);
        assert!(sel.matches(&tree, a));
    }
}
