//! A compact CSS parser.
//!
//! Produces the rule representation the cascade consumes: selectors with
//! precomputed specificity, declaration lists with `!important` flags,
//! and property values as typed [`Term`]s. Shorthands (`margin`,
//! `padding`, the `border` family) are expanded at parse time so the
//! builder only ever sees longhand properties.
//!
//! Error recovery follows CSS: a malformed declaration or rule is
//! skipped with a one-shot diagnostic and parsing continues.
//!
//! [CSS 2.1 § 4.1 Syntax](https://www.w3.org/TR/CSS2/syndata.html)

pub mod selector;

use std::rc::Rc;
use std::str::FromStr;

use larch_common::warn_once;

use crate::properties::Property;
pub use selector::{AttrOp, Combinator, PseudoElement, Selector, SimpleSelector};

/// Where a stylesheet came from, for cascade priority.
///
/// [§ 6.4 The cascade](https://www.w3.org/TR/CSS2/cascade.html#cascade)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// The user agent's built-in defaults.
    Agent,
    /// The user's personal stylesheet.
    User,
    /// The document's own stylesheets and inline styles.
    Author,
}

/// Units a length term may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// Pixels.
    Px,
    /// The font's em square.
    Em,
    /// The font's x-height.
    Ex,
    /// Points.
    Pt,
    /// Picas.
    Pc,
    /// Inches.
    In,
    /// Centimeters.
    Cm,
    /// Millimeters.
    Mm,
}

/// One parsed component of a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// An identifier (keywords, color names, font families).
    Ident(String),
    /// A unitless number.
    Number(f64),
    /// A number with a length unit.
    Length {
        /// Magnitude in `unit`s.
        value: f64,
        /// The unit.
        unit: LengthUnit,
    },
    /// A percentage (`value` is the percent, not the fraction).
    Percent(f64),
    /// A `#`-prefixed hex color, stored without the `#`.
    Hash(String),
    /// A quoted string.
    Str(String),
    /// A `url(...)` reference.
    Url(String),
    /// An `attr(...)` reference, optionally filtered to an ancestor tag:
    /// `attr(width)` or `attr(table width)`.
    Attr {
        /// Attribute name to look up.
        name: String,
        /// Restrict the search to elements with this tag, if set.
        tag: Option<String>,
    },
    /// A `counter(name [, style])` reference.
    Counter {
        /// Counter identifier.
        name: String,
        /// Numbering style keyword, if given.
        style: Option<String>,
    },
    /// A `counters(name, separator [, style])` reference.
    Counters {
        /// Counter identifier.
        name: String,
        /// Separator string.
        separator: String,
        /// Numbering style keyword, if given.
        style: Option<String>,
    },
    /// A `script(...)` value evaluated through the context's hook and
    /// re-parsed.
    Script(String),
}

impl Term {
    /// The identifier string if this term is an identifier.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Term::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// True if this term is the identifier `ident` (ASCII
    /// case-insensitive).
    #[must_use]
    pub fn is_ident(&self, ident: &str) -> bool {
        self.as_ident().is_some_and(|s| s.eq_ignore_ascii_case(ident))
    }
}

/// One longhand declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property being set.
    pub property: Property,
    /// The value terms.
    pub terms: Vec<Term>,
    /// `!important` was present.
    pub important: bool,
}

/// One parsed rule: a single selector plus its declarations.
///
/// A source rule with a selector group (`h1, h2 { ... }`) becomes one
/// `StyleRule` per selector, sharing the declaration list.
#[derive(Debug, Clone)]
pub struct StyleRule {
    /// The selector.
    pub selector: Selector,
    /// Precomputed specificity of `selector`.
    pub specificity: u32,
    /// Which origin the stylesheet belongs to.
    pub origin: Origin,
    /// Position of the source rule in declaration order across all
    /// sheets of the document.
    pub source_order: u32,
    /// The declarations, shorthand-expanded.
    pub declarations: Rc<Vec<Declaration>>,
}

/// Parse a stylesheet.
///
/// `next_order` is shared across sheets so source order is global to
/// the document; it is advanced one step per source rule.
#[must_use]
pub fn parse_stylesheet(source: &str, origin: Origin, next_order: &mut u32) -> Vec<StyleRule> {
    let mut rules = Vec::new();
    let mut scanner = Scanner::new(source);
    loop {
        scanner.skip_space();
        if scanner.at_end() {
            break;
        }
        // At-rules are not supported; skip to the end of their block or
        // statement.
        if scanner.peek() == Some('@') {
            let name = scanner.take_until(|c| c == '{' || c == ';');
            warn_once("css", &format!("ignoring at-rule '{}'", name.trim()));
            if scanner.peek() == Some('{') {
                let _ = scanner.take_block();
            } else {
                scanner.bump();
            }
            continue;
        }
        let selector_text = scanner.take_until(|c| c == '{');
        if scanner.at_end() {
            break;
        }
        let block = scanner.take_block();
        let declarations = Rc::new(parse_declarations(&block));
        let order = *next_order;
        *next_order += 1;
        for part in selector_text.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match selector::parse_selector(part) {
                Some(sel) => {
                    let specificity = sel.specificity();
                    rules.push(StyleRule {
                        selector: sel,
                        specificity,
                        origin,
                        source_order: order,
                        declarations: Rc::clone(&declarations),
                    });
                }
                None => warn_once("css", &format!("unparsable selector '{part}'")),
            }
        }
    }
    rules
}

/// Parse a bare declaration list (the contents of a `style` attribute).
#[must_use]
pub fn parse_inline(source: &str) -> Vec<Declaration> {
    parse_declarations(source)
}

/// Parse `name: value [!important]` declarations separated by
/// semicolons, expanding shorthands.
fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut out = Vec::new();
    for decl in split_declarations(block) {
        let Some((name, value)) = decl.split_once(':') else {
            if !decl.trim().is_empty() {
                warn_once("css", &format!("dropping malformed declaration '{}'", decl.trim()));
            }
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let mut value = value.trim();
        let mut important = false;
        if let Some(stripped) = strip_important(value) {
            value = stripped;
            important = true;
        }
        let terms = parse_terms(value);
        if terms.is_empty() {
            warn_once("css", &format!("dropping empty declaration '{name}'"));
            continue;
        }
        for (property, terms) in expand(&name, terms) {
            out.push(Declaration {
                property,
                terms,
                important,
            });
        }
    }
    out
}

/// Split on top-level semicolons, respecting strings and parentheses.
fn split_declarations(block: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut start = 0;
    for (i, c) in block.char_indices() {
        match (in_string, c) {
            (Some(q), _) if c == q => in_string = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => in_string = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&block[start..]);
    out
}

fn strip_important(value: &str) -> Option<&str> {
    let trimmed = value.trim_end();
    let lower = trimmed.to_ascii_lowercase();
    let bang = lower.rfind('!')?;
    if lower[bang + 1..].trim() == "important" {
        Some(trimmed[..bang].trim_end())
    } else {
        None
    }
}

/// Expand a (possibly shorthand) property name into longhand
/// declarations. Unknown names produce nothing (with a diagnostic).
fn expand(name: &str, terms: Vec<Term>) -> Vec<(Property, Vec<Term>)> {
    use Property::*;
    match name {
        "margin" => expand_box(&terms, [MarginTop, MarginRight, MarginBottom, MarginLeft]),
        "padding" => expand_box(&terms, [PaddingTop, PaddingRight, PaddingBottom, PaddingLeft]),
        "border-width" => expand_box(
            &terms,
            [BorderTopWidth, BorderRightWidth, BorderBottomWidth, BorderLeftWidth],
        ),
        "border-style" => expand_box(
            &terms,
            [BorderTopStyle, BorderRightStyle, BorderBottomStyle, BorderLeftStyle],
        ),
        "border-color" => expand_box(
            &terms,
            [BorderTopColor, BorderRightColor, BorderBottomColor, BorderLeftColor],
        ),
        "border" => expand_border_edges(&terms, &[Edge::Top, Edge::Right, Edge::Bottom, Edge::Left]),
        "border-top" => expand_border_edges(&terms, &[Edge::Top]),
        "border-right" => expand_border_edges(&terms, &[Edge::Right]),
        "border-bottom" => expand_border_edges(&terms, &[Edge::Bottom]),
        "border-left" => expand_border_edges(&terms, &[Edge::Left]),
        "outline" => expand_outline(&terms),
        _ => match Property::from_str(name) {
            Ok(prop) => vec![(prop, terms)],
            Err(_) => {
                warn_once("css", &format!("unsupported property '{name}'"));
                Vec::new()
            }
        },
    }
}

/// The CSS 1-to-4 value box pattern: top, right, bottom, left.
///
/// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
fn expand_box(terms: &[Term], sides: [Property; 4]) -> Vec<(Property, Vec<Term>)> {
    let pick = |i: usize| -> Option<&Term> {
        match (terms.len(), i) {
            (1, _) => terms.first(),
            (2, 0 | 2) | (3, 0) => terms.first(),
            (2, 1 | 3) | (3, 1 | 3) => terms.get(1),
            (3, 2) => terms.get(2),
            (4, _) => terms.get(i),
            _ => None,
        }
    };
    let mut out = Vec::new();
    for (i, side) in sides.into_iter().enumerate() {
        if let Some(term) = pick(i) {
            out.push((side, vec![term.clone()]));
        }
    }
    if out.len() != 4 {
        warn_once("css", "box shorthand needs 1-4 values");
        return Vec::new();
    }
    out
}

#[derive(Clone, Copy)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    const fn width(self) -> Property {
        match self {
            Edge::Top => Property::BorderTopWidth,
            Edge::Right => Property::BorderRightWidth,
            Edge::Bottom => Property::BorderBottomWidth,
            Edge::Left => Property::BorderLeftWidth,
        }
    }
    const fn style(self) -> Property {
        match self {
            Edge::Top => Property::BorderTopStyle,
            Edge::Right => Property::BorderRightStyle,
            Edge::Bottom => Property::BorderBottomStyle,
            Edge::Left => Property::BorderLeftStyle,
        }
    }
    const fn color(self) -> Property {
        match self {
            Edge::Top => Property::BorderTopColor,
            Edge::Right => Property::BorderRightColor,
            Edge::Bottom => Property::BorderBottomColor,
            Edge::Left => Property::BorderLeftColor,
        }
    }
}

/// Which border sub-property a shorthand term sets.
#[derive(Clone, Copy)]
enum BorderSlot {
    Width,
    Style,
    Color,
}

fn classify_border_term(term: &Term) -> Option<BorderSlot> {
    match term {
        Term::Length { .. } => Some(BorderSlot::Width),
        Term::Ident(word) => {
            let lower = word.to_ascii_lowercase();
            if matches!(lower.as_str(), "thin" | "medium" | "thick") {
                Some(BorderSlot::Width)
            } else if crate::values::keywords::BorderStyle::from_str(&lower).is_ok() {
                Some(BorderSlot::Style)
            } else {
                Some(BorderSlot::Color)
            }
        }
        Term::Hash(_) => Some(BorderSlot::Color),
        _ => None,
    }
}

/// Classify `border: <width> || <style> || <color>` terms and apply to
/// each listed edge.
///
/// [§ 8.5.4 Border shorthand properties](https://www.w3.org/TR/CSS2/box.html#border-shorthand-properties)
fn expand_border_edges(terms: &[Term], edges: &[Edge]) -> Vec<(Property, Vec<Term>)> {
    let mut out = Vec::new();
    for term in terms {
        let Some(slot) = classify_border_term(term) else {
            warn_once("css", "unrecognized border shorthand value");
            return Vec::new();
        };
        for &edge in edges {
            let prop = match slot {
                BorderSlot::Width => edge.width(),
                BorderSlot::Style => edge.style(),
                BorderSlot::Color => edge.color(),
            };
            out.push((prop, vec![term.clone()]));
        }
    }
    out
}

/// `outline: <width> || <style> || <color>`.
fn expand_outline(terms: &[Term]) -> Vec<(Property, Vec<Term>)> {
    let mut out = Vec::new();
    for term in terms {
        let Some(slot) = classify_border_term(term) else {
            warn_once("css", "unrecognized outline shorthand value");
            return Vec::new();
        };
        let prop = match slot {
            BorderSlot::Width => Property::OutlineWidth,
            BorderSlot::Style => Property::OutlineStyle,
            BorderSlot::Color => Property::OutlineColor,
        };
        out.push((prop, vec![term.clone()]));
    }
    out
}

/// Parse a whitespace/comma separated run of value terms.
#[must_use]
pub fn parse_terms(source: &str) -> Vec<Term> {
    let mut out = Vec::new();
    let mut scanner = Scanner::new(source);
    loop {
        scanner.skip_space();
        match scanner.peek() {
            None => break,
            Some(',') => {
                scanner.bump();
            }
            Some('"' | '\'') => {
                if let Some(s) = scanner.take_string() {
                    out.push(Term::Str(s));
                } else {
                    break;
                }
            }
            Some('#') => {
                scanner.bump();
                let hex = scanner.take_while(|c| c.is_ascii_hexdigit());
                if hex.is_empty() {
                    break;
                }
                out.push(Term::Hash(hex));
            }
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                match scanner.take_number() {
                    Some(term) => out.push(term),
                    None => break,
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let word = scanner.take_while(|c| {
                    c.is_ascii_alphanumeric() || c == '-' || c == '_'
                });
                if scanner.peek() == Some('(') {
                    let args = scanner.take_parens();
                    match function_term(&word, &args) {
                        Some(term) => out.push(term),
                        None => {
                            warn_once("css", &format!("unsupported function '{word}()'"));
                        }
                    }
                } else {
                    out.push(Term::Ident(word));
                }
            }
            Some(_) => {
                // Unknown punctuation terminates the value.
                break;
            }
        }
    }
    out
}

fn function_term(name: &str, args: &str) -> Option<Term> {
    match name.to_ascii_lowercase().as_str() {
        "url" => Some(Term::Url(unquote(args.trim()).to_string())),
        "rgb" | "rgba" => Some(Term::Ident(format!("{name}({args})"))),
        "attr" => {
            let words: Vec<&str> = args.split_whitespace().collect();
            match words.as_slice() {
                [name] => Some(Term::Attr {
                    name: (*name).to_string(),
                    tag: None,
                }),
                [tag, name] => Some(Term::Attr {
                    name: (*name).to_string(),
                    tag: Some((*tag).to_string()),
                }),
                _ => None,
            }
        }
        "counter" => {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [name] => Some(Term::Counter {
                    name: (*name).to_string(),
                    style: None,
                }),
                [name, style] => Some(Term::Counter {
                    name: (*name).to_string(),
                    style: Some((*style).to_string()),
                }),
                _ => None,
            }
        }
        "counters" => {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [name, sep] => Some(Term::Counters {
                    name: (*name).to_string(),
                    separator: unquote(sep).to_string(),
                    style: None,
                }),
                [name, sep, style] => Some(Term::Counters {
                    name: (*name).to_string(),
                    separator: unquote(sep).to_string(),
                    style: Some((*style).to_string()),
                }),
                _ => None,
            }
        }
        "script" => Some(Term::Script(args.to_string())),
        _ => None,
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Minimal character scanner shared by the rule and term parsers.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Scanner { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace and `/* ... */` comments.
    fn skip_space(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            if self.src[self.pos..].starts_with("/*") {
                match self.src[self.pos + 2..].find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => self.pos = self.src.len(),
                }
            } else {
                return;
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stop(c) {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    /// Consume a `{ ... }` block (cursor on `{`), returning the inside.
    /// Nested braces are honored.
    fn take_block(&mut self) -> String {
        debug_assert_eq!(self.peek(), Some('{'));
        self.bump();
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self.src[start..self.pos].to_string();
                        self.bump();
                        return inner;
                    }
                }
                _ => {}
            }
            self.bump();
        }
        self.src[start..].to_string()
    }

    /// Consume a `( ... )` group (cursor on `(`), returning the inside.
    fn take_parens(&mut self) -> String {
        debug_assert_eq!(self.peek(), Some('('));
        self.bump();
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self.src[start..self.pos].to_string();
                        self.bump();
                        return inner;
                    }
                }
                _ => {}
            }
            self.bump();
        }
        self.src[start..].to_string()
    }

    /// Consume a quoted string (cursor on the quote).
    fn take_string(&mut self) -> Option<String> {
        let quote = self.peek()?;
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.bump();
            if c == quote {
                return Some(out);
            }
            if c == '\\' {
                if let Some(escaped) = self.peek() {
                    out.push(escaped);
                    self.bump();
                }
            } else {
                out.push(c);
            }
        }
        None
    }

    /// Consume a number, with an optional unit or percent suffix.
    fn take_number(&mut self) -> Option<Term> {
        let text = self.take_while(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+');
        let value: f64 = text.parse().ok()?;
        if self.peek() == Some('%') {
            self.bump();
            return Some(Term::Percent(value));
        }
        let unit = self.take_while(|c| c.is_ascii_alphabetic());
        if unit.is_empty() {
            return Some(Term::Number(value));
        }
        let unit = match unit.to_ascii_lowercase().as_str() {
            "px" => LengthUnit::Px,
            "em" => LengthUnit::Em,
            "ex" => LengthUnit::Ex,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            "in" => LengthUnit::In,
            "cm" => LengthUnit::Cm,
            "mm" => LengthUnit::Mm,
            _ => return None,
        };
        Some(Term::Length { value, unit })
    }
}
