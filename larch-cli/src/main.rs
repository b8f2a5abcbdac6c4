//! Larch style inspector
//!
//! Headless debugging for stylesheets: list the rules a sheet parses
//! into, or resolve the computed style of a synthetic element chain
//! without building a real document.

use std::fs;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use larch_dom::{AttributesMap, DomTree, DynamicFlags, ElementData, NodeId, NodeType};
use larch_style::StyleEngine;
use larch_style::parse::{
    self, AttrOp, Combinator, LengthUnit, Origin, PseudoElement, Selector, SimpleSelector, Term,
};
use larch_style::values::length::pixels;
use owo_colors::OwoColorize;
use serde_json::json;

#[derive(Parser)]
#[command(name = "larch", version, about = "Inspect stylesheet parsing and style resolution")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a stylesheet and list its rules.
    Rules {
        /// CSS file to parse.
        file: String,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Resolve the computed style of the last element of a chain.
    Style {
        /// CSS file to apply.
        file: String,
        /// Element chain, outermost first: "html body div.note#main".
        chain: String,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Rules { file, json } => rules(&file, json),
        Command::Style { file, chain, json } => style(&file, &chain, json),
    }
}

fn rules(file: &str, json: bool) -> Result<()> {
    let source = fs::read_to_string(file).with_context(|| format!("reading {file}"))?;
    let mut order = 0;
    let rules = parse::parse_stylesheet(&source, Origin::Author, &mut order);

    if json {
        let out: Vec<_> = rules
            .iter()
            .map(|rule| {
                json!({
                    "selector": selector_text(&rule.selector),
                    "specificity": rule.specificity,
                    "order": rule.source_order,
                    "declarations": rule.declarations.iter().map(|decl| {
                        json!({
                            "property": decl.property.to_string(),
                            "value": terms_text(&decl.terms),
                            "important": decl.important,
                        })
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for rule in &rules {
        println!(
            "{} {}",
            selector_text(&rule.selector).bold(),
            format!("(specificity {:06x})", rule.specificity).dimmed()
        );
        for decl in rule.declarations.iter() {
            let bang = if decl.important { " !important" } else { "" };
            println!(
                "    {}: {}{bang}",
                decl.property.green(),
                terms_text(&decl.terms)
            );
        }
    }
    println!("{} rules", rules.len());
    Ok(())
}

fn style(file: &str, chain: &str, json: bool) -> Result<()> {
    let source = fs::read_to_string(file).with_context(|| format!("reading {file}"))?;

    let mut tree = DomTree::new();
    let mut parent = NodeId::ROOT;
    let mut subject = None;
    for compound in chain.split_whitespace() {
        let node = tree.alloc(synthetic_element(compound)?);
        tree.append_child(parent, node);
        parent = node;
        subject = Some(node);
    }
    let Some(subject) = subject else {
        bail!("empty element chain");
    };

    let mut engine = StyleEngine::headless()?;
    engine.add_stylesheet(&source, Origin::Author);
    let _ = engine.restyle(&tree)?;
    let values = engine
        .computed_values(&tree, subject)
        .context("chain was not styled")?;

    let z_index = if values.z_index == pixels::AUTO {
        "auto".to_string()
    } else {
        values.z_index.to_string()
    };

    if json {
        let out = json!({
            "display": values.display.to_string(),
            "position": values.position.to_string(),
            "float": values.float.to_string(),
            "color": &*values.color,
            "background-color": &*values.background_color,
            "font-family": values.font.key.family,
            "font-size-tenths": values.font.key.size_tenths,
            "margin": [values.margin_top, values.margin_right,
                       values.margin_bottom, values.margin_left],
            "padding": [values.padding_top, values.padding_right,
                        values.padding_bottom, values.padding_left],
            "line-height": values.line_height,
            "z-index": z_index,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", chain.bold());
    println!("  display: {}", values.display);
    println!("  position: {}  float: {}  z-index: {z_index}", values.position, values.float);
    println!(
        "  color: {} #{:02x}{:02x}{:02x}",
        values.color.name, values.color.red, values.color.green, values.color.blue
    );
    println!(
        "  background-color: {} #{:02x}{:02x}{:02x}",
        values.background_color.name,
        values.background_color.red,
        values.background_color.green,
        values.background_color.blue
    );
    println!(
        "  font: {} @ {} tenths-pt",
        values.font.key.family, values.font.key.size_tenths
    );
    println!(
        "  margin: {} {} {} {}",
        values.margin_top, values.margin_right, values.margin_bottom, values.margin_left
    );
    println!(
        "  padding: {} {} {} {}",
        values.padding_top, values.padding_right, values.padding_bottom, values.padding_left
    );
    Ok(())
}

/// Build an element from a compound like `div.note#main`.
fn synthetic_element(compound: &str) -> Result<NodeType> {
    let mut tag = String::new();
    let mut id = None;
    let mut classes: Vec<String> = Vec::new();

    let mut sigil = ' ';
    let mut buf = String::new();
    for ch in compound.chars().chain(std::iter::once('.')) {
        if ch == '.' || ch == '#' {
            match sigil {
                '#' if !buf.is_empty() => id = Some(buf.clone()),
                '.' if !buf.is_empty() => classes.push(buf.clone()),
                ' ' => tag = buf.clone(),
                _ => bail!("empty segment in chain element {compound:?}"),
            }
            sigil = ch;
            buf.clear();
        } else {
            buf.push(ch);
        }
    }
    if tag.is_empty() {
        bail!("chain element {compound:?} has no tag");
    }

    let mut attrs = AttributesMap::new();
    if let Some(id) = id {
        let _ = attrs.insert("id".to_string(), id);
    }
    if !classes.is_empty() {
        let _ = attrs.insert("class".to_string(), classes.join(" "));
    }
    Ok(NodeType::Element(ElementData {
        tag_name: tag,
        attrs,
    }))
}

/// Reconstruct a selector's source spelling. Compounds are stored
/// subject-first; printing walks them in source order.
fn selector_text(selector: &Selector) -> String {
    let mut out = String::new();
    for (combinator, simple) in selector.parts.iter().rev() {
        out.push_str(&compound_text(simple));
        match combinator {
            Combinator::Subject => {}
            Combinator::Descendant => out.push(' '),
            Combinator::Child => out.push_str(" > "),
        }
    }
    out
}

fn compound_text(simple: &SimpleSelector) -> String {
    let mut out = simple.tag.clone().unwrap_or_default();
    if out.is_empty() && simple.id.is_none() && simple.classes.is_empty() && simple.attrs.is_empty()
    {
        out.push('*');
    }
    if let Some(id) = &simple.id {
        out.push('#');
        out.push_str(id);
    }
    for class in &simple.classes {
        out.push('.');
        out.push_str(class);
    }
    for attr in &simple.attrs {
        match &attr.op {
            AttrOp::Exists => out.push_str(&format!("[{}]", attr.name)),
            AttrOp::Exact(v) => out.push_str(&format!("[{}=\"{v}\"]", attr.name)),
            AttrOp::Includes(v) => out.push_str(&format!("[{}~=\"{v}\"]", attr.name)),
        }
    }
    for (flag, name) in [
        (DynamicFlags::HOVER, ":hover"),
        (DynamicFlags::ACTIVE, ":active"),
        (DynamicFlags::FOCUS, ":focus"),
        (DynamicFlags::LINK, ":link"),
        (DynamicFlags::VISITED, ":visited"),
    ] {
        if simple.dynamic.contains(flag) {
            out.push_str(name);
        }
    }
    match simple.pseudo_element {
        Some(PseudoElement::Before) => out.push_str(":before"),
        Some(PseudoElement::After) => out.push_str(":after"),
        None => {}
    }
    out
}

fn terms_text(terms: &[Term]) -> String {
    let parts: Vec<String> = terms.iter().map(term_text).collect();
    parts.join(" ")
}

fn term_text(term: &Term) -> String {
    match term {
        Term::Ident(s) => s.clone(),
        Term::Number(n) => n.to_string(),
        Term::Length { value, unit } => format!("{value}{}", unit_text(*unit)),
        Term::Percent(p) => format!("{p}%"),
        Term::Hash(hex) => format!("#{hex}"),
        Term::Str(s) => format!("\"{s}\""),
        Term::Url(url) => format!("url({url})"),
        Term::Attr { name, tag: Some(tag) } => format!("attr({tag} {name})"),
        Term::Attr { name, tag: None } => format!("attr({name})"),
        Term::Counter { name, style: Some(style) } => format!("counter({name}, {style})"),
        Term::Counter { name, style: None } => format!("counter({name})"),
        Term::Counters { name, separator, style: Some(style) } => {
            format!("counters({name}, \"{separator}\", {style})")
        }
        Term::Counters { name, separator, style: None } => {
            format!("counters({name}, \"{separator}\")")
        }
        Term::Script(body) => format!("script({body})"),
    }
}

const fn unit_text(unit: LengthUnit) -> &'static str {
    match unit {
        LengthUnit::Px => "px",
        LengthUnit::Em => "em",
        LengthUnit::Ex => "ex",
        LengthUnit::Pt => "pt",
        LengthUnit::Pc => "pc",
        LengthUnit::In => "in",
        LengthUnit::Cm => "cm",
        LengthUnit::Mm => "mm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_element_parses_tag_id_and_classes() {
        let NodeType::Element(data) = synthetic_element("div.note.wide#main").unwrap() else {
            panic!("expected an element");
        };
        assert_eq!(data.tag_name, "div");
        assert_eq!(data.id(), Some("main"));
        assert!(data.has_class("note"));
        assert!(data.has_class("wide"));
    }

    #[test]
    fn test_selector_text_round_trips_source_order() {
        let sel = parse::selector::parse_selector("ul > li.item:hover").unwrap();
        assert_eq!(selector_text(&sel), "ul > li.item:hover");
    }

    #[test]
    fn test_terms_text_spells_values_back() {
        let terms = parse::parse_terms("1px solid red");
        assert_eq!(terms_text(&terms), "1px solid red");
    }
}
