//! Counter lists and generated-content fragments.
//!
//! [CSS 2.1 § 12.4 Automatic counters and numbering](https://www.w3.org/TR/CSS2/generate.html#counters)

use serde::Serialize;

use super::keywords::ListStyleType;

/// One `(name, delta)` pair from `counter-reset` or `counter-increment`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CounterEntry {
    /// Counter identifier.
    pub name: String,
    /// Reset value or increment amount.
    pub delta: i32,
}

/// One piece of a `content` value, resolved at cascade time.
///
/// [§ 12.2 The 'content' property](https://www.w3.org/TR/CSS2/generate.html#content)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentFragment {
    /// A quoted string literal.
    Literal(String),
    /// `attr(name)` - the element's attribute value, or nothing if the
    /// attribute is absent.
    Attr(String),
    /// `counter(name [, style])` - the innermost value of the counter.
    Counter {
        /// Counter identifier.
        name: String,
        /// Numbering style; defaults to decimal.
        style: ListStyleType,
    },
    /// `counters(name, separator [, style])` - every nested value of the
    /// counter, outermost first, joined by the separator.
    Counters {
        /// Counter identifier.
        name: String,
        /// Separator between nesting levels.
        separator: String,
        /// Numbering style; defaults to decimal.
        style: ListStyleType,
    },
}

/// Format a counter value in a numbering style.
///
/// [§ 12.5.1 'list-style-type'](https://www.w3.org/TR/CSS2/generate.html#propdef-list-style-type)
///
/// Values outside a style's domain (zero and negatives for the
/// alphabetic and roman systems) fall back to decimal, which is what
/// the rendering of out-of-range counters degrades to.
#[must_use]
pub fn format_counter(value: i32, style: ListStyleType) -> String {
    match style {
        ListStyleType::LowerAlpha if value >= 1 => alpha(value, b'a'),
        ListStyleType::UpperAlpha if value >= 1 => alpha(value, b'A'),
        ListStyleType::LowerRoman if value >= 1 => roman(value).to_ascii_lowercase(),
        ListStyleType::UpperRoman if value >= 1 => roman(value),
        ListStyleType::Disc => "\u{2022}".to_string(),
        ListStyleType::Circle => "\u{25e6}".to_string(),
        ListStyleType::Square => "\u{25aa}".to_string(),
        ListStyleType::None => String::new(),
        _ => value.to_string(),
    }
}

/// Bijective base-26: 1 -> a, 26 -> z, 27 -> aa.
fn alpha(mut value: i32, base: u8) -> String {
    let mut out = Vec::new();
    while value > 0 {
        value -= 1;
        out.push(base + (value % 26) as u8);
        value /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn roman(mut value: i32) -> String {
    const TABLE: &[(i32, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if value > 3999 {
        // Past the conventional roman range; counters degrade to decimal.
        return value.to_string();
    }
    let mut out = String::new();
    for &(n, s) in TABLE {
        while value >= n {
            out.push_str(s);
            value -= n;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_and_fallbacks() {
        assert_eq!(format_counter(7, ListStyleType::Decimal), "7");
        assert_eq!(format_counter(0, ListStyleType::LowerAlpha), "0");
        assert_eq!(format_counter(-3, ListStyleType::UpperRoman), "-3");
    }

    #[test]
    fn test_alphabetic_is_bijective_base_26() {
        assert_eq!(format_counter(1, ListStyleType::LowerAlpha), "a");
        assert_eq!(format_counter(26, ListStyleType::LowerAlpha), "z");
        assert_eq!(format_counter(27, ListStyleType::LowerAlpha), "aa");
        assert_eq!(format_counter(2, ListStyleType::UpperAlpha), "B");
    }

    #[test]
    fn test_roman_numerals() {
        assert_eq!(format_counter(4, ListStyleType::UpperRoman), "IV");
        assert_eq!(format_counter(1987, ListStyleType::UpperRoman), "MCMLXXXVII");
        assert_eq!(format_counter(9, ListStyleType::LowerRoman), "ix");
    }
}
