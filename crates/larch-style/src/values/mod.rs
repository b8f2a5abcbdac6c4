//! Value types used by computed styles.
//!
//! Each submodule owns one representation family: keyword enums, the
//! compact pixel/percentage length encoding, interned colors, cached
//! fonts, and counter/content lists.

pub mod color;
pub mod counter;
pub mod font;
pub mod keywords;
pub mod length;

pub use keywords::*;
pub use length::{PropertyMask, pixels};
