//! CSS style resolution for the Larch widget core.
//!
//! This crate implements the cascade: matching parsed stylesheet rules and
//! inline styles against a [`larch_dom::DomTree`], resolving each node's
//! ~65 supported properties into an interned, shared
//! [`ComputedValues`](style::ComputedValues) set, classifying what kind of
//! redraw a style change requires, and maintaining the stacking-context
//! index that later sorts canvas items into CSS painting order.
//!
//! The pipeline, leaf-first:
//!
//! - [`values`] - value types: the compact length encoding, interned
//!   colors, cached fonts, counter and content lists
//! - [`properties`] - the per-property descriptor table
//! - [`parse`] - a compact CSS parser producing rules, declarations, and
//!   selectors
//! - [`style`] - the computed-values builder and change classification
//! - [`cascade`] - the style engine: worklist restyle, counters, generated
//!   content
//! - [`stacking`] - the stacking-context index and `restack`
//!
//! All shared state (interning pools, configuration, platform font
//! backend) lives in a per-document [`context::StyleContext`]; nothing in
//! this crate is global.

pub mod cascade;
pub mod context;
pub mod error;
pub mod parse;
pub mod properties;
pub mod stacking;
pub mod style;
pub mod values;

pub use cascade::{RestyleOutcome, StyleEngine};
pub use context::{StyleConfig, StyleContext};
pub use error::StyleError;
pub use properties::Property;
pub use stacking::StackingIndex;
pub use style::{ComputedValues, StyleChange, ValuesHandle};
pub use values::color::{Color, ColorHandle};
pub use values::font::{Font, FontBackend, FontHandle, FontKey, FontMetrics};
