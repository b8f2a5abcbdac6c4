//! Common utilities for the Larch widget core.
//!
//! This crate provides shared infrastructure used by the style and canvas
//! components:
//! - **Warning System** - deduplicated diagnostics for rejected values and
//!   unsupported features
//! - **Geometry** - integer rectangles used for bounding boxes and damage
//!   regions

pub mod geometry;
pub mod warning;

pub use geometry::Rect;
pub use warning::{clear_warnings, warn_once};
