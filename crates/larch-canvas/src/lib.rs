//! Display-list core for the Larch widget: a retained-mode canvas,
//! painting-order queries, and minimal-repaint damage diffing.
//!
//! Layout (out of scope here) draws primitives into a [`Canvas`] in
//! visitation order. The canvas is a tree of coordinate scopes: an
//! *origin* scope records the bounding box of its contents so bounded
//! traversals skip it whole, and an *overflow* scope carries the clip
//! region and scroll state of a scrollable box. Painting never consumes
//! the tree directly; it goes through [`Canvas::search`] (draw order,
//! viewport-bounded) or [`Canvas::sorted_search`] (CSS painting order
//! via the stacking index), and the repaint scheduler compares
//! [`Canvas::snapshot`]s with [`damage`] to find the smallest region
//! worth redrawing.

pub mod canvas;
pub mod items;
pub mod search;
pub mod snapshot;
pub mod sorter;

pub use canvas::{Canvas, ClipRecord, Scope, ScopeChild, TextRun};
pub use items::{
    BoxFlags, BoxItem, ImageItem, ItemHandle, ItemKind, ItemRecord, LineItem, MarkerItem,
    MarkerKind, TextItem, WindowItem,
};
pub use search::{OverflowRegion, ScrollProvider, SearchWindow};
pub use snapshot::{SnapEntry, Snapshot, damage};
