//! Computed values: representation, construction, interning, and change
//! classification.

pub mod builder;
pub mod compare;
pub mod computed;

pub use builder::Builder;
pub use compare::StyleChange;
pub use computed::{ComputedValues, ValuesHandle, ValuesPool};
