//! The compact length encoding.
//!
//! Length-valued properties store a single `i32`:
//!
//! - a resolved pixel count (possibly negative, for offsets and margins);
//! - one of three sentinel codes ([`pixels::AUTO`], [`pixels::NONE`],
//!   [`pixels::NORMAL`]) taken from a reserved range next to `i32::MIN`,
//!   far outside any plausible pixel magnitude; or
//! - a percentage scaled by 100 (`10%` stores `1000`), in which case the
//!   property's bit is set in the owning value set's [`PropertyMask`] so
//!   consumers know to scale against a containing-block dimension
//!   instead of reading the integer as pixels.
//!
//! During a build, `em`/`ex` quantities are also parked as `value * 100`
//! with a bit in a *transient* mask; the builder rescales them against
//! the resolved font before the value set is interned, so the em/ex form
//! never escapes the builder.

/// Sentinel pixel codes and their guard boundary.
pub mod pixels {
    /// The `auto` keyword.
    pub const AUTO: i32 = i32::MIN + 1;
    /// The `none` keyword.
    pub const NONE: i32 = i32::MIN + 2;
    /// The `normal` keyword.
    pub const NORMAL: i32 = i32::MIN + 3;
    /// Smallest storable real measurement; anything below is a sentinel.
    pub const MIN_VALID: i32 = i32::MIN + 4;

    /// True if `v` is one of the reserved sentinel codes.
    #[must_use]
    pub const fn is_sentinel(v: i32) -> bool {
        v < MIN_VALID
    }
}

/// A bitset with one bit per length-valued property.
///
/// The persistent mask on a computed value set records which properties
/// hold scaled percentages; the builder additionally uses two transient
/// masks for deferred `em`/`ex` quantities. Bit positions come from
/// [`Property::length_bit`](crate::properties::Property::length_bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyMask(u64);

impl PropertyMask {
    /// The empty mask.
    pub const EMPTY: PropertyMask = PropertyMask(0);

    /// Set the bit for `bit`.
    pub fn set(&mut self, bit: u8) {
        self.0 |= 1 << bit;
    }

    /// Clear the bit for `bit`.
    pub fn clear(&mut self, bit: u8) {
        self.0 &= !(1 << bit);
    }

    /// True if the bit for `bit` is set.
    #[must_use]
    pub const fn contains(&self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    /// True if no bit is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the set bit positions, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u8> + use<> {
        let bits = self.0;
        (0..64u8).filter(move |b| bits & (1 << b) != 0)
    }

    /// `self` restricted to the bits of `other`.
    #[must_use]
    pub const fn intersect(&self, other: PropertyMask) -> PropertyMask {
        PropertyMask(self.0 & other.0)
    }

    /// `self` with the bits of `other` removed.
    #[must_use]
    pub const fn difference(&self, other: PropertyMask) -> PropertyMask {
        PropertyMask(self.0 & !other.0)
    }
}

/// Scale a deferred `value * 100` quantity by a per-hundred pixel size,
/// rounding to nearest (away from zero at the midpoint).
///
/// Used both for `em`/`ex` rescaling (`unit_px` is the font's em or ex
/// pixel size) and for resolving a stored percentage against a known
/// base.
#[must_use]
pub const fn rescale_hundredths(value: i32, unit_px: i32) -> i32 {
    let product = value * unit_px;
    let bias = if product < 0 { -50 } else { 50 };
    (product + bias) / 100
}
