//! Error types for style resolution.
//!
//! Almost everything in the cascade recovers locally: a rejected
//! declaration leaves the staged value untouched and emits a one-shot
//! diagnostic. The errors here are the few conditions that cannot be
//! absorbed that way.

use thiserror::Error;

/// Fatal style-resolution failures.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The font cache exhausted its degradation chain (requested variant,
    /// then non-italic, then non-bold, then the default family, then the
    /// default size) without the backend producing a usable font. The
    /// platform is assumed to always provide *some* renderable font, so
    /// this is not recoverable.
    #[error("no usable font for family '{family}' at {size_tenths} tenths of a point")]
    FontUnavailable {
        /// The family originally requested.
        family: String,
        /// The size originally requested, in tenths of a point.
        size_tenths: i32,
    },
}
