//! Views over a finished [`UnitIndex`](crate::index::UnitIndex).
//!
//! Pure functions: data in, text out.

pub mod snapshot;

pub use snapshot::render;
