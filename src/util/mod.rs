//! Utility types and functions.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - [`ByteReader`] - Bounds-checked binary cursor
//! - Math type re-exports from glam plus [`Color`] and [`Rotation`]

mod error;
mod math;
mod reader;

pub use error::*;
pub use math::*;
pub use reader::*;
