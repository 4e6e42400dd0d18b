//! Utility types and functions for DTS.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus [`Box3`] and quaternion quantization
//! - [`text`] - Windows-1252 encoding for names
//! - [`file`] - Memory-mapped reads and atomic saves

mod error;
pub mod file;
mod math;
pub mod text;

pub use error::*;
pub use math::*;
