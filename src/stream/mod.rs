//! Low-level DTS stream layer.
//!
//! The bulk of a shape file is a "tri-buffer": three typed buffers filled
//! independently and stored back to back behind a small header.
//!
//! ## File Structure
//!
//! ```text
//! +---------------------+
//! | Version             |  i16
//! | Exporter version    |  i16
//! | end8, end32, end16  |  3 x i32, cumulative, in 4-byte units
//! +---------------------+
//! | 32-bit buffer       |  end32 words
//! | 16-bit buffer       |  (end16 - end32) * 2 halfwords
//! | 8-bit buffer        |  (end8 - end16) * 4 bytes
//! +---------------------+
//! | Tail (plain LE)     |  sequences, materials
//! +---------------------+
//! ```
//!
//! Structural sections are separated by guards: each guard writes the same
//! incrementing counter into all three buffers, so a reader that drifts in
//! any one channel fails at the next section boundary.

pub mod format;
pub mod plain;
mod reader;
mod writer;

pub use format::*;
pub use reader::IStream;
pub use writer::OStream;

#[cfg(test)]
mod tests;
