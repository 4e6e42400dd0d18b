//! Shape entity records and their codecs.
//!
//! Records stored in the tri-buffer read from an [`IStream`](crate::stream::IStream)
//! and write to an [`OStream`](crate::stream::OStream). Sequences and bitsets
//! live in the plain tail and use `Read`/`Write` directly.

pub mod bitset;
mod material;
mod mesh;
mod node;
mod sequence;
mod state;

pub use material::*;
pub use mesh::*;
pub use node::*;
pub use sequence::*;
pub use state::*;
