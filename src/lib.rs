//! # DTS
//!
//! Rust implementation of the legacy DTS 3D shape format (`.dts`) and its
//! companion sequence format (`.dsq`).
//!
//! A shape file holds a node hierarchy, standard and skinned meshes, material
//! references, levels of detail and keyframed animation. Most of it lives in a
//! tri-buffer section of 32, 16 and 8-bit channels separated by guard values;
//! sequences and materials follow as a plain little-endian tail. Layout
//! varies with the format version, and saving can target any version from 15
//! through 26.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types, Windows-1252 text, file helpers
//! - [`stream`] - Tri-buffer reader/writer and plain record helpers
//! - [`types`] - Entity records (nodes, meshes, sequences, materials)
//! - [`shape`] - The [`Shape`] aggregate with load and save
//! - [`dsq`] - Sequence files
//!
//! ## Example
//!
//! ```ignore
//! use dts::Shape;
//!
//! let shape = Shape::open("player.dts")?;
//! for (i, node) in shape.nodes.iter().enumerate() {
//!     let world = shape.world_matrix(i)?;
//!     println!("{} at {}", shape.names.get(node.name).unwrap_or("?"), world.w_axis);
//! }
//! shape.save("player_v26.dts", 26)?;
//! ```

pub mod util;
pub mod stream;
pub mod types;
pub mod shape;
pub mod dsq;

// Re-export commonly used types
pub use util::{Error, Result};
pub use shape::{NamePool, Shape};
pub use dsq::{DsqFile, DsqSequence};
pub use stream::DEFAULT_VERSION;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Box3, Error, Mat4, Quat, Result, Vec2, Vec3};
    pub use crate::shape::{NamePool, Shape};
    pub use crate::dsq::{DsqFile, DsqSequence};
    pub use crate::types::*;
}
