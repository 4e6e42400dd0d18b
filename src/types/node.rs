//! Node hierarchy records: nodes, objects, decals, IFL materials, subshapes.

use crate::stream::{IStream, OStream};
use crate::util::Result;

/// A node in the shape hierarchy.
///
/// `parent` indexes the shape's node list, -1 for a root. The remaining
/// links are kept only so files round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Index into the name pool.
    pub name: i32,
    pub parent: i32,
    pub first_object: i32,
    pub first_child: i32,
    pub next_sibling: i32,
}

impl Node {
    pub fn new(name: i32, parent: i32) -> Self {
        Self { name, parent, first_object: -1, first_child: -1, next_sibling: -1 }
    }

    /// True for nodes without a parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self {
            name: stream.read32()?,
            parent: stream.read32()?,
            first_object: stream.read32()?,
            first_child: stream.read32()?,
            next_sibling: stream.read32()?,
        })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write32(self.name);
        stream.write32(self.parent);
        stream.write32(self.first_object);
        stream.write32(self.first_child);
        stream.write32(self.next_sibling);
    }
}

/// A renderable object: a run of `num_meshes` meshes starting at
/// `first_mesh`, one per object detail, attached to `node`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    pub name: i32,
    pub num_meshes: i32,
    pub first_mesh: i32,
    pub node: i32,
    pub next_sibling: i32,
    pub first_decal: i32,
}

impl Object {
    pub fn new(name: i32, num_meshes: i32, first_mesh: i32, node: i32) -> Self {
        Self { name, num_meshes, first_mesh, node, next_sibling: -1, first_decal: -1 }
    }

    /// Global mesh index for the given object detail, if the object has one.
    pub fn mesh_index(&self, object_detail: i32) -> Option<usize> {
        if object_detail < 0 || object_detail >= self.num_meshes {
            return None;
        }
        usize::try_from(self.first_mesh + object_detail).ok()
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self {
            name: stream.read32()?,
            num_meshes: stream.read32()?,
            first_mesh: stream.read32()?,
            node: stream.read32()?,
            next_sibling: stream.read32()?,
            first_decal: stream.read32()?,
        })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write32(self.name);
        stream.write32(self.num_meshes);
        stream.write32(self.first_mesh);
        stream.write32(self.node);
        stream.write32(self.next_sibling);
        stream.write32(self.first_decal);
    }
}

/// Decal placeholder. Decals carry no data in any supported version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decal;

/// Image-flip material animation.
#[derive(Clone, Debug, PartialEq)]
pub struct IflMaterial {
    pub name: i32,
    /// Material slot the animation drives.
    pub slot: i32,
    pub first_frame: i32,
    /// Stored as an integer; exporters write -1.
    pub time: i32,
    pub num_frames: i32,
}

impl IflMaterial {
    pub fn new(name: i32, slot: i32) -> Self {
        Self { name, slot, first_frame: -1, time: -1, num_frames: -1 }
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self {
            name: stream.read32()?,
            slot: stream.read32()?,
            first_frame: stream.read32()?,
            time: stream.read32()?,
            num_frames: stream.read32()?,
        })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write32(self.name);
        stream.write32(self.slot);
        stream.write32(self.first_frame);
        stream.write32(self.time);
        stream.write32(self.num_frames);
    }
}

/// Contiguous spans of the global node, object and decal lists.
///
/// Stored column-wise by the shape, so there is no per-record codec.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subshape {
    pub first_node: i32,
    pub first_object: i32,
    pub first_decal: i32,
    pub num_nodes: i32,
    pub num_objects: i32,
    pub num_decals: i32,
}

impl Subshape {
    /// Node index range covered by this subshape.
    pub fn nodes(&self) -> std::ops::Range<i32> {
        self.first_node..self.first_node + self.num_nodes
    }

    /// Object index range covered by this subshape.
    pub fn objects(&self) -> std::ops::Range<i32> {
        self.first_object..self.first_object + self.num_objects
    }
}
