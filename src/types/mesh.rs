//! Mesh geometry.
//!
//! A mesh record starts with a type word: the low three bits select the mesh
//! kind, the rest are flags. Standard and skin meshes share a common prefix
//! bracketed by guards; skin meshes append bones and vertex influences.

use crate::stream::{IStream, OStream};
use crate::util::{Box3, Error, Mat4, Result, Vec2, Vec3};

/// A draw call over a run of the mesh's index list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Primitive {
    pub first_element: u16,
    pub num_elements: u16,
    /// Topology, indexing and material bits.
    pub kind: u32,
}

/// Primitive topology, from the top two bits of the type word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Strip,
    Fan,
}

impl Primitive {
    pub const TRIANGLES: u32 = 0x0000_0000;
    pub const STRIP: u32 = 0x4000_0000;
    pub const FAN: u32 = 0x8000_0000;
    pub const TYPE_MASK: u32 = 0xC000_0000;
    pub const INDEXED: u32 = 0x2000_0000;
    pub const NO_MATERIAL: u32 = 0x1000_0000;
    pub const MATERIAL_MASK: u32 = 0x0FFF_FFFF;

    /// Indexed triangle list using `material`, or no material if `None`.
    pub fn triangles(first_element: u16, num_elements: u16, material: Option<u32>) -> Self {
        let mut kind = Self::TRIANGLES | Self::INDEXED;
        match material {
            Some(m) => kind |= m & Self::MATERIAL_MASK,
            None => kind |= Self::NO_MATERIAL,
        }
        Self { first_element, num_elements, kind }
    }

    pub fn topology(&self) -> Topology {
        match self.kind & Self::TYPE_MASK {
            Self::STRIP => Topology::Strip,
            Self::FAN => Topology::Fan,
            _ => Topology::Triangles,
        }
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.kind & Self::INDEXED != 0
    }

    /// Index into the shape's material list, if any.
    pub fn material(&self) -> Option<u32> {
        if self.kind & Self::NO_MATERIAL != 0 {
            None
        } else {
            Some(self.kind & Self::MATERIAL_MASK)
        }
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self {
            first_element: stream.read_u16()?,
            num_elements: stream.read_u16()?,
            kind: stream.read_u32()?,
        })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write_u16(self.first_element);
        stream.write_u16(self.num_elements);
        stream.write_u32(self.kind);
    }
}

/// Mesh kind, the low three bits of the type word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshKind {
    Standard = 0,
    Skin = 1,
    Decal = 2,
    Sorted = 3,
    Null = 4,
}

impl MeshKind {
    pub const MASK: u32 = 7;

    pub fn from_type_word(word: u32) -> Result<Self> {
        match word & Self::MASK {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Skin),
            2 => Ok(Self::Decal),
            3 => Ok(Self::Sorted),
            4 => Ok(Self::Null),
            other => Err(Error::corrupt(format!("unknown mesh type {}", other))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Skin => "Skin",
            Self::Decal => "Decal",
            Self::Sorted => "Sorted",
            Self::Null => "Null",
        }
    }
}

/// Geometry shared by standard and skin meshes.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMesh {
    pub num_frames: i32,
    pub num_mat_frames: i32,
    pub parent: i32,
    pub bounds: Box3,
    pub center: Vec3,
    pub radius: f32,
    /// Positions for every frame, `verts_per_frame` at a time.
    pub verts: Vec<Vec3>,
    pub tverts: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    /// One-byte encoded normals, parallel to `normals`.
    pub enormals: Vec<u8>,
    pub primitives: Vec<Primitive>,
    pub indices: Vec<u16>,
    /// Indices for the mirrored (back-facing) pass.
    pub mindices: Vec<u16>,
    pub verts_per_frame: i32,
    /// Raw flags word. See the `Mesh::*` flag constants.
    pub flags: u32,
}

impl Default for StandardMesh {
    fn default() -> Self {
        Self {
            num_frames: 1,
            num_mat_frames: 1,
            parent: -1,
            bounds: Box3::default(),
            center: Vec3::ZERO,
            radius: 0.0,
            verts: Vec::new(),
            tverts: Vec::new(),
            normals: Vec::new(),
            enormals: Vec::new(),
            primitives: Vec::new(),
            indices: Vec::new(),
            mindices: Vec::new(),
            verts_per_frame: 1,
            flags: 0,
        }
    }
}

impl StandardMesh {
    fn read(stream: &mut IStream, type_flags: u32) -> Result<Self> {
        stream.guard()?;

        let num_frames = stream.read32()?;
        let num_mat_frames = stream.read32()?;
        let parent = stream.read32()?;
        let bounds = stream.read_box()?;
        let center = stream.read_vec3()?;
        let radius = stream.read_f32()?;

        let n_vert = stream.read_len()?;
        let verts = stream.read_vec(n_vert, IStream::read_vec3)?;
        let n_tvert = stream.read_len()?;
        let tverts = stream.read_vec(n_tvert, IStream::read_vec2)?;
        let normals = stream.read_vec(n_vert, IStream::read_vec3)?;
        let enormals = stream.read_vec(n_vert, IStream::read_u8)?;

        let n_prim = stream.read_len()?;
        let primitives = stream.read_vec(n_prim, Primitive::read)?;
        let n_index = stream.read_len()?;
        let indices = stream.read_vec(n_index, IStream::read_u16)?;
        let n_mindex = stream.read_len()?;
        let mindices = stream.read_vec(n_mindex, IStream::read_u16)?;
        let verts_per_frame = stream.read32()?;
        let flags = type_flags | stream.read_u32()?;

        stream.guard()?;

        Ok(Self {
            num_frames,
            num_mat_frames,
            parent,
            bounds,
            center,
            radius,
            verts,
            tverts,
            normals,
            enormals,
            primitives,
            indices,
            mindices,
            verts_per_frame,
            flags,
        })
    }

    fn write(&self, stream: &mut OStream) -> Result<()> {
        if self.normals.len() != self.verts.len() || self.enormals.len() != self.verts.len() {
            return Err(Error::corrupt(format!(
                "mesh has {} vertices but {} normals and {} encoded normals",
                self.verts.len(),
                self.normals.len(),
                self.enormals.len()
            )));
        }

        stream.guard();
        stream.write32(self.num_frames);
        stream.write32(self.num_mat_frames);
        stream.write32(self.parent);
        stream.write_box(&self.bounds);
        stream.write_vec3(self.center);
        stream.write_f32(self.radius);

        stream.write_len(self.verts.len())?;
        for &v in &self.verts {
            stream.write_vec3(v);
        }
        stream.write_len(self.tverts.len())?;
        for &t in &self.tverts {
            stream.write_vec2(t);
        }
        for &n in &self.normals {
            stream.write_vec3(n);
        }
        for &e in &self.enormals {
            stream.write_u8(e);
        }

        stream.write_len(self.primitives.len())?;
        for prim in &self.primitives {
            prim.write(stream);
        }
        stream.write_len(self.indices.len())?;
        for &i in &self.indices {
            stream.write_u16(i);
        }
        stream.write_len(self.mindices.len())?;
        for &i in &self.mindices {
            stream.write_u16(i);
        }
        stream.write32(self.verts_per_frame);
        stream.write_u32(self.flags);
        stream.guard();
        Ok(())
    }

    /// Bounds of the vertices transformed by `mat`.
    pub fn calculate_bounds(&self, mat: &Mat4) -> Box3 {
        let mut b = Box3::EMPTY;
        for v in &self.verts {
            b.expand_by_point(mat.transform_point3(*v));
        }
        b
    }

    /// Largest distance from `center` to a vertex transformed by `mat`.
    pub fn calculate_radius(&self, mat: &Mat4, center: Vec3) -> f32 {
        self.verts
            .iter()
            .map(|v| (mat.transform_point3(*v) - center).length())
            .fold(0.0, f32::max)
    }

    /// Like [`calculate_radius`](Self::calculate_radius), ignoring Z.
    pub fn calculate_radius_tube(&self, mat: &Mat4, center: Vec3) -> f32 {
        self.verts
            .iter()
            .map(|v| (mat.transform_point3(*v) - center).truncate().length())
            .fold(0.0, f32::max)
    }
}

/// Bone of a skin mesh: a node and its bind-pose transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub node: i32,
    /// Initial transform, 16 floats in file order (row-major).
    pub initial_transform: [f32; 16],
}

impl Bone {
    /// Initial transform as a matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array(&self.initial_transform).transpose()
    }
}

/// One vertex weight of a skin mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Influence {
    pub vertex: i32,
    /// Index into the mesh's bone list.
    pub bone: i32,
    pub weight: f32,
}

/// Second copy of the vertex data stored ahead of the bones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialVerts {
    pub verts: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub enormals: Vec<u8>,
}

/// A mesh deformed by node transforms.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinMesh {
    pub mesh: StandardMesh,
    /// Block read from the file, written back verbatim. `None` means the
    /// primary vertex arrays are written in its place.
    pub initial: Option<InitialVerts>,
    pub bones: Vec<Bone>,
    pub influences: Vec<Influence>,
}

impl SkinMesh {
    fn read(stream: &mut IStream, type_flags: u32) -> Result<Self> {
        let mesh = StandardMesh::read(stream, type_flags)?;

        let n = stream.read_len()?;
        let initial = InitialVerts {
            verts: stream.read_vec(n, IStream::read_vec3)?,
            normals: stream.read_vec(n, IStream::read_vec3)?,
            enormals: stream.read_vec(n, IStream::read_u8)?,
        };

        let n_bone = stream.read_len()?;
        let transforms = stream.read_vec(n_bone, |s| {
            let mut m = [0.0f32; 16];
            for f in m.iter_mut() {
                *f = s.read_f32()?;
            }
            Ok(m)
        })?;

        // Influences are stored one column at a time.
        let n_influence = stream.read_len()?;
        let vertices = stream.read_vec(n_influence, IStream::read32)?;
        let bone_indices = stream.read_vec(n_influence, IStream::read32)?;
        let weights = stream.read_vec(n_influence, IStream::read_f32)?;
        let influences = vertices
            .into_iter()
            .zip(bone_indices)
            .zip(weights)
            .map(|((vertex, bone), weight)| Influence { vertex, bone, weight })
            .collect();

        let n_node = stream.read_len()?;
        if n_node != n_bone {
            return Err(Error::corrupt(format!(
                "skin mesh has {} bone transforms but {} bone nodes",
                n_bone, n_node
            )));
        }
        let nodes = stream.read_vec(n_node, IStream::read32)?;
        let bones = nodes
            .into_iter()
            .zip(transforms)
            .map(|(node, initial_transform)| Bone { node, initial_transform })
            .collect();

        stream.guard()?;

        Ok(Self { mesh, initial: Some(initial), bones, influences })
    }

    fn write(&self, stream: &mut OStream) -> Result<()> {
        self.mesh.write(stream)?;

        let (verts, normals, enormals) = match &self.initial {
            Some(init) => (&init.verts, &init.normals, &init.enormals),
            None => (&self.mesh.verts, &self.mesh.normals, &self.mesh.enormals),
        };
        if normals.len() != verts.len() || enormals.len() != verts.len() {
            return Err(Error::corrupt("skin initial vertex arrays differ in length"));
        }
        stream.write_len(verts.len())?;
        for &v in verts {
            stream.write_vec3(v);
        }
        for &n in normals {
            stream.write_vec3(n);
        }
        for &e in enormals {
            stream.write_u8(e);
        }

        stream.write_len(self.bones.len())?;
        for bone in &self.bones {
            for &f in &bone.initial_transform {
                stream.write_f32(f);
            }
        }

        stream.write_len(self.influences.len())?;
        for inf in &self.influences {
            stream.write32(inf.vertex);
        }
        for inf in &self.influences {
            stream.write32(inf.bone);
        }
        for inf in &self.influences {
            stream.write_f32(inf.weight);
        }

        stream.write_len(self.bones.len())?;
        for bone in &self.bones {
            stream.write32(bone.node);
        }

        stream.guard();
        Ok(())
    }
}

/// A mesh of any kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Mesh {
    Standard(StandardMesh),
    Skin(SkinMesh),
    /// Recognized, no codec.
    Decal,
    /// Recognized, no codec.
    Sorted,
    Null,
}

impl Mesh {
    pub const BILLBOARD: u32 = 1 << 31;
    pub const HAS_DETAIL_TEXTURE: u32 = 1 << 30;
    pub const BILLBOARD_Z_AXIS: u32 = 1 << 29;
    pub const USE_ENCODED_NORMALS: u32 = 1 << 28;

    pub fn kind(&self) -> MeshKind {
        match self {
            Self::Standard(_) => MeshKind::Standard,
            Self::Skin(_) => MeshKind::Skin,
            Self::Decal => MeshKind::Decal,
            Self::Sorted => MeshKind::Sorted,
            Self::Null => MeshKind::Null,
        }
    }

    /// Shared geometry, for standard and skin meshes.
    pub fn geometry(&self) -> Option<&StandardMesh> {
        match self {
            Self::Standard(m) => Some(m),
            Self::Skin(s) => Some(&s.mesh),
            _ => None,
        }
    }

    pub fn geometry_mut(&mut self) -> Option<&mut StandardMesh> {
        match self {
            Self::Standard(m) => Some(m),
            Self::Skin(s) => Some(&mut s.mesh),
            _ => None,
        }
    }

    /// Flag bits of the type word (kind bits masked off).
    pub fn flags(&self) -> u32 {
        self.geometry().map_or(0, |m| m.flags & !MeshKind::MASK)
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags() & flag != 0
    }

    fn type_word(&self) -> u32 {
        self.kind() as u32 | self.flags()
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        let word = stream.read_u32()?;
        let type_flags = word & !MeshKind::MASK;
        match MeshKind::from_type_word(word)? {
            MeshKind::Standard => Ok(Self::Standard(StandardMesh::read(stream, type_flags)?)),
            MeshKind::Skin => Ok(Self::Skin(SkinMesh::read(stream, type_flags)?)),
            MeshKind::Null => Ok(Self::Null),
            kind => Err(Error::unsupported(format!("cannot read {} mesh", kind.name()))),
        }
    }

    pub fn write(&self, stream: &mut OStream) -> Result<()> {
        match self {
            Self::Standard(m) => {
                stream.write_u32(self.type_word());
                m.write(stream)
            }
            Self::Skin(s) => {
                stream.write_u32(self.type_word());
                s.write(stream)
            }
            Self::Null => {
                stream.write_u32(self.type_word());
                Ok(())
            }
            other => Err(Error::unsupported(format!("cannot write {} mesh", other.kind().name()))),
        }
    }
}
