//! Shape loading.

use std::io::Read;
use std::path::Path;

use tracing::{debug, trace};

use crate::stream::{
    has_ground_frames, has_scales, plain, IStream, ALPHA_AND_WIDE_NAMES_SINCE,
    MATERIAL_LIST_TAG, MATERIAL_PADDING_VERSION, MESH_INDEX_LIST_BEFORE, NO_LEGACY_FIELD_SINCE,
    SPLIT_COUNTS_SINCE,
};
use crate::types::{
    Decal, DetailLevel, IflMaterial, Material, Mesh, Node, Object, ObjectState, Sequence,
    Subshape, Trigger,
};
use crate::util::{file, Error, Result};

use super::{NamePool, Shape};

/// Entity counts from the front of the 32-bit buffer.
#[derive(Debug, Default)]
struct Counts {
    nodes: usize,
    objects: usize,
    decals: usize,
    subshapes: usize,
    ifl_materials: usize,
    rotations: usize,
    translations: usize,
    uniform_scales: usize,
    aligned_scales: usize,
    arbitrary_scales: usize,
    ground_frames: usize,
    object_states: usize,
    decal_states: usize,
    triggers: usize,
    detail_levels: usize,
    meshes: usize,
    names: usize,
}

impl Counts {
    fn read(stream: &mut IStream) -> Result<Self> {
        let version = stream.version();
        let mut c = Counts {
            nodes: stream.read_len()?,
            objects: stream.read_len()?,
            decals: stream.read_len()?,
            subshapes: stream.read_len()?,
            ifl_materials: stream.read_len()?,
            ..Default::default()
        };

        if version < SPLIT_COUNTS_SINCE {
            // One combined count covering default and animated rotations.
            let combined = stream.read_len()?;
            c.rotations = combined.checked_sub(c.nodes).ok_or_else(|| {
                Error::corrupt(format!("combined node count {} below node count {}", combined, c.nodes))
            })?;
            c.translations = c.rotations;
        } else {
            c.rotations = stream.read_len()?;
            c.translations = stream.read_len()?;
            c.uniform_scales = stream.read_len()?;
            c.aligned_scales = stream.read_len()?;
            c.arbitrary_scales = stream.read_len()?;
        }

        if has_ground_frames(version) {
            c.ground_frames = stream.read_len()?;
        }

        c.object_states = stream.read_len()?;
        c.decal_states = stream.read_len()?;
        c.triggers = stream.read_len()?;
        c.detail_levels = stream.read_len()?;
        c.meshes = stream.read_len()?;

        if version < NO_LEGACY_FIELD_SINCE {
            let _legacy = stream.read32()?;
        }

        c.names = stream.read_len()?;
        Ok(c)
    }
}

impl Shape {
    /// Load a shape from an in-memory file image.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let shape = Self::read_from(&mut cursor)?;
        if !cursor.is_empty() {
            debug!(trailing = cursor.len(), "ignoring bytes after material list");
        }
        Ok(shape)
    }

    /// Load a shape from a memory-mapped file.
    #[tracing::instrument(skip_all)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let map = file::map_file(path.as_ref())?;
        Self::load(&map)
    }

    /// Read a shape: tri-buffer first, then sequences and materials.
    #[tracing::instrument(skip_all)]
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut stream = IStream::read_from(r)?;
        let mut shape = Self::read_body(&mut stream)?;
        shape.sequences = read_sequences(r)?;
        shape.materials = read_materials(r, shape.version)?;
        debug!(
            version = shape.version,
            nodes = shape.nodes.len(),
            meshes = shape.meshes.len(),
            sequences = shape.sequences.len(),
            materials = shape.materials.len(),
            "loaded shape"
        );
        Ok(shape)
    }

    fn read_body(stream: &mut IStream) -> Result<Self> {
        let version = stream.version();
        let c = Counts::read(stream)?;
        trace!(version, counts = ?c, "shape header");

        let mut shape = Shape {
            version,
            exporter_version: stream.exporter_version(),
            ..Default::default()
        };

        shape.smallest_size = stream.read_f32()?;
        shape.smallest_detail_level = stream.read32()?;
        stream.guard_at(0)?;

        shape.radius = stream.read_f32()?;
        shape.radius_tube = stream.read_f32()?;
        shape.center = stream.read_vec3()?;
        shape.bounds = stream.read_box()?;
        stream.guard_at(1)?;

        shape.nodes = stream.read_vec(c.nodes, Node::read)?;
        stream.guard_at(2)?;
        shape.objects = stream.read_vec(c.objects, Object::read)?;
        stream.guard_at(3)?;
        // Decal records carry no data.
        shape.decals = vec![Decal; c.decals];
        stream.guard_at(4)?;
        shape.ifl_materials = stream.read_vec(c.ifl_materials, IflMaterial::read)?;
        stream.guard_at(5)?;

        shape.subshapes = read_subshapes(stream, c.subshapes)?;

        if version < MESH_INDEX_LIST_BEFORE {
            let n = stream.read_len()?;
            for _ in 0..n {
                stream.read32()?;
            }
            trace!(n, "skipped mesh index list");
        }

        for _ in 0..c.nodes {
            shape.default_rotations.push(stream.read_quat()?);
            shape.default_translations.push(stream.read_vec3()?);
        }

        shape.node_translations = stream.read_vec(c.translations, IStream::read_vec3)?;
        shape.node_rotations = stream.read_vec(c.rotations, IStream::read_quat)?;
        stream.guard_at(8)?;

        if has_scales(version) {
            shape.node_uniform_scales = stream.read_vec(c.uniform_scales, IStream::read_f32)?;
            shape.node_aligned_scales = stream.read_vec(c.aligned_scales, IStream::read_vec3)?;
            shape.node_arbitrary_scale_factors =
                stream.read_vec(c.arbitrary_scales, IStream::read_vec3)?;
            shape.node_arbitrary_scale_rots =
                stream.read_vec(c.arbitrary_scales, IStream::read_quat)?;
            stream.guard()?;
        }

        if has_ground_frames(version) {
            shape.ground_translations = stream.read_vec(c.ground_frames, IStream::read_vec3)?;
            shape.ground_rotations = stream.read_vec(c.ground_frames, IStream::read_quat)?;
            stream.guard()?;
        }

        shape.object_states = stream.read_vec(c.object_states, ObjectState::read)?;
        stream.guard()?;
        shape.decal_states = stream.read_vec(c.decal_states, IStream::read32)?;
        stream.guard()?;
        shape.triggers = stream.read_vec(c.triggers, Trigger::read)?;
        stream.guard()?;
        shape.detail_levels = stream.read_vec(c.detail_levels, DetailLevel::read)?;
        stream.guard()?;
        shape.meshes = stream.read_vec(c.meshes, Mesh::read)?;
        stream.guard()?;
        let names = stream.read_vec(c.names, IStream::read_string)?;
        shape.names = NamePool::from_names(names);
        stream.guard()?;

        if version >= ALPHA_AND_WIDE_NAMES_SINCE {
            shape.alpha_in = stream.read_vec(c.detail_levels, IStream::read32)?;
            shape.alpha_out = stream.read_vec(c.detail_levels, IStream::read32)?;
        }

        let (left32, left16, left8) = stream.remaining();
        if left32 > 0 || left16 > 1 || left8 > 3 {
            debug!(left32, left16, left8, "unread tri-buffer data");
        }
        Ok(shape)
    }
}

/// Subshapes are stored column by column: first indices, then counts.
fn read_subshapes(stream: &mut IStream, n: usize) -> Result<Vec<Subshape>> {
    let first_nodes = stream.read_vec(n, IStream::read32)?;
    let first_objects = stream.read_vec(n, IStream::read32)?;
    let first_decals = stream.read_vec(n, IStream::read32)?;
    stream.guard_at(6)?;
    let num_nodes = stream.read_vec(n, IStream::read32)?;
    let num_objects = stream.read_vec(n, IStream::read32)?;
    let num_decals = stream.read_vec(n, IStream::read32)?;
    stream.guard_at(7)?;

    let subshapes = (0..n)
        .map(|i| Subshape {
            first_node: first_nodes[i],
            first_object: first_objects[i],
            first_decal: first_decals[i],
            num_nodes: num_nodes[i],
            num_objects: num_objects[i],
            num_decals: num_decals[i],
        })
        .collect();
    Ok(subshapes)
}

fn read_sequences<R: Read>(r: &mut R) -> Result<Vec<Sequence>> {
    let n = plain::read_len(r)?;
    trace!(n, "sequences");
    plain::read_vec(r, n, |r| Sequence::read(r, true))
}

/// Material list: a tag byte, a count, then one column per field.
fn read_materials<R: Read>(r: &mut R, version: i32) -> Result<Vec<Material>> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag)?;
    if tag[0] as i8 != MATERIAL_LIST_TAG {
        return Err(Error::corrupt(format!("material list tag {} (expected {})", tag[0] as i8, MATERIAL_LIST_TAG)));
    }

    let n = plain::read_len(r)?;
    trace!(n, "materials");
    let names = if version >= ALPHA_AND_WIDE_NAMES_SINCE {
        plain::read_vec(r, n, plain::read_string32)?
    } else {
        plain::read_vec(r, n, plain::read_string8)?
    };

    let mut materials: Vec<Material> = names
        .into_iter()
        .map(|name| Material { name, ..Default::default() })
        .collect();

    for m in materials.iter_mut() {
        m.flags = plain::read_u32(r)?;
    }
    for m in materials.iter_mut() {
        m.reflectance_map = plain::read_i32(r)?;
    }
    for m in materials.iter_mut() {
        m.bump_map = plain::read_i32(r)?;
    }
    for m in materials.iter_mut() {
        m.detail_map = plain::read_i32(r)?;
    }
    if version == MATERIAL_PADDING_VERSION {
        for _ in 0..n {
            plain::read_i32(r)?;
        }
    }
    for m in materials.iter_mut() {
        m.detail_scale = plain::read_f32(r)?;
    }
    for m in materials.iter_mut() {
        m.reflectance = plain::read_f32(r)?;
    }
    Ok(materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{OStream, HEADER_SIZE};

    /// Tri-buffer body with no entities at all.
    fn empty_body(version: i32) -> OStream {
        let mut s = OStream::new(version);
        for _ in 0..5 {
            s.write32(0); // nodes, objects, decals, subshapes, ifls
        }
        if version < SPLIT_COUNTS_SINCE {
            s.write32(0);
        } else {
            for _ in 0..5 {
                s.write32(0);
            }
        }
        if has_ground_frames(version) {
            s.write32(0);
        }
        for _ in 0..5 {
            s.write32(0); // states, decal states, triggers, detail levels, meshes
        }
        if version < NO_LEGACY_FIELD_SINCE {
            s.write32(0);
        }
        s.write32(0); // names
        s.write_f32(0.0);
        s.write32(0);
        s.guard();
        s.write_f32(0.0);
        s.write_f32(0.0);
        s.write_vec3(Default::default());
        s.write_box(&Default::default());
        for _ in 0..6 {
            s.guard();
        }
        if version < MESH_INDEX_LIST_BEFORE {
            s.write32(0);
        }
        s.guard();
        if has_scales(version) {
            s.guard();
        }
        if has_ground_frames(version) {
            s.guard();
        }
        for _ in 0..6 {
            s.guard();
        }
        s
    }

    fn with_tail(stream: OStream, tag: u8) -> Vec<u8> {
        let mut bytes = stream.into_bytes().unwrap();
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.push(tag);
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes
    }

    #[test]
    fn test_empty_shape_versions() -> Result<()> {
        for version in [15, 21, 22, 23, 24, 25, 26] {
            let shape = Shape::load(&with_tail(empty_body(version), 1))?;
            assert_eq!(shape.version, version);
            assert!(shape.nodes.is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_bad_material_tag() {
        let err = Shape::load(&with_tail(empty_body(24), 2)).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
    }

    #[test]
    fn test_missing_tail() {
        let bytes = empty_body(24).into_bytes().unwrap();
        assert!(matches!(Shape::load(&bytes), Err(Error::UnexpectedEndOfData(_))));
    }

    #[test]
    fn test_combined_count_below_nodes() {
        let mut s = OStream::new(20);
        s.write32(3); // nodes
        for _ in 0..4 {
            s.write32(0);
        }
        s.write32(1); // combined count smaller than node count
        let bytes = with_tail(s, 1);
        assert!(matches!(Shape::load(&bytes), Err(Error::CorruptData(_))));
    }

    /// Empty v24 file with one header count replaced.
    fn with_count(slot: usize, value: i32) -> Vec<u8> {
        let mut bytes = with_tail(empty_body(24), 1);
        let at = HEADER_SIZE + slot * 4;
        bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
        bytes
    }

    #[test]
    fn test_huge_subshape_count() {
        let bytes = with_count(3, i32::MAX);
        assert!(matches!(Shape::load(&bytes), Err(Error::UnexpectedEndOfData(_))));
    }

    #[test]
    fn test_counts_beyond_data() {
        // nodes, objects, subshapes, ifl materials, rotations, translations,
        // object states, triggers, detail levels
        for slot in [0, 1, 3, 4, 5, 6, 11, 13, 14] {
            for value in [64, i32::MAX] {
                let err = Shape::load(&with_count(slot, value)).unwrap_err();
                assert!(
                    matches!(err, Error::UnexpectedEndOfData(_)),
                    "count {} = {}: {}",
                    slot,
                    value,
                    err
                );
            }
        }
    }

    #[test]
    fn test_guard_mismatch() {
        let mut s = OStream::new(24);
        for _ in 0..17 {
            s.write32(0);
        }
        s.write_f32(0.0);
        s.write32(0);
        s.write32(5); // bogus guard in the 32-bit channel
        s.write16(0);
        s.write8(0);
        assert!(matches!(Shape::load(&with_tail(s, 1)), Err(Error::CorruptData(_))));
    }
}
