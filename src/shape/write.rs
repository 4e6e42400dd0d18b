//! Shape saving.

use std::io::Write;
use std::path::Path;

use byteorder::WriteBytesExt;
use tracing::debug;

use crate::stream::{
    has_ground_frames, has_scales, plain, OStream, ALPHA_AND_WIDE_NAMES_SINCE, GROUND_FRAMES_SINCE,
    MATERIAL_LIST_TAG, MATERIAL_PADDING_VERSION, MESH_INDEX_LIST_BEFORE, NO_LEGACY_FIELD_SINCE,
    SPLIT_COUNTS_SINCE,
};
use crate::util::{file, Error, Result};

use super::Shape;

impl Shape {
    /// Serialize for format `version`.
    pub fn to_bytes(&self, version: i32) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out, version)?;
        Ok(out)
    }

    /// Save to `path` for format `version`.
    ///
    /// The file is written next to `path` and renamed into place, so a
    /// failed save leaves any existing file intact.
    #[tracing::instrument(skip_all, fields(version = version))]
    pub fn save(&self, path: impl AsRef<Path>, version: i32) -> Result<()> {
        file::write_atomic(path.as_ref(), |w| self.write_to(w, version))
    }

    /// Write the tri-buffer, sequences and materials to `w`.
    ///
    /// Fails with `UnsupportedFeature` if the shape carries data `version`
    /// cannot hold, and with `CorruptData` if parallel arrays disagree.
    #[tracing::instrument(skip_all, fields(version = version))]
    pub fn write_to<W: Write>(&self, w: &mut W, version: i32) -> Result<()> {
        let stream = self.write_body(version)?;
        let (n32, n16, n8) = stream.lens();
        stream.finish(w)?;

        plain::write_len(w, self.sequences.len())?;
        for seq in &self.sequences {
            seq.write(w, true)?;
        }
        self.write_materials(w, version)?;

        debug!(version, n32, n16, n8, sequences = self.sequences.len(), "wrote shape");
        Ok(())
    }

    fn check_lengths(&self, version: i32) -> Result<()> {
        if self.default_rotations.len() != self.nodes.len()
            || self.default_translations.len() != self.nodes.len()
        {
            return Err(Error::corrupt(format!(
                "{} nodes but {} default rotations and {} default translations",
                self.nodes.len(),
                self.default_rotations.len(),
                self.default_translations.len()
            )));
        }
        if self.node_arbitrary_scale_factors.len() != self.node_arbitrary_scale_rots.len() {
            return Err(Error::corrupt("arbitrary scale factors and rotations differ in length"));
        }
        if self.ground_translations.len() != self.ground_rotations.len() {
            return Err(Error::corrupt("ground translations and rotations differ in length"));
        }

        if !has_scales(version) {
            if self.node_rotations.len() != self.node_translations.len() {
                return Err(Error::corrupt(format!(
                    "version {} needs equal animated rotation and translation counts, got {} and {}",
                    version,
                    self.node_rotations.len(),
                    self.node_translations.len()
                )));
            }
            if !self.node_uniform_scales.is_empty()
                || !self.node_aligned_scales.is_empty()
                || !self.node_arbitrary_scale_factors.is_empty()
            {
                return Err(Error::unsupported(format!(
                    "scale keyframes need version {} or later",
                    SPLIT_COUNTS_SINCE
                )));
            }
        }
        if !has_ground_frames(version) && !self.ground_translations.is_empty() {
            return Err(Error::unsupported(format!(
                "ground frames need version {} or later",
                GROUND_FRAMES_SINCE
            )));
        }
        Ok(())
    }

    fn write_counts(&self, s: &mut OStream) -> Result<()> {
        let version = s.version();
        s.write_len(self.nodes.len())?;
        s.write_len(self.objects.len())?;
        s.write_len(self.decals.len())?;
        s.write_len(self.subshapes.len())?;
        s.write_len(self.ifl_materials.len())?;

        if version < SPLIT_COUNTS_SINCE {
            s.write_len(self.node_rotations.len() + self.nodes.len())?;
        } else {
            s.write_len(self.node_rotations.len())?;
            s.write_len(self.node_translations.len())?;
            s.write_len(self.node_uniform_scales.len())?;
            s.write_len(self.node_aligned_scales.len())?;
            s.write_len(self.node_arbitrary_scale_factors.len())?;
        }

        if has_ground_frames(version) {
            s.write_len(self.ground_translations.len())?;
        }

        s.write_len(self.object_states.len())?;
        s.write_len(self.decal_states.len())?;
        s.write_len(self.triggers.len())?;
        s.write_len(self.detail_levels.len())?;
        s.write_len(self.meshes.len())?;

        if version < NO_LEGACY_FIELD_SINCE {
            s.write32(0);
        }

        s.write_len(self.names.len())
    }

    fn write_body(&self, version: i32) -> Result<OStream> {
        self.check_lengths(version)?;

        let mut s = OStream::with_exporter(version, self.exporter_version);
        self.write_counts(&mut s)?;
        s.write_f32(self.smallest_size);
        s.write32(self.smallest_detail_level);
        s.guard_at(0)?;

        s.write_f32(self.radius);
        s.write_f32(self.radius_tube);
        s.write_vec3(self.center);
        s.write_box(&self.bounds);
        s.guard_at(1)?;

        for node in &self.nodes {
            node.write(&mut s);
        }
        s.guard_at(2)?;
        for obj in &self.objects {
            obj.write(&mut s);
        }
        s.guard_at(3)?;
        s.guard_at(4)?;
        for ifl in &self.ifl_materials {
            ifl.write(&mut s);
        }
        s.guard_at(5)?;

        self.write_subshapes(&mut s)?;

        if version < MESH_INDEX_LIST_BEFORE {
            s.write32(0);
        }

        for (rot, trans) in self.default_rotations.iter().zip(&self.default_translations) {
            s.write_quat(*rot)?;
            s.write_vec3(*trans);
        }

        for t in &self.node_translations {
            s.write_vec3(*t);
        }
        for r in &self.node_rotations {
            s.write_quat(*r)?;
        }
        s.guard_at(8)?;

        if has_scales(version) {
            for v in &self.node_uniform_scales {
                s.write_f32(*v);
            }
            for v in &self.node_aligned_scales {
                s.write_vec3(*v);
            }
            for v in &self.node_arbitrary_scale_factors {
                s.write_vec3(*v);
            }
            for q in &self.node_arbitrary_scale_rots {
                s.write_quat(*q)?;
            }
            s.guard();
        }

        if has_ground_frames(version) {
            for t in &self.ground_translations {
                s.write_vec3(*t);
            }
            for q in &self.ground_rotations {
                s.write_quat(*q)?;
            }
            s.guard();
        }

        for state in &self.object_states {
            state.write(&mut s);
        }
        s.guard();
        for state in &self.decal_states {
            s.write32(*state);
        }
        s.guard();
        for trigger in &self.triggers {
            trigger.write(&mut s);
        }
        s.guard();
        for dl in &self.detail_levels {
            dl.write(&mut s);
        }
        s.guard();
        for mesh in &self.meshes {
            mesh.write(&mut s)?;
        }
        s.guard();
        for name in self.names.iter() {
            s.write_string(name)?;
        }
        s.guard();

        if version >= ALPHA_AND_WIDE_NAMES_SINCE {
            for alpha in [&self.alpha_in, &self.alpha_out] {
                for i in 0..self.detail_levels.len() {
                    s.write32(alpha.get(i).copied().unwrap_or(0));
                }
            }
        }

        Ok(s)
    }

    fn write_subshapes(&self, s: &mut OStream) -> Result<()> {
        let subs = &self.subshapes;
        subs.iter().for_each(|x| s.write32(x.first_node));
        subs.iter().for_each(|x| s.write32(x.first_object));
        subs.iter().for_each(|x| s.write32(x.first_decal));
        s.guard_at(6)?;
        subs.iter().for_each(|x| s.write32(x.num_nodes));
        subs.iter().for_each(|x| s.write32(x.num_objects));
        subs.iter().for_each(|x| s.write32(x.num_decals));
        s.guard_at(7)
    }

    fn write_materials<W: Write>(&self, w: &mut W, version: i32) -> Result<()> {
        let materials = &self.materials;
        w.write_i8(MATERIAL_LIST_TAG)?;
        plain::write_len(w, materials.len())?;

        for m in materials {
            if version >= ALPHA_AND_WIDE_NAMES_SINCE {
                plain::write_string32(w, &m.name)?;
            } else {
                plain::write_string8(w, &m.name)?;
            }
        }
        for m in materials {
            plain::write_u32(w, m.flags)?;
        }
        for m in materials {
            plain::write_i32(w, m.reflectance_map)?;
        }
        for m in materials {
            plain::write_i32(w, m.bump_map)?;
        }
        for m in materials {
            plain::write_i32(w, m.detail_map)?;
        }
        if version == MATERIAL_PADDING_VERSION {
            for _ in materials {
                plain::write_i32(w, 0)?;
            }
        }
        for m in materials {
            plain::write_f32(w, m.detail_scale)?;
        }
        for m in materials {
            plain::write_f32(w, m.reflectance)?;
        }
        Ok(())
    }
}
