//! Animation sequences.
//!
//! A sequence addresses the shape's keyframe arrays through base offsets.
//! For the `k`-th animated node (in matters order) and frame `f`, the
//! keyframe lives at `base + k * num_keyframes + f`.

use std::io::{Read, Write};

use crate::stream::plain;
use crate::util::Result;

use super::bitset::{read_bit_set, set_indices, write_bit_set};

/// How a sequence animates node scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleMode {
    None,
    Uniform,
    Aligned,
    Arbitrary,
}

/// An animation sequence record.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    /// Index into the name pool. Unused in sequence files.
    pub name: i32,
    pub flags: u32,
    pub num_keyframes: i32,
    /// Length in seconds.
    pub duration: f32,
    pub priority: i32,
    pub first_ground_frame: i32,
    pub num_ground_frames: i32,
    pub base_rotation: i32,
    pub base_translation: i32,
    pub base_scale: i32,
    pub base_object_state: i32,
    pub base_decal_state: i32,
    pub first_trigger: i32,
    pub num_triggers: i32,
    pub tool_begin: f32,

    pub rotation_matters: Vec<bool>,
    pub translation_matters: Vec<bool>,
    pub scale_matters: Vec<bool>,
    pub decal_matters: Vec<bool>,
    pub ifl_matters: Vec<bool>,
    pub vis_matters: Vec<bool>,
    pub frame_matters: Vec<bool>,
    pub mat_frame_matters: Vec<bool>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            name: -1,
            flags: 0,
            num_keyframes: 0,
            duration: 0.0,
            priority: 0,
            first_ground_frame: 0,
            num_ground_frames: 0,
            base_rotation: 0,
            base_translation: 0,
            base_scale: 0,
            base_object_state: 0,
            base_decal_state: 0,
            first_trigger: 0,
            num_triggers: 0,
            tool_begin: 0.0,
            rotation_matters: Vec::new(),
            translation_matters: Vec::new(),
            scale_matters: Vec::new(),
            decal_matters: Vec::new(),
            ifl_matters: Vec::new(),
            vis_matters: Vec::new(),
            frame_matters: Vec::new(),
            mat_frame_matters: Vec::new(),
        }
    }
}

impl Sequence {
    pub const UNIFORM_SCALE: u32 = 1 << 0;
    pub const ALIGNED_SCALE: u32 = 1 << 1;
    pub const ARBITRARY_SCALE: u32 = 1 << 2;
    pub const BLEND: u32 = 1 << 3;
    pub const CYCLIC: u32 = 1 << 4;
    pub const MAKE_PATH: u32 = 1 << 5;
    pub const IFL_INIT: u32 = 1 << 6;
    pub const HAS_TRANSLUCENCY: u32 = 1 << 7;

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn is_cyclic(&self) -> bool {
        self.has_flag(Self::CYCLIC)
    }

    #[inline]
    pub fn is_blend(&self) -> bool {
        self.has_flag(Self::BLEND)
    }

    /// Scale encoding. Uniform wins over aligned, aligned over arbitrary.
    pub fn scale_mode(&self) -> ScaleMode {
        if self.has_flag(Self::UNIFORM_SCALE) {
            ScaleMode::Uniform
        } else if self.has_flag(Self::ALIGNED_SCALE) {
            ScaleMode::Aligned
        } else if self.has_flag(Self::ARBITRARY_SCALE) {
            ScaleMode::Arbitrary
        } else {
            ScaleMode::None
        }
    }

    /// Offset into a keyframe array for the `matters_index`-th animated
    /// entity at `frame`.
    pub fn keyframe_index(&self, base: i32, matters_index: usize, frame: usize) -> usize {
        base.max(0) as usize + matters_index * self.num_keyframes.max(0) as usize + frame
    }

    /// Nodes with animated rotation, truncated to `num_nodes`.
    pub fn rotation_nodes(&self, num_nodes: usize) -> Vec<usize> {
        set_indices(&self.rotation_matters, num_nodes)
    }

    /// Nodes with animated translation, truncated to `num_nodes`.
    pub fn translation_nodes(&self, num_nodes: usize) -> Vec<usize> {
        set_indices(&self.translation_matters, num_nodes)
    }

    /// Nodes with animated scale, truncated to `num_nodes`.
    pub fn scale_nodes(&self, num_nodes: usize) -> Vec<usize> {
        set_indices(&self.scale_matters, num_nodes)
    }

    /// Read a record. `with_name` is false in sequence files.
    pub fn read<R: Read>(r: &mut R, with_name: bool) -> Result<Self> {
        let name = if with_name { plain::read_i32(r)? } else { -1 };
        Ok(Self {
            name,
            flags: plain::read_u32(r)?,
            num_keyframes: plain::read_i32(r)?,
            duration: plain::read_f32(r)?,
            priority: plain::read_i32(r)?,
            first_ground_frame: plain::read_i32(r)?,
            num_ground_frames: plain::read_i32(r)?,
            base_rotation: plain::read_i32(r)?,
            base_translation: plain::read_i32(r)?,
            base_scale: plain::read_i32(r)?,
            base_object_state: plain::read_i32(r)?,
            base_decal_state: plain::read_i32(r)?,
            first_trigger: plain::read_i32(r)?,
            num_triggers: plain::read_i32(r)?,
            tool_begin: plain::read_f32(r)?,
            rotation_matters: read_bit_set(r)?,
            translation_matters: read_bit_set(r)?,
            scale_matters: read_bit_set(r)?,
            decal_matters: read_bit_set(r)?,
            ifl_matters: read_bit_set(r)?,
            vis_matters: read_bit_set(r)?,
            frame_matters: read_bit_set(r)?,
            mat_frame_matters: read_bit_set(r)?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W, with_name: bool) -> Result<()> {
        if with_name {
            plain::write_i32(w, self.name)?;
        }
        plain::write_u32(w, self.flags)?;
        plain::write_i32(w, self.num_keyframes)?;
        plain::write_f32(w, self.duration)?;
        plain::write_i32(w, self.priority)?;
        plain::write_i32(w, self.first_ground_frame)?;
        plain::write_i32(w, self.num_ground_frames)?;
        plain::write_i32(w, self.base_rotation)?;
        plain::write_i32(w, self.base_translation)?;
        plain::write_i32(w, self.base_scale)?;
        plain::write_i32(w, self.base_object_state)?;
        plain::write_i32(w, self.base_decal_state)?;
        plain::write_i32(w, self.first_trigger)?;
        plain::write_i32(w, self.num_triggers)?;
        plain::write_f32(w, self.tool_begin)?;

        write_bit_set(w, &self.rotation_matters)?;
        write_bit_set(w, &self.translation_matters)?;
        write_bit_set(w, &self.scale_matters)?;
        write_bit_set(w, &self.decal_matters)?;
        write_bit_set(w, &self.ifl_matters)?;
        write_bit_set(w, &self.vis_matters)?;
        write_bit_set(w, &self.frame_matters)?;
        write_bit_set(w, &self.mat_frame_matters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk() -> Sequence {
        let mut rotation = vec![false; 32];
        rotation[0] = true;
        rotation[2] = true;
        Sequence {
            name: 3,
            flags: Sequence::CYCLIC | Sequence::ALIGNED_SCALE,
            num_keyframes: 4,
            duration: 1.25,
            priority: 2,
            base_rotation: 8,
            rotation_matters: rotation,
            translation_matters: vec![false; 32],
            ..Default::default()
        }
    }

    #[test]
    fn test_record_size() -> Result<()> {
        let mut with = Vec::new();
        walk().write(&mut with, true)?;
        let mut without = Vec::new();
        walk().write(&mut without, false)?;
        assert_eq!(with.len(), without.len() + 4);
        // 15 fixed fields, two one-word bitsets, six empty ones
        assert_eq!(with.len(), 15 * 4 + 2 * 12 + 6 * 8);
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let seq = walk();
        let mut buf = Vec::new();
        seq.write(&mut buf, true)?;
        assert_eq!(Sequence::read(&mut buf.as_slice(), true)?, seq);

        let mut buf = Vec::new();
        seq.write(&mut buf, false)?;
        let back = Sequence::read(&mut buf.as_slice(), false)?;
        assert_eq!(back.name, -1);
        assert_eq!(back.rotation_matters, seq.rotation_matters);
        Ok(())
    }

    #[test]
    fn test_flags_and_indexing() {
        let seq = walk();
        assert!(seq.is_cyclic());
        assert!(!seq.is_blend());
        assert_eq!(seq.scale_mode(), ScaleMode::Aligned);
        assert_eq!(seq.rotation_nodes(3), vec![0, 2]);
        // second animated node, third frame
        assert_eq!(seq.keyframe_index(seq.base_rotation, 1, 2), 8 + 4 + 2);
    }
}
