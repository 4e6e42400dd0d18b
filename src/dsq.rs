//! Sequence files.
//!
//! A sequence file carries animation for a shape without geometry: node
//! names, keyframe arrays and sequence records. Everything is stored as a
//! flat little-endian record stream; there is no tri-buffer and no guards.
//! Sequence base offsets index into the file's own keyframe arrays.
//!
//! ```text
//! version                    i32
//! node names                 count, then 1-byte prefixed strings
//! legacy object count        i32, always 0
//! rotations / translations   count + quats, count + vec3s
//! scales        (v > 21)     uniform, aligned, arbitrary factors + quats
//! ground frames (v > 23)     count + vec3s, then quats
//! sequences                  count, then name + record
//! triggers                   count, then (state u32, pos f32)
//! ```

use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::stream::{
    has_ground_frames, has_scales, plain, DEFAULT_VERSION, GROUND_FRAMES_SINCE, SPLIT_COUNTS_SINCE,
};
use crate::types::{Sequence, Trigger};
use crate::util::{file, Error, Quat, Result, Vec3};

/// A sequence with its name stored inline.
#[derive(Clone, Debug, PartialEq)]
pub struct DsqSequence {
    pub name: String,
    /// Record fields; `sequence.name` is unused here.
    pub sequence: Sequence,
}

/// Contents of a sequence file.
#[derive(Clone, Debug, PartialEq)]
pub struct DsqFile {
    pub version: i32,
    /// Animated node names, matched to shape nodes by name.
    pub nodes: Vec<String>,
    pub rotations: Vec<Quat>,
    pub translations: Vec<Vec3>,
    pub uniform_scales: Vec<f32>,
    pub aligned_scales: Vec<Vec3>,
    pub arbitrary_scale_factors: Vec<Vec3>,
    pub arbitrary_scale_rots: Vec<Quat>,
    pub ground_translations: Vec<Vec3>,
    pub ground_rotations: Vec<Quat>,
    pub sequences: Vec<DsqSequence>,
    pub triggers: Vec<Trigger>,
}

impl Default for DsqFile {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            nodes: Vec::new(),
            rotations: Vec::new(),
            translations: Vec::new(),
            uniform_scales: Vec::new(),
            aligned_scales: Vec::new(),
            arbitrary_scale_factors: Vec::new(),
            arbitrary_scale_rots: Vec::new(),
            ground_translations: Vec::new(),
            ground_rotations: Vec::new(),
            sequences: Vec::new(),
            triggers: Vec::new(),
        }
    }
}

impl DsqFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence called `name`, compared case-insensitively.
    pub fn find_sequence(&self, name: &str) -> Option<&DsqSequence> {
        self.sequences.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Load from an in-memory file image.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        Self::read_from(&mut cursor)
    }

    /// Load from a memory-mapped file.
    #[tracing::instrument(skip_all)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let map = file::map_file(path.as_ref())?;
        Self::load(&map)
    }

    #[tracing::instrument(skip_all)]
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let version = plain::read_i32(r)?;
        let mut dsq = DsqFile { version, ..Default::default() };

        let n = plain::read_len(r)?;
        dsq.nodes = plain::read_vec(r, n, plain::read_string8)?;
        let _legacy_objects = plain::read_i32(r)?;

        let n = plain::read_len(r)?;
        dsq.rotations = plain::read_vec(r, n, plain::read_quat)?;
        let n = plain::read_len(r)?;
        dsq.translations = plain::read_vec(r, n, plain::read_vec3)?;

        if has_scales(version) {
            let n = plain::read_len(r)?;
            dsq.uniform_scales = plain::read_vec(r, n, plain::read_f32)?;
            let n = plain::read_len(r)?;
            dsq.aligned_scales = plain::read_vec(r, n, plain::read_vec3)?;
            let n = plain::read_len(r)?;
            dsq.arbitrary_scale_factors = plain::read_vec(r, n, plain::read_vec3)?;
            dsq.arbitrary_scale_rots = plain::read_vec(r, n, plain::read_quat)?;
        }

        if has_ground_frames(version) {
            let n = plain::read_len(r)?;
            dsq.ground_translations = plain::read_vec(r, n, plain::read_vec3)?;
            dsq.ground_rotations = plain::read_vec(r, n, plain::read_quat)?;
        }

        let n = plain::read_len(r)?;
        trace!(n, "sequences");
        dsq.sequences = plain::read_vec(r, n, |r| {
            let name = plain::read_string8(r)?;
            let sequence = Sequence::read(r, false)?;
            Ok(DsqSequence { name, sequence })
        })?;

        let n = plain::read_len(r)?;
        dsq.triggers = plain::read_vec(r, n, |r| {
            Ok(Trigger { state: plain::read_u32(r)?, pos: plain::read_f32(r)? })
        })?;

        debug!(
            version,
            nodes = dsq.nodes.len(),
            sequences = dsq.sequences.len(),
            "loaded sequence file"
        );
        Ok(dsq)
    }

    /// Serialize using `self.version`.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Save to `path` through a temporary file.
    #[tracing::instrument(skip_all)]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        file::write_atomic(path.as_ref(), |w| self.write_to(w))
    }

    #[tracing::instrument(skip_all, fields(version = self.version))]
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let version = self.version;
        self.check_lengths()?;

        plain::write_i32(w, version)?;
        plain::write_len(w, self.nodes.len())?;
        for name in &self.nodes {
            plain::write_string8(w, name)?;
        }
        plain::write_i32(w, 0)?;

        plain::write_len(w, self.rotations.len())?;
        for q in &self.rotations {
            plain::write_quat(w, *q)?;
        }
        plain::write_len(w, self.translations.len())?;
        for v in &self.translations {
            plain::write_vec3(w, *v)?;
        }

        if has_scales(version) {
            plain::write_len(w, self.uniform_scales.len())?;
            for s in &self.uniform_scales {
                plain::write_f32(w, *s)?;
            }
            plain::write_len(w, self.aligned_scales.len())?;
            for v in &self.aligned_scales {
                plain::write_vec3(w, *v)?;
            }
            plain::write_len(w, self.arbitrary_scale_factors.len())?;
            for v in &self.arbitrary_scale_factors {
                plain::write_vec3(w, *v)?;
            }
            for q in &self.arbitrary_scale_rots {
                plain::write_quat(w, *q)?;
            }
        }

        if has_ground_frames(version) {
            plain::write_len(w, self.ground_translations.len())?;
            for v in &self.ground_translations {
                plain::write_vec3(w, *v)?;
            }
            for q in &self.ground_rotations {
                plain::write_quat(w, *q)?;
            }
        }

        plain::write_len(w, self.sequences.len())?;
        for seq in &self.sequences {
            plain::write_string8(w, &seq.name)?;
            seq.sequence.write(w, false)?;
        }

        plain::write_len(w, self.triggers.len())?;
        for t in &self.triggers {
            plain::write_u32(w, t.state)?;
            plain::write_f32(w, t.pos)?;
        }

        debug!(version, sequences = self.sequences.len(), "wrote sequence file");
        Ok(())
    }

    fn check_lengths(&self) -> Result<()> {
        if self.arbitrary_scale_factors.len() != self.arbitrary_scale_rots.len() {
            return Err(Error::corrupt("arbitrary scale factors and rotations differ in length"));
        }
        if self.ground_translations.len() != self.ground_rotations.len() {
            return Err(Error::corrupt("ground translations and rotations differ in length"));
        }
        let has_scale_data = !self.uniform_scales.is_empty()
            || !self.aligned_scales.is_empty()
            || !self.arbitrary_scale_factors.is_empty();
        if !has_scales(self.version) && has_scale_data {
            return Err(Error::unsupported(format!(
                "scale keyframes need version {} or later",
                SPLIT_COUNTS_SINCE
            )));
        }
        if !has_ground_frames(self.version) && !self.ground_translations.is_empty() {
            return Err(Error::unsupported(format!(
                "ground frames need version {} or later",
                GROUND_FRAMES_SINCE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(version: i32) -> DsqFile {
        let mut rotation = vec![false; 32];
        rotation[1] = true;
        DsqFile {
            version,
            nodes: vec!["Bip01".into(), "Bip01 Spine".into()],
            rotations: vec![Quat::IDENTITY, Quat::IDENTITY],
            translations: vec![Vec3::new(0.0, 0.0, 1.5)],
            sequences: vec![DsqSequence {
                name: "walk".into(),
                sequence: Sequence {
                    flags: Sequence::CYCLIC,
                    num_keyframes: 2,
                    duration: 0.5,
                    rotation_matters: rotation,
                    ..Default::default()
                },
            }],
            triggers: vec![Trigger::new(1, true, false, 0.25)],
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        for version in [21, 22, 24, 26] {
            let dsq = sample(version);
            let back = DsqFile::load(&dsq.to_bytes()?)?;
            assert_eq!(back, dsq);
        }
        Ok(())
    }

    #[test]
    fn test_header_layout() -> Result<()> {
        let bytes = sample(24).to_bytes()?;
        assert_eq!(&bytes[0..4], &24i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());
        assert_eq!(bytes[8], 5);
        assert_eq!(&bytes[9..14], b"Bip01");
        Ok(())
    }

    #[test]
    fn test_old_version_omits_scales() -> Result<()> {
        let v21 = sample(21).to_bytes()?.len();
        let v22 = sample(22).to_bytes()?.len();
        let v24 = sample(24).to_bytes()?.len();
        assert_eq!(v22, v21 + 12);
        assert_eq!(v24, v22 + 4);
        Ok(())
    }

    #[test]
    fn test_scales_rejected_before_22() {
        let mut dsq = sample(21);
        dsq.uniform_scales.push(1.0);
        assert!(matches!(dsq.to_bytes(), Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_truncated() {
        let bytes = sample(24).to_bytes().unwrap();
        let err = DsqFile::load(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfData(_)));
    }

    #[test]
    fn test_find_sequence() {
        let dsq = sample(24);
        assert!(dsq.find_sequence("WALK").is_some());
        assert!(dsq.find_sequence("run").is_none());
    }
}
