//! Math type re-exports and DTS-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the box type and
//! the 16-bit quaternion quantization used by the shape format.

pub use glam::{Mat4, Quat, Vec2, Vec3};

use bytemuck::{Pod, Zeroable};
use std::fmt;

use super::{Error, Result};

/// Fixed-point scale for quantized quaternion components.
pub const QUAT_SCALE: f32 = 32767.0;

/// Axis-aligned bounding box, stored on disk as min then max.
#[derive(Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Box3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Box3 {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

impl fmt::Debug for Box3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Box3({:?} - {:?})", self.min, self.max)
    }
}

/// Quantize a quaternion to the on-disk `[x, y, z, w]` 16-bit layout.
///
/// x, y and z are scaled by 32767, w by -32767. Components that land outside
/// the signed 16-bit range (non-unit input) fail with `RangeError`.
pub fn quantize_quat(q: Quat) -> Result<[i16; 4]> {
    let quantize = |v: f32, scale: f32| -> Result<i16> {
        let scaled = (v * scale).round();
        if !(i16::MIN as f32..=i16::MAX as f32).contains(&scaled) {
            return Err(Error::range(scaled as i64, 16));
        }
        Ok(scaled as i16)
    };
    Ok([
        quantize(q.x, QUAT_SCALE)?,
        quantize(q.y, QUAT_SCALE)?,
        quantize(q.z, QUAT_SCALE)?,
        quantize(q.w, -QUAT_SCALE)?,
    ])
}

/// Reverse [`quantize_quat`]. The result is not renormalized.
#[inline]
pub fn dequantize_quat(raw: [i16; 4]) -> Quat {
    Quat::from_xyzw(
        raw[0] as f32 / QUAT_SCALE,
        raw[1] as f32 / QUAT_SCALE,
        raw[2] as f32 / QUAT_SCALE,
        raw[3] as f32 / -QUAT_SCALE,
    )
}
