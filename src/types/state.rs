//! Per-keyframe object state, triggers and detail levels.

use crate::stream::{IStream, OStream};
use crate::util::Result;

/// Animated object state for one keyframe.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectState {
    /// Visibility, 0..1.
    pub vis: f32,
    /// Vertex-animation frame.
    pub frame: i32,
    /// Material (texture) frame.
    pub mat_frame: i32,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self { vis: 1.0, frame: 0, mat_frame: 0 }
    }
}

impl ObjectState {
    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self {
            vis: stream.read_f32()?,
            frame: stream.read32()?,
            mat_frame: stream.read32()?,
        })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write_f32(self.vis);
        stream.write32(self.frame);
        stream.write32(self.mat_frame);
    }
}

/// A timeline event: a state word and a normalized position.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    pub state: u32,
    pub pos: f32,
}

impl Trigger {
    pub const STATE_ON: u32 = 1 << 31;
    pub const INVERT_ON_REVERSE: u32 = 1 << 30;
    pub const NUMBER_MASK: u32 = !(Self::STATE_ON | Self::INVERT_ON_REVERSE);

    pub fn new(number: u32, on: bool, invert_on_reverse: bool, pos: f32) -> Self {
        let mut state = number & Self::NUMBER_MASK;
        if on {
            state |= Self::STATE_ON;
        }
        if invert_on_reverse {
            state |= Self::INVERT_ON_REVERSE;
        }
        Self { state, pos }
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.state & Self::NUMBER_MASK
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.state & Self::STATE_ON != 0
    }

    #[inline]
    pub fn inverts_on_reverse(&self) -> bool {
        self.state & Self::INVERT_ON_REVERSE != 0
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self { state: stream.read_u32()?, pos: stream.read_f32()? })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write_u32(self.state);
        stream.write_f32(self.pos);
    }
}

/// A level of detail: below `size` pixels the shape switches to the next one.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailLevel {
    pub name: i32,
    pub subshape: i32,
    /// Which mesh of each object (`first_mesh + object_detail`) to draw.
    pub object_detail: i32,
    pub size: f32,
    pub avg_error: f32,
    pub max_error: f32,
    pub poly_count: i32,
}

impl DetailLevel {
    pub fn new(name: i32, subshape: i32, object_detail: i32, size: f32) -> Self {
        Self {
            name,
            subshape,
            object_detail,
            size,
            avg_error: -1.0,
            max_error: -1.0,
            poly_count: 0,
        }
    }

    pub fn read(stream: &mut IStream) -> Result<Self> {
        Ok(Self {
            name: stream.read32()?,
            subshape: stream.read32()?,
            object_detail: stream.read32()?,
            size: stream.read_f32()?,
            avg_error: stream.read_f32()?,
            max_error: stream.read_f32()?,
            poly_count: stream.read32()?,
        })
    }

    pub fn write(&self, stream: &mut OStream) {
        stream.write32(self.name);
        stream.write32(self.subshape);
        stream.write32(self.object_detail);
        stream.write_f32(self.size);
        stream.write_f32(self.avg_error);
        stream.write_f32(self.max_error);
        stream.write32(self.poly_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_bits() {
        let t = Trigger::new(5, true, false, 0.25);
        assert_eq!(t.state, 0x8000_0005);
        assert!(t.is_on());
        assert!(!t.inverts_on_reverse());
        assert_eq!(t.number(), 5);

        let t = Trigger::new(0xFFFF_FFFF, false, true, 1.0);
        assert_eq!(t.number(), 0x3FFF_FFFF);
        assert!(t.inverts_on_reverse());
    }

    #[test]
    fn test_detail_level_round_trip() -> Result<()> {
        let mut dl = DetailLevel::new(3, 0, 1, 64.0);
        dl.poly_count = 120;
        let mut out = OStream::new(24);
        dl.write(&mut out);
        assert_eq!(out.lens(), (7, 0, 0));
        let bytes = out.into_bytes()?;
        let mut input = IStream::read_from(&mut bytes.as_slice())?;
        assert_eq!(DetailLevel::read(&mut input)?, dl);
        Ok(())
    }

    #[test]
    fn test_high_bit_trigger_survives() -> Result<()> {
        let t = Trigger::new(1, true, true, 0.5);
        let mut out = OStream::new(24);
        t.write(&mut out);
        let bytes = out.into_bytes()?;
        let mut input = IStream::read_from(&mut bytes.as_slice())?;
        assert_eq!(Trigger::read(&mut input)?, t);
        Ok(())
    }
}
