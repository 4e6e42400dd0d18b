//! Tri-buffer output stream.
//!
//! Values are appended to one of three typed buffers by natural width and
//! serialized together by [`OStream::finish`].

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::util::{quantize_quat, text, Box3, Error, Quat, Result, Vec2, Vec3};

use super::format::DEFAULT_EXPORTER_VERSION;

/// Output stream for the tri-buffer section of a shape file.
#[derive(Debug, Clone)]
pub struct OStream {
    version: i32,
    exporter_version: i16,
    sequence32: i32,
    sequence16: i16,
    sequence8: i8,
    buffer32: Vec<i32>,
    buffer16: Vec<i16>,
    buffer8: Vec<i8>,
}

impl OStream {
    /// Create an empty stream for the given format version.
    pub fn new(version: i32) -> Self {
        Self::with_exporter(version, DEFAULT_EXPORTER_VERSION)
    }

    /// Create an empty stream with an explicit exporter version tag.
    pub fn with_exporter(version: i32, exporter_version: i16) -> Self {
        Self {
            version,
            exporter_version,
            sequence32: 0,
            sequence16: 0,
            sequence8: 0,
            buffer32: Vec::new(),
            buffer16: Vec::new(),
            buffer8: Vec::new(),
        }
    }

    /// Format version this stream is written for.
    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Write the current guard value into every channel, then advance.
    pub fn guard(&mut self) {
        self.buffer32.push(self.sequence32);
        self.buffer16.push(self.sequence16);
        self.buffer8.push(self.sequence8);
        self.sequence32 = self.sequence32.wrapping_add(1);
        self.sequence16 = self.sequence16.wrapping_add(1);
        self.sequence8 = self.sequence8.wrapping_add(1);
    }

    /// Like [`guard`](Self::guard), but first checks the 32-bit counter.
    pub fn guard_at(&mut self, expected: i32) -> Result<()> {
        if self.sequence32 != expected {
            return Err(Error::corrupt(format!(
                "guard out of order: expected {}, stream is at {}",
                expected, self.sequence32
            )));
        }
        self.guard();
        Ok(())
    }

    #[inline]
    pub fn write32(&mut self, value: i32) {
        self.buffer32.push(value);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buffer32.push(value as i32);
    }

    /// Write a count or index that must fit in 32 bits.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        self.write32(crate::util::len_i32(len)?);
        Ok(())
    }

    #[inline]
    pub fn write16(&mut self, value: i16) {
        self.buffer16.push(value);
    }

    /// Write an unsigned 16-bit element, bit-cast into the signed channel.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buffer16.push(value as i16);
    }

    #[inline]
    pub fn write8(&mut self, value: i8) {
        self.buffer8.push(value);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer8.push(value as i8);
    }

    /// Floats share the 32-bit channel with their bit pattern preserved.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buffer32.push(value.to_bits() as i32);
    }

    /// Write a zero-terminated Windows-1252 string into the 8-bit channel.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let bytes = text::encode(s)?;
        self.buffer8.extend(bytes.into_iter().map(|b| b as i8));
        self.buffer8.push(0);
        Ok(())
    }

    pub fn write_vec2(&mut self, v: Vec2) {
        self.write_f32(v.x);
        self.write_f32(v.y);
    }

    pub fn write_vec3(&mut self, v: Vec3) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    /// Min then max, six floats.
    pub fn write_box(&mut self, b: &Box3) {
        let raw: [f32; 6] = bytemuck::cast(*b);
        for v in raw {
            self.write_f32(v);
        }
    }

    /// Quaternions always go to the 16-bit channel.
    pub fn write_quat(&mut self, q: Quat) -> Result<()> {
        for c in quantize_quat(q)? {
            self.write16(c);
        }
        Ok(())
    }

    /// Element counts of the 32, 16 and 8-bit buffers before padding.
    pub fn lens(&self) -> (usize, usize, usize) {
        (self.buffer32.len(), self.buffer16.len(), self.buffer8.len())
    }

    /// Pad, write the header and the three buffers.
    ///
    /// Region ends are in 4-byte units and cumulative: 32-bit, then 16-bit,
    /// then 8-bit. The header stores them as end8, end32, end16.
    pub fn finish<W: Write>(mut self, w: &mut W) -> Result<()> {
        if self.buffer16.len() % 2 == 1 {
            self.buffer16.push(0);
        }
        while self.buffer8.len() % 4 != 0 {
            self.buffer8.push(0);
        }

        let end32 = self.buffer32.len();
        let end16 = end32 + self.buffer16.len() / 2;
        let end8 = end16 + self.buffer8.len() / 4;

        let version = i16::try_from(self.version).map_err(|_| Error::range(self.version, 16))?;
        tracing::trace!(version, end32, end16, end8, "flushing tri-buffer");

        w.write_i16::<LittleEndian>(version)?;
        w.write_i16::<LittleEndian>(self.exporter_version)?;
        w.write_i32::<LittleEndian>(crate::util::len_i32(end8)?)?;
        w.write_i32::<LittleEndian>(crate::util::len_i32(end32)?)?;
        w.write_i32::<LittleEndian>(crate::util::len_i32(end16)?)?;

        let mut bytes = Vec::with_capacity(end8 * 4);
        for v in &self.buffer32 {
            bytes.write_i32::<LittleEndian>(*v)?;
        }
        for v in &self.buffer16 {
            bytes.write_i16::<LittleEndian>(*v)?;
        }
        bytes.extend(self.buffer8.iter().map(|&v| v as u8));
        w.write_all(&bytes)?;
        Ok(())
    }

    /// Serialize to a fresh byte vector.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.finish(&mut out)?;
        Ok(out)
    }
}
