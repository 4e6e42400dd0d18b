//! Tri-buffer input stream.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::util::{dequantize_quat, text, Box3, Error, Quat, Result, Vec2, Vec3};

/// Input stream over the three typed buffers of a shape file.
///
/// Each channel has its own cursor; cursors only move forward.
#[derive(Debug, Clone)]
pub struct IStream {
    version: i32,
    exporter_version: i16,
    sequence32: i32,
    sequence16: i16,
    sequence8: i8,
    buffer32: Vec<i32>,
    buffer16: Vec<i16>,
    buffer8: Vec<i8>,
    tell32: usize,
    tell16: usize,
    tell8: usize,
}

impl IStream {
    /// Read the header and the three regions from `r`.
    ///
    /// On return `r` is positioned right after the tri-buffer section.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let version = r.read_i16::<LittleEndian>()? as i32;
        let exporter_version = r.read_i16::<LittleEndian>()?;
        let end8 = r.read_i32::<LittleEndian>()?;
        let end32 = r.read_i32::<LittleEndian>()?;
        let end16 = r.read_i32::<LittleEndian>()?;

        if end32 < 0 || end16 < end32 || end8 < end16 {
            return Err(Error::corrupt(format!(
                "invalid region ends: end32={}, end16={}, end8={}",
                end32, end16, end8
            )));
        }

        let num32 = end32 as usize;
        let num16 = (end16 - end32) as usize * 2;
        let num8 = (end8 - end16) as usize * 4;
        tracing::trace!(version, num32, num16, num8, "reading tri-buffer");

        // Region sizes come from the file; only trust them as far as data exists.
        let total = end8 as u64 * 4;
        let mut raw = Vec::new();
        r.by_ref().take(total).read_to_end(&mut raw)?;
        if (raw.len() as u64) < total {
            return Err(Error::UnexpectedEndOfData("tri-buffer region"));
        }

        let mut cursor = raw.as_slice();
        let mut buffer32 = vec![0i32; num32];
        cursor.read_i32_into::<LittleEndian>(&mut buffer32)?;
        let mut buffer16 = vec![0i16; num16];
        cursor.read_i16_into::<LittleEndian>(&mut buffer16)?;
        let buffer8: Vec<i8> = cursor.iter().map(|&b| b as i8).collect();

        Ok(Self {
            version,
            exporter_version,
            sequence32: 0,
            sequence16: 0,
            sequence8: 0,
            buffer32,
            buffer16,
            buffer8,
            tell32: 0,
            tell16: 0,
            tell8: 0,
        })
    }

    /// Format version from the header.
    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Exporter version tag from the header.
    #[inline]
    pub fn exporter_version(&self) -> i16 {
        self.exporter_version
    }

    /// Read one guard value from every channel and check it.
    pub fn guard(&mut self) -> Result<()> {
        let found32 = self.read32()?;
        let found16 = self.read16()?;
        let found8 = self.read8()?;
        if found32 != self.sequence32 || found16 != self.sequence16 || found8 != self.sequence8 {
            return Err(Error::corrupt(format!(
                "guard mismatch: expected ({}, {}, {}), found ({}, {}, {})",
                self.sequence32, self.sequence16, self.sequence8, found32, found16, found8
            )));
        }
        self.sequence32 = self.sequence32.wrapping_add(1);
        self.sequence16 = self.sequence16.wrapping_add(1);
        self.sequence8 = self.sequence8.wrapping_add(1);
        Ok(())
    }

    /// Like [`guard`](Self::guard), but first checks the 32-bit counter
    /// against the section number the caller expects.
    pub fn guard_at(&mut self, expected: i32) -> Result<()> {
        if self.sequence32 != expected {
            return Err(Error::corrupt(format!(
                "guard out of order: expected {}, stream is at {}",
                expected, self.sequence32
            )));
        }
        self.guard()
    }

    pub fn read32(&mut self) -> Result<i32> {
        let v = *self
            .buffer32
            .get(self.tell32)
            .ok_or(Error::UnexpectedEndOfData("32-bit buffer"))?;
        self.tell32 += 1;
        Ok(v)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read32()? as u32)
    }

    /// Read a count; negative values are corrupt.
    pub fn read_len(&mut self) -> Result<usize> {
        let n = self.read32()?;
        usize::try_from(n).map_err(|_| Error::corrupt(format!("negative count {}", n)))
    }

    pub fn read16(&mut self) -> Result<i16> {
        let v = *self
            .buffer16
            .get(self.tell16)
            .ok_or(Error::UnexpectedEndOfData("16-bit buffer"))?;
        self.tell16 += 1;
        Ok(v)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read16()? as u16)
    }

    pub fn read8(&mut self) -> Result<i8> {
        let v = *self
            .buffer8
            .get(self.tell8)
            .ok_or(Error::UnexpectedEndOfData("8-bit buffer"))?;
        self.tell8 += 1;
        Ok(v)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read8()? as u8)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read32()? as u32))
    }

    /// Read a zero-terminated Windows-1252 string from the 8-bit channel.
    pub fn read_string(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            match self.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }
        Ok(text::decode(&bytes))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_box(&mut self) -> Result<Box3> {
        let mut raw = [0f32; 6];
        for v in raw.iter_mut() {
            *v = self.read_f32()?;
        }
        Ok(bytemuck::cast(raw))
    }

    pub fn read_quat(&mut self) -> Result<Quat> {
        let raw = [self.read16()?, self.read16()?, self.read16()?, self.read16()?];
        Ok(dequantize_quat(raw))
    }

    /// Read `n` items with `f`.
    pub fn read_vec<T>(&mut self, n: usize, mut f: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        // Counts come from the file; cap the preallocation.
        let mut out = Vec::with_capacity(n.min(1 << 16));
        for _ in 0..n {
            out.push(f(self)?);
        }
        Ok(out)
    }

    /// Elements left unread in the 32, 16 and 8-bit channels.
    pub fn remaining(&self) -> (usize, usize, usize) {
        (
            self.buffer32.len() - self.tell32,
            self.buffer16.len() - self.tell16,
            self.buffer8.len() - self.tell8,
        )
    }
}
