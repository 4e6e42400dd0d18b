//! Plain little-endian record helpers.
//!
//! Used by the tail of a shape file (sequences, materials) and by the
//! sequence file, neither of which goes through the tri-buffer.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::util::{dequantize_quat, len_i32, quantize_quat, text, Error, Quat, Result, Vec3};

#[inline]
pub fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    Ok(r.read_i32::<LittleEndian>()?)
}

#[inline]
pub fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    Ok(r.read_u32::<LittleEndian>()?)
}

#[inline]
pub fn read_f32<R: Read>(r: &mut R) -> Result<f32> {
    Ok(f32::from_bits(r.read_u32::<LittleEndian>()?))
}

/// Read a count; negative values are corrupt.
pub fn read_len<R: Read>(r: &mut R) -> Result<usize> {
    let n = read_i32(r)?;
    usize::try_from(n).map_err(|_| Error::corrupt(format!("negative count {}", n)))
}

pub fn read_vec3<R: Read>(r: &mut R) -> Result<Vec3> {
    Ok(Vec3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?))
}

pub fn read_quat<R: Read>(r: &mut R) -> Result<Quat> {
    let mut raw = [0i16; 4];
    r.read_i16_into::<LittleEndian>(&mut raw)?;
    Ok(dequantize_quat(raw))
}

/// Read `len` raw bytes as a Windows-1252 string.
pub fn read_chars<R: Read>(r: &mut R, len: usize) -> Result<String> {
    let mut bytes = Vec::new();
    r.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() < len {
        return Err(Error::UnexpectedEndOfData("string"));
    }
    Ok(text::decode(&bytes))
}

/// Read a string with a 1-byte length prefix.
pub fn read_string8<R: Read>(r: &mut R) -> Result<String> {
    let len = r.read_u8()? as usize;
    read_chars(r, len)
}

/// Read a string with a 4-byte length prefix.
pub fn read_string32<R: Read>(r: &mut R) -> Result<String> {
    let len = read_len(r)?;
    read_chars(r, len)
}

/// Read `n` items with `f`.
pub fn read_vec<R: Read, T>(
    r: &mut R,
    n: usize,
    mut f: impl FnMut(&mut R) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(n.min(1 << 16));
    for _ in 0..n {
        out.push(f(r)?);
    }
    Ok(out)
}

#[inline]
pub fn write_i32<W: Write>(w: &mut W, value: i32) -> Result<()> {
    w.write_i32::<LittleEndian>(value)?;
    Ok(())
}

#[inline]
pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<()> {
    w.write_u32::<LittleEndian>(value)?;
    Ok(())
}

#[inline]
pub fn write_f32<W: Write>(w: &mut W, value: f32) -> Result<()> {
    w.write_u32::<LittleEndian>(value.to_bits())?;
    Ok(())
}

#[inline]
pub fn write_len<W: Write>(w: &mut W, len: usize) -> Result<()> {
    write_i32(w, len_i32(len)?)
}

pub fn write_vec3<W: Write>(w: &mut W, v: Vec3) -> Result<()> {
    write_f32(w, v.x)?;
    write_f32(w, v.y)?;
    write_f32(w, v.z)
}

pub fn write_quat<W: Write>(w: &mut W, q: Quat) -> Result<()> {
    for c in quantize_quat(q)? {
        w.write_i16::<LittleEndian>(c)?;
    }
    Ok(())
}

/// Write a string with a 1-byte length prefix.
pub fn write_string8<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let bytes = text::encode(s)?;
    let len = u8::try_from(bytes.len()).map_err(|_| Error::range(bytes.len() as i64, 8))?;
    w.write_u8(len)?;
    w.write_all(&bytes)?;
    Ok(())
}

/// Write a string with a 4-byte length prefix.
pub fn write_string32<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let bytes = text::encode(s)?;
    write_len(w, bytes.len())?;
    w.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string8() -> Result<()> {
        let mut buf = Vec::new();
        write_string8(&mut buf, "grass")?;
        assert_eq!(buf, b"\x05grass");
        assert_eq!(read_string8(&mut buf.as_slice())?, "grass");
        Ok(())
    }

    #[test]
    fn test_string8_too_long() {
        let long = "x".repeat(256);
        let err = write_string8(&mut Vec::new(), &long).unwrap_err();
        assert!(matches!(err, Error::RangeError { value: 256, bits: 8 }));
    }

    #[test]
    fn test_string32() -> Result<()> {
        let mut buf = Vec::new();
        write_string32(&mut buf, "base.rock")?;
        assert_eq!(&buf[..4], &9i32.to_le_bytes());
        assert_eq!(read_string32(&mut buf.as_slice())?, "base.rock");
        Ok(())
    }

    #[test]
    fn test_truncated_string() {
        let err = read_string8(&mut &b"\x05gr"[..]).unwrap_err();
        assert!(matches!(err, Error::UnexpectedEndOfData(_)));
    }

    #[test]
    fn test_negative_count() {
        let err = read_len(&mut &(-3i32).to_le_bytes()[..]).unwrap_err();
        assert!(matches!(err, Error::CorruptData(_)));
    }
}
