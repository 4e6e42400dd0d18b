use super::*;
use crate::util::{Box3, Error, Quat, Result, Vec2, Vec3};

fn reopen(stream: OStream) -> Result<IStream> {
    let bytes = stream.into_bytes()?;
    IStream::read_from(&mut bytes.as_slice())
}

#[test]
fn test_empty_stream_header() -> Result<()> {
    let bytes = OStream::with_exporter(24, 7).into_bytes()?;
    assert_eq!(bytes.len(), HEADER_SIZE);
    assert_eq!(&bytes[0..2], &24i16.to_le_bytes());
    assert_eq!(&bytes[2..4], &7i16.to_le_bytes());
    assert_eq!(&bytes[4..16], &[0u8; 12]);
    Ok(())
}

#[test]
fn test_region_offsets_and_padding() -> Result<()> {
    let mut out = OStream::new(24);
    out.write32(0x11223344);
    out.write32(-1);
    out.write16(5);
    out.write8(9);
    let bytes = out.into_bytes()?;

    // end32 = 2, end16 = 2 + 1 (one padded pair), end8 = 3 + 1 (one padded quad)
    let end8 = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let end32 = i32::from_le_bytes(bytes[8..12].try_into().unwrap());
    let end16 = i32::from_le_bytes(bytes[12..16].try_into().unwrap());
    assert_eq!((end8, end32, end16), (4, 2, 3));
    assert_eq!(bytes.len(), HEADER_SIZE + 4 * 4);

    assert_eq!(&bytes[16..20], &0x11223344i32.to_le_bytes());
    assert_eq!(&bytes[24..28], &[5, 0, 0, 0]);
    assert_eq!(&bytes[28..32], &[9, 0, 0, 0]);
    Ok(())
}

#[test]
fn test_guard_writes_sequence_numbers() -> Result<()> {
    let mut out = OStream::new(24);
    out.guard();
    out.guard();
    out.guard_at(2)?;

    let mut input = reopen(out)?;
    // The Nth guard carries N-1 in every channel.
    assert_eq!(input.read32()?, 0);
    assert_eq!(input.read32()?, 1);
    assert_eq!(input.read32()?, 2);
    assert_eq!(input.read16()?, 0);
    assert_eq!(input.read16()?, 1);
    assert_eq!(input.read8()?, 0);
    assert_eq!(input.read8()?, 1);
    assert_eq!(input.read8()?, 2);
    Ok(())
}

#[test]
fn test_guard_round_trip() -> Result<()> {
    let mut out = OStream::new(24);
    for _ in 0..5 {
        out.write32(42);
        out.guard();
    }
    let mut input = reopen(out)?;
    for i in 0..5 {
        assert_eq!(input.read32()?, 42);
        input.guard_at(i)?;
    }
    assert_eq!(input.remaining(), (0, 1, 3));
    Ok(())
}

#[test]
fn test_guard_mismatch_is_corrupt() -> Result<()> {
    let mut out = OStream::new(24);
    out.write32(1);
    out.guard();
    let mut input = reopen(out)?;
    // Skipping the payload makes the reader see 1 where it expects 0.
    let err = input.guard().unwrap_err();
    assert!(matches!(err, Error::CorruptData(_)));
    Ok(())
}

#[test]
fn test_guard_at_checks_counter() {
    let mut out = OStream::new(24);
    assert!(matches!(out.guard_at(3), Err(Error::CorruptData(_))));
}

#[test]
fn test_guard_counters_wrap() -> Result<()> {
    let mut out = OStream::new(24);
    for _ in 0..130 {
        out.guard();
    }
    let mut input = reopen(out)?;
    for _ in 0..130 {
        input.guard()?;
    }
    Ok(())
}

#[test]
fn test_floats_share_32bit_channel() -> Result<()> {
    let mut out = OStream::new(24);
    out.write_f32(1.5);
    out.write_f32(f32::from_bits(0x7fc0_1234));
    out.write_vec2(Vec2::new(-2.0, 0.25));
    let (n32, n16, n8) = out.lens();
    assert_eq!((n32, n16, n8), (4, 0, 0));

    let mut input = reopen(out)?;
    assert_eq!(input.read_f32()?, 1.5);
    assert_eq!(input.read_f32()?.to_bits(), 0x7fc0_1234);
    assert_eq!(input.read_vec2()?, Vec2::new(-2.0, 0.25));
    Ok(())
}

#[test]
fn test_box_vec_quat() -> Result<()> {
    let mut out = OStream::new(24);
    let b = Box3::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
    out.write_box(&b);
    out.write_quat(Quat::IDENTITY)?;
    assert_eq!(out.lens(), (6, 4, 0));

    let mut input = reopen(out)?;
    assert_eq!(input.read_box()?, b);
    assert_eq!(input.read_quat()?, Quat::IDENTITY);
    Ok(())
}

#[test]
fn test_identity_quat_raw_channel() -> Result<()> {
    let mut out = OStream::new(24);
    out.write_quat(Quat::IDENTITY)?;
    let mut input = reopen(out)?;
    assert_eq!(
        [input.read16()?, input.read16()?, input.read16()?, input.read16()?],
        [0, 0, 0, -32767]
    );
    Ok(())
}

#[test]
fn test_strings_are_zero_terminated() -> Result<()> {
    let mut out = OStream::new(24);
    out.write_string("Bip01")?;
    out.write_string("")?;
    assert_eq!(out.lens().2, 7);

    let mut input = reopen(out)?;
    assert_eq!(input.read_string()?, "Bip01");
    assert_eq!(input.read_string()?, "");
    Ok(())
}

#[test]
fn test_unencodable_string() {
    let mut out = OStream::new(24);
    assert!(matches!(out.write_string("\u{4E2D}"), Err(Error::EncodingError(_))));
}

#[test]
fn test_read_past_end() -> Result<()> {
    let mut input = reopen(OStream::new(24))?;
    assert!(matches!(input.read32(), Err(Error::UnexpectedEndOfData("32-bit buffer"))));
    assert!(matches!(input.read16(), Err(Error::UnexpectedEndOfData("16-bit buffer"))));
    assert!(matches!(input.read8(), Err(Error::UnexpectedEndOfData("8-bit buffer"))));
    Ok(())
}

#[test]
fn test_truncated_region() -> Result<()> {
    let mut out = OStream::new(24);
    out.write32(1);
    out.write32(2);
    let bytes = out.into_bytes()?;
    let err = IStream::read_from(&mut &bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, Error::UnexpectedEndOfData(_)));
    Ok(())
}

#[test]
fn test_bad_region_ends() {
    let mut bytes = vec![24, 0, 0, 0];
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&4i32.to_le_bytes());
    bytes.extend_from_slice(&2i32.to_le_bytes());
    let err = IStream::read_from(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(err, Error::CorruptData(_)));
}

#[test]
fn test_version_out_of_range() {
    let err = OStream::new(40000).into_bytes().unwrap_err();
    assert!(matches!(err, Error::RangeError { bits: 16, .. }));
}

#[test]
fn test_tail_follows_tri_buffer() -> Result<()> {
    let mut out = OStream::new(24);
    out.write32(3);
    let mut bytes = out.into_bytes()?;
    bytes.extend_from_slice(&99i32.to_le_bytes());

    let mut cursor = bytes.as_slice();
    let mut input = IStream::read_from(&mut cursor)?;
    assert_eq!(input.read32()?, 3);
    assert_eq!(plain::read_i32(&mut cursor)?, 99);
    Ok(())
}
