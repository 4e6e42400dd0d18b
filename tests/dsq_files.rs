//! Integration tests for sequence files.

use dts::prelude::*;

use tempfile::NamedTempFile;

fn matters(set: &[usize]) -> Vec<bool> {
    let mut bits = vec![false; 32];
    for &i in set {
        bits[i] = true;
    }
    bits
}

fn run_cycle() -> DsqFile {
    let mut dsq = DsqFile::new();
    dsq.nodes = vec!["Bip01".into(), "Bip01 L Thigh".into(), "Bip01 R Thigh".into()];

    // three frames for each thigh
    let frames = 3;
    for node in 0..2 {
        for f in 0..frames {
            let angle = (f as f32 - 1.0) * 0.4 * if node == 0 { 1.0 } else { -1.0 };
            dsq.rotations.push(Quat::from_rotation_x(angle));
        }
    }
    dsq.translations = (0..frames).map(|f| Vec3::new(0.0, f as f32 * 0.5, 0.0)).collect();
    dsq.ground_translations = vec![Vec3::new(0.0, 1.0, 0.0)];
    dsq.ground_rotations = vec![Quat::IDENTITY];
    dsq.triggers = vec![Trigger::new(1, true, false, 0.0), Trigger::new(2, true, true, 0.5)];

    dsq.sequences.push(DsqSequence {
        name: "run".into(),
        sequence: Sequence {
            flags: Sequence::CYCLIC,
            num_keyframes: frames,
            duration: 0.6,
            num_ground_frames: 1,
            num_triggers: 2,
            rotation_matters: matters(&[1, 2]),
            translation_matters: matters(&[0]),
            ..Default::default()
        },
    });
    dsq
}

#[test]
fn test_roundtrip_file() {
    let temp = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp.path();

    // Write through one load so rotations are already quantized.
    let dsq = DsqFile::load(&run_cycle().to_bytes().unwrap()).unwrap();
    dsq.save(path).expect("Failed to save sequence file");

    let back = DsqFile::open(path).expect("Failed to open sequence file");
    assert_eq!(back, dsq);
    assert_eq!(back.to_bytes().unwrap(), dsq.to_bytes().unwrap());
}

#[test]
fn test_keyframes_resolve_through_sequence() -> Result<()> {
    let dsq = DsqFile::load(&run_cycle().to_bytes()?)?;
    let run = dsq.find_sequence("Run").expect("sequence by name");
    let seq = &run.sequence;

    let nodes = seq.rotation_nodes(dsq.nodes.len());
    assert_eq!(nodes, vec![1, 2]);
    assert_eq!(dsq.nodes[nodes[1]], "Bip01 R Thigh");

    // second animated node, last frame
    let key = seq.keyframe_index(seq.base_rotation, 1, 2);
    assert!(dsq.rotations[key].abs_diff_eq(Quat::from_rotation_x(-0.4), 1e-4));

    let fired: Vec<u32> = dsq.triggers.iter().map(|t| t.number()).collect();
    assert_eq!(fired, vec![1, 2]);
    assert!(dsq.triggers[1].inverts_on_reverse());
    Ok(())
}

#[test]
fn test_version_21_layout() -> Result<()> {
    let mut dsq = run_cycle();
    dsq.version = 21;
    assert!(matches!(dsq.to_bytes(), Err(Error::UnsupportedFeature(_))));

    dsq.ground_translations.clear();
    dsq.ground_rotations.clear();
    let back = DsqFile::load(&dsq.to_bytes()?)?;
    assert_eq!(back.version, 21);
    assert_eq!(back.sequences.len(), 1);
    assert_eq!(back.translations, dsq.translations);
    Ok(())
}

#[test]
fn test_names_limited_to_255_bytes() {
    let mut dsq = run_cycle();
    dsq.nodes.push("n".repeat(256));
    assert!(matches!(dsq.to_bytes(), Err(Error::RangeError { .. })));
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.dsq");
    assert!(matches!(DsqFile::open(&path), Err(Error::FileNotFound(_))));
}

#[test]
fn test_sequence_nodes_match_shape() -> Result<()> {
    let mut shape = Shape::new();
    let root = shape.add_node("bip01", -1, Vec3::ZERO, Quat::IDENTITY) as i32;
    shape.add_node("BIP01 L THIGH", root, Vec3::X, Quat::IDENTITY);
    shape.add_node("Bip01 R Thigh", root, -Vec3::X, Quat::IDENTITY);

    let dsq = run_cycle();
    let mapped: Vec<Option<usize>> = dsq.nodes.iter().map(|n| shape.find_node(n)).collect();
    assert_eq!(mapped, vec![Some(0), Some(1), Some(2)]);
    Ok(())
}
