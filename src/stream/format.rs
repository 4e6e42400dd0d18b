//! DTS format constants.

/// Size of the tri-buffer header in bytes: version (i16), exporter version
/// (i16), then the 8-bit, 32-bit and 16-bit region ends (i32 each).
pub const HEADER_SIZE: usize = 16;

/// Version written when the caller does not ask for another one.
pub const DEFAULT_VERSION: i32 = 24;

/// Exporter version tag written into new files.
pub const DEFAULT_EXPORTER_VERSION: i16 = 0;

/// Tag byte introducing the material list in the tail section.
pub const MATERIAL_LIST_TAG: i8 = 1;

/// Below this version an obsolete mesh index list follows the subshapes.
pub const MESH_INDEX_LIST_BEFORE: i32 = 16;

/// From this version on there are separate rotation/translation/scale counts.
pub const SPLIT_COUNTS_SINCE: i32 = 22;

/// From this version on the legacy header field is gone.
pub const NO_LEGACY_FIELD_SINCE: i32 = 23;

/// From this version on ground frames are stored.
pub const GROUND_FRAMES_SINCE: i32 = 24;

/// Only this version pads every material with four extra bytes.
pub const MATERIAL_PADDING_VERSION: i32 = 25;

/// From this version on detail levels carry alpha-in/out values and material
/// names have a 4-byte length prefix.
pub const ALPHA_AND_WIDE_NAMES_SINCE: i32 = 26;

/// True when scale arrays and their guard are present.
#[inline]
pub const fn has_scales(version: i32) -> bool {
    version >= SPLIT_COUNTS_SINCE
}

/// True when ground frame arrays and their guard are present.
#[inline]
pub const fn has_ground_frames(version: i32) -> bool {
    version >= GROUND_FRAMES_SINCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_gates() {
        assert!(!has_scales(21));
        assert!(has_scales(22));
        assert!(!has_ground_frames(23));
        assert!(has_ground_frames(24));
        assert!(has_ground_frames(DEFAULT_VERSION));
    }
}
