//! Material list entries.
//!
//! Materials live in the plain tail of a shape file and are stored one
//! field at a time across the whole list, so the list codec belongs to the
//! shape. This module only holds the record and its flags.

/// A material reference: texture name plus rendering flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub flags: u32,
    /// Material index of the reflectance map, or -1.
    pub reflectance_map: i32,
    /// Material index of the bump map, or -1.
    pub bump_map: i32,
    /// Material index of the detail map, or -1.
    pub detail_map: i32,
    pub detail_scale: f32,
    pub reflectance: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            flags: 0,
            reflectance_map: -1,
            bump_map: -1,
            detail_map: -1,
            detail_scale: 1.0,
            reflectance: 0.0,
        }
    }
}

impl Material {
    pub const S_WRAP: u32 = 0x0000_0001;
    pub const T_WRAP: u32 = 0x0000_0002;
    pub const TRANSLUCENT: u32 = 0x0000_0004;
    pub const ADDITIVE: u32 = 0x0000_0008;
    pub const SUBTRACTIVE: u32 = 0x0000_0010;
    pub const SELF_ILLUMINATING: u32 = 0x0000_0020;
    pub const NEVER_ENV_MAP: u32 = 0x0000_0040;
    pub const NO_MIP_MAP: u32 = 0x0000_0080;
    pub const MIP_MAP_ZERO_BORDER: u32 = 0x0000_0100;
    pub const IFL_MATERIAL: u32 = 0x0800_0000;
    pub const IFL_FRAME: u32 = 0x1000_0000;
    pub const DETAIL_MAP: u32 = 0x2000_0000;
    pub const BUMP_MAP: u32 = 0x4000_0000;
    pub const REFLECTANCE_MAP: u32 = 0x8000_0000;
    pub const AUXILIARY_MASK: u32 = 0xE000_0000;

    /// Wrapping material with the given texture name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: Self::S_WRAP | Self::T_WRAP,
            ..Default::default()
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// Secondary map index if the matching flag is set and the index valid.
    pub fn detail_map_index(&self) -> Option<usize> {
        secondary(self.has_flag(Self::DETAIL_MAP), self.detail_map)
    }

    pub fn bump_map_index(&self) -> Option<usize> {
        secondary(self.has_flag(Self::BUMP_MAP), self.bump_map)
    }

    pub fn reflectance_map_index(&self) -> Option<usize> {
        secondary(self.has_flag(Self::REFLECTANCE_MAP), self.reflectance_map)
    }
}

fn secondary(flag: bool, index: i32) -> Option<usize> {
    if flag {
        usize::try_from(index).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let m = Material::new("grass");
        assert!(m.has_flag(Material::S_WRAP));
        assert!(m.has_flag(Material::T_WRAP));
        assert!(!m.has_flag(Material::TRANSLUCENT));
        assert_eq!(m.detail_scale, 1.0);
        assert_eq!(m.detail_map_index(), None);
    }

    #[test]
    fn test_secondary_maps() {
        let mut m = Material::new("rock");
        m.flags |= Material::BUMP_MAP;
        m.bump_map = 3;
        m.detail_map = 2;
        assert_eq!(m.bump_map_index(), Some(3));
        // Index present but flag clear.
        assert_eq!(m.detail_map_index(), None);
    }
}
