//! CIAB file header
//!
//! # Layout
//! ```text
//! 0x00: format_version u8   - Always CIAB_VERSION for files written by this crate
//! 0x01: vertex_count u32 LE - Corner vertices (positions, normals, colors, uvs, skin slots)
//! 0x05: index_count u32 LE  - Entries in the index chunk
//! 0x09: bone_count u32 LE   - Bones in the bone tree and tracks per animation
//! 0x0D: animation_count u32 LE
//! ```

use super::CIAB_VERSION;

/// CIAB header (17 bytes)
///
/// Note: Not packed - we use explicit byte serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CiabHeader {
    pub version: u8,
    pub vertex_count: u32,
    pub index_count: u32,
    pub bone_count: u32,
    pub animation_count: u32,
}

impl CiabHeader {
    pub const SIZE: usize = 17;

    pub fn new(vertex_count: u32, index_count: u32, bone_count: u32, animation_count: u32) -> Self {
        Self {
            version: CIAB_VERSION,
            vertex_count,
            index_count,
            bone_count,
            animation_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = self.version;
        bytes[1..5].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[5..9].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[9..13].copy_from_slice(&self.bone_count.to_le_bytes());
        bytes[13..17].copy_from_slice(&self.animation_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    ///
    /// Does not check the version; see [`CiabHeader::is_supported`].
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Some(Self {
            version: bytes[0],
            vertex_count: u32_at(1),
            index_count: u32_at(5),
            bone_count: u32_at(9),
            animation_count: u32_at(13),
        })
    }

    pub fn is_supported(&self) -> bool {
        self.version == CIAB_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = CiabHeader::new(6, 6, 2, 1);
        let bytes = header.to_bytes();

        assert_eq!(bytes[0], CIAB_VERSION);
        assert_eq!(&bytes[1..5], &6u32.to_le_bytes());
        assert_eq!(&bytes[5..9], &6u32.to_le_bytes());
        assert_eq!(&bytes[9..13], &2u32.to_le_bytes());
        assert_eq!(&bytes[13..17], &1u32.to_le_bytes());

        let parsed = CiabHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.is_supported());
    }

    #[test]
    fn test_header_from_short_bytes() {
        assert!(CiabHeader::from_bytes(&[0u8; 16]).is_none());
    }

    #[test]
    fn test_foreign_version_not_supported() {
        let mut bytes = CiabHeader::new(0, 0, 0, 0).to_bytes();
        bytes[0] = 1;
        let parsed = CiabHeader::from_bytes(&bytes).unwrap();
        assert!(!parsed.is_supported());
    }
}
