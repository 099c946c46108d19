//! Chunk tags and their canonical order
//!
//! Every chunk is a single tag byte followed by a payload whose length is
//! implied by the header counts. Tags 5 and 6 are reserved for tangents and
//! bitangents; they are never written and a reader rejects them.

use std::fmt;

use crate::CiabError;

/// Chunk tag byte. Discriminants are the wire values; `Ord` is the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ChunkTag {
    Positions = 1,
    Normals = 2,
    Colors = 3,
    TexCoords = 4,
    Indices = 7,
    BoneIndices = 8,
    BoneWeights = 9,
    BoneTree = 10,
    Animations = 11,
}

impl ChunkTag {
    /// All tags in the order they must appear in a buffer
    pub const CANONICAL_ORDER: [ChunkTag; 9] = [
        ChunkTag::Positions,
        ChunkTag::Normals,
        ChunkTag::Colors,
        ChunkTag::TexCoords,
        ChunkTag::Indices,
        ChunkTag::BoneIndices,
        ChunkTag::BoneWeights,
        ChunkTag::BoneTree,
        ChunkTag::Animations,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::CANONICAL_ORDER
            .into_iter()
            .find(|tag| tag.as_u8() == value)
    }

    pub fn name(self) -> &'static str {
        match self {
            ChunkTag::Positions => "positions",
            ChunkTag::Normals => "normals",
            ChunkTag::Colors => "colors",
            ChunkTag::TexCoords => "uvs",
            ChunkTag::Indices => "indices",
            ChunkTag::BoneIndices => "bone indices",
            ChunkTag::BoneWeights => "bone weights",
            ChunkTag::BoneTree => "bone tree",
            ChunkTag::Animations => "animations",
        }
    }
}

impl TryFrom<u8> for ChunkTag {
    type Error = CiabError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(CiabError::UnknownTag(value))
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}
