//! Errors raised while encoding or decoding CIAB buffers.

use crate::formats::{ChunkTag, CIAB_VERSION};

/// Encode/decode failure for a CIAB buffer.
#[derive(Debug, thiserror::Error)]
pub enum CiabError {
    /// The buffer ended in the middle of a header, chunk or record
    #[error("unexpected end of data while reading {what}: need {needed} bytes, {remaining} left")]
    Truncated {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// The leading version byte is not one this crate understands
    #[error(
        "unsupported CIAB format version {0} (expected {expected})",
        expected = CIAB_VERSION
    )]
    UnsupportedVersion(u8),

    /// Tag byte outside the canonical tag set (includes the reserved tangent tags)
    #[error("unknown chunk tag {0}")]
    UnknownTag(u8),

    /// Tags must be strictly increasing; repeats count as out of order
    #[error("chunk {found} appears after {previous}")]
    OutOfOrder { previous: ChunkTag, found: ChunkTag },

    /// A chunk is present while its element count is zero
    #[error("chunk {0} is present but empty")]
    EmptyChunk(ChunkTag),

    /// Array length disagrees with the count the header declares
    #[error("chunk {chunk} holds {actual} elements, expected {expected}")]
    LengthMismatch {
        chunk: ChunkTag,
        expected: usize,
        actual: usize,
    },

    /// The header counts require a chunk the buffer does not carry
    #[error("chunk {0} is required by the header counts but missing")]
    MissingChunk(ChunkTag),

    /// A chunk is present without the chunk it depends on
    #[error("chunk {chunk} requires chunk {requires}")]
    MissingDependency { chunk: ChunkTag, requires: ChunkTag },

    /// A skin slot names a bone the skeleton does not have
    #[error("vertex {vertex} is bound to bone {bone}, but the skeleton has {bone_count} bones")]
    BoneIndexOutOfRange {
        vertex: usize,
        bone: u16,
        bone_count: usize,
    },

    /// Bone tree references an index outside the skeleton
    #[error("invalid bone tree: {0}")]
    InvalidBoneTree(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
