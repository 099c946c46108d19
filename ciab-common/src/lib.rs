//! Shared types for the CIAB binary mesh format
//!
//! This crate is used by:
//! - `ciab-export` (asset pipeline: host scene → CIAB)
//! - runtimes that load `.ciab` files
//!
//! # Modules
//!
//! - [`formats`] - header, chunk tags, records, and the chunk writer/reader

pub mod formats;

mod error;

pub use error::CiabError;

// Re-export commonly used format items
pub use formats::{
    AnimationClip,
    AnimationHeader,
    BinarySerializable,
    BoneRecord,
    BoneTree,
    // Constants
    CIAB_EXT,
    CIAB_VERSION,
    ChunkTag,
    CiabHeader,
    CiabModel,
    IDENTITY_MATRIX,
    KeySample,
    MATRIX_FLOATS,
    MAX_BONES,
    MAX_INFLUENCES,
    SkinWeights,
    // Codec
    decode_ciab,
    encode_ciab,
    non_empty,
    read_ciab,
    read_header,
    write_ciab,
};
