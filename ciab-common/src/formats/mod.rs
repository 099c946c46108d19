//! CIAB binary mesh format
//!
//! A CIAB buffer is a fixed 17-byte header followed by tagged chunks in
//! canonical order. No magic bytes; the leading version byte identifies the
//! layout. All multi-byte values are little-endian.
//!
//! ```text
//! header:
//!   version u8 (= CIAB_VERSION)
//!   vertex_count u32
//!   index_count u32
//!   bone_count u32
//!   animation_count u32
//! chunk:
//!   tag u8
//!   payload (size derived from the header counts)
//! ```
//!
//! Fixed-size records implement [`BinarySerializable`].

pub mod animation;
pub mod chunk;
pub mod header;
pub mod model;
pub mod reader;
mod serialization;
pub mod skeleton;
pub mod writer;

pub use animation::*;
pub use chunk::*;
pub use header::*;
pub use model::*;
pub use reader::{decode_ciab, read_ciab, read_header};
pub use serialization::BinarySerializable;
pub use skeleton::*;
pub use writer::{encode_ciab, write_ciab};

/// Format version written into (and required from) the header
pub const CIAB_VERSION: u8 = 2;

/// Bone influence slots per vertex
pub const MAX_INFLUENCES: usize = 4;

/// File extension for CIAB files (without the dot)
pub const CIAB_EXT: &str = "ciab";
