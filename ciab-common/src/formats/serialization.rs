//! Binary serialization trait for fixed-size records.
//!
//! The CIAB header, the per-animation header and key samples implement
//! `BinarySerializable` so generic code (the chunk reader in particular) can
//! pull any of them off a byte slice the same way.

/// Trait for fixed-size binary records.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
/// For performance-critical code, use the type-specific `to_bytes()` methods
/// directly, which return fixed-size arrays.
///
/// # Example
///
/// ```
/// use ciab_common::formats::{BinarySerializable, CiabHeader};
///
/// let header = CiabHeader::new(6, 6, 0, 0);
/// let bytes = header.serialize();
/// let parsed = CiabHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.vertex_count, 6);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized record in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::CiabHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::AnimationHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::KeySample {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}
