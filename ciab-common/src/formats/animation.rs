//! Animation chunk (tag 11)
//!
//! Dense sampled tracks, one per bone, one sample per integer frame.
//!
//! # Layout
//! ```text
//! per animation:
//!   fps u32 LE
//!   key_count u32 LE
//!   per bone (bone_count from the file header):
//!     key_count × KeySample (44 bytes each)
//!
//! KeySample:
//!   0x00: time f32          - seconds, frame / fps
//!   0x04: position f32 × 3
//!   0x10: rotation f32 × 4  - quaternion (w, x, y, z)
//!   0x20: scale f32 × 3
//! ```

/// Per-animation header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationHeader {
    pub fps: u32,
    pub key_count: u32,
}

impl AnimationHeader {
    pub const SIZE: usize = 8;

    pub fn new(fps: u32, key_count: u32) -> Self {
        Self { fps, key_count }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.fps.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.key_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            fps: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            key_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }

    /// Payload size of the tracks following this header
    pub fn data_size(&self, bone_count: usize) -> usize {
        (self.key_count as usize)
            .saturating_mul(bone_count)
            .saturating_mul(KeySample::SIZE)
    }
}

/// One sampled bone pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySample {
    /// Seconds since frame zero
    pub time: f32,
    pub position: [f32; 3],
    /// Quaternion (w, x, y, z)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl KeySample {
    pub const SIZE: usize = 44;

    /// Rest pose at time zero (no translation, identity rotation, unit scale)
    pub const NEUTRAL: Self = Self {
        time: 0.0,
        position: [0.0, 0.0, 0.0],
        rotation: [1.0, 0.0, 0.0, 0.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Write to raw bytes (44 bytes)
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let floats = std::iter::once(self.time)
            .chain(self.position)
            .chain(self.rotation)
            .chain(self.scale);
        for (slot, value) in bytes.chunks_exact_mut(4).zip(floats) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Parse from raw bytes (44 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut floats = [0.0f32; 11];
        for (value, chunk) in floats.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Some(Self {
            time: floats[0],
            position: [floats[1], floats[2], floats[3]],
            rotation: [floats[4], floats[5], floats[6], floats[7]],
            scale: [floats[8], floats[9], floats[10]],
        })
    }
}

/// One sampled action: `tracks[bone][key]`
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub fps: u32,
    /// Samples per track; kept explicitly so a clip without bones still round-trips
    pub key_count: u32,
    pub tracks: Vec<Vec<KeySample>>,
}

impl AnimationClip {
    pub fn header(&self) -> AnimationHeader {
        AnimationHeader::new(self.fps, self.key_count)
    }

    /// Clip length in seconds, as the runtime computes it
    pub fn duration(&self) -> f32 {
        if self.fps == 0 || self.key_count == 0 {
            return 0.0;
        }
        (self.key_count - 1) as f32 / self.fps as f32
    }

    pub fn encoded_size(&self) -> usize {
        AnimationHeader::SIZE + self.header().data_size(self.tracks.len())
    }
}
