//! CIAB chunk reader
//!
//! Walks the chunk sequence after the header. Chunks may be absent, but they
//! must appear in canonical order, at most once, and never with a zero count.

use std::io::Read;

use super::{
    AnimationClip, AnimationHeader, BinarySerializable, BoneRecord, BoneTree, ChunkTag,
    CiabHeader, CiabModel, KeySample, MATRIX_FLOATS, MAX_INFLUENCES, SkinWeights,
};
use crate::CiabError;

/// Cursor over a CIAB buffer
struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take `count × size` bytes, checking for overflow and truncation before
    /// anything gets allocated.
    fn take(
        &mut self,
        count: usize,
        size: usize,
        what: &'static str,
    ) -> Result<&'a [u8], CiabError> {
        let needed = count.checked_mul(size).ok_or(CiabError::Truncated {
            what,
            needed: usize::MAX,
            remaining: self.remaining(),
        })?;
        if needed > self.remaining() {
            return Err(CiabError::Truncated {
                what,
                needed,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn record<T: BinarySerializable>(&mut self, what: &'static str) -> Result<T, CiabError> {
        let bytes = self.take(1, T::SIZE, what)?;
        // take() guarantees the length, so deserialize cannot come up short
        T::deserialize(bytes).ok_or(CiabError::Truncated {
            what,
            needed: T::SIZE,
            remaining: bytes.len(),
        })
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, CiabError> {
        Ok(self.take(1, 1, what)?[0])
    }

    fn i16(&mut self, what: &'static str) -> Result<i16, CiabError> {
        let b = self.take(1, 2, what)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn i16s(&mut self, count: usize, what: &'static str) -> Result<Vec<i16>, CiabError> {
        let bytes = self.take(count, 2, what)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect())
    }

    fn u32s(&mut self, count: usize, what: &'static str) -> Result<Vec<u32>, CiabError> {
        let bytes = self.take(count, 4, what)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    fn f32s(&mut self, count: usize, what: &'static str) -> Result<Vec<f32>, CiabError> {
        let bytes = self.take(count, 4, what)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    /// Read `count` fixed-size float groups, e.g. `[f32; 3]` positions
    fn float_arrays<const N: usize>(
        &mut self,
        count: usize,
        what: &'static str,
    ) -> Result<Vec<[f32; N]>, CiabError> {
        let bytes = self.take(count, N * 4, what)?;
        Ok(bytes
            .chunks_exact(N * 4)
            .map(|group| {
                let mut out = [0.0f32; N];
                for (value, b) in out.iter_mut().zip(group.chunks_exact(4)) {
                    *value = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                }
                out
            })
            .collect())
    }

    fn matrix(&mut self, what: &'static str) -> Result<[f32; MATRIX_FLOATS], CiabError> {
        let values = self.f32s(MATRIX_FLOATS, what)?;
        let mut out = [0.0f32; MATRIX_FLOATS];
        out.copy_from_slice(&values);
        Ok(out)
    }
}

/// Read just the header of a CIAB buffer
pub fn read_header(data: &[u8]) -> Result<CiabHeader, CiabError> {
    let header: CiabHeader = ChunkReader::new(data).record("header")?;
    if !header.is_supported() {
        return Err(CiabError::UnsupportedVersion(header.version));
    }
    Ok(header)
}

/// Decode a complete CIAB buffer
pub fn decode_ciab(data: &[u8]) -> Result<CiabModel, CiabError> {
    let mut reader = ChunkReader::new(data);
    let header: CiabHeader = reader.record("header")?;
    if !header.is_supported() {
        return Err(CiabError::UnsupportedVersion(header.version));
    }

    let vertices = header.vertex_count as usize;
    let bones = header.bone_count as usize;

    let mut model = CiabModel {
        vertex_count: header.vertex_count,
        index_count: header.index_count,
        bone_count: header.bone_count,
        ..Default::default()
    };
    let mut skin_indices: Option<Vec<[u16; MAX_INFLUENCES]>> = None;
    let mut skin_weights: Option<Vec<[f32; MAX_INFLUENCES]>> = None;
    let mut previous: Option<ChunkTag> = None;

    while !reader.is_empty() {
        let tag = ChunkTag::try_from(reader.u8("chunk tag")?)?;
        if let Some(previous) = previous {
            if tag <= previous {
                return Err(CiabError::OutOfOrder {
                    previous,
                    found: tag,
                });
            }
        }
        previous = Some(tag);

        let count = match tag {
            ChunkTag::Indices => header.index_count as usize,
            ChunkTag::BoneTree => bones,
            ChunkTag::Animations => header.animation_count as usize,
            _ => vertices,
        };
        if count == 0 {
            return Err(CiabError::EmptyChunk(tag));
        }

        match tag {
            ChunkTag::Positions => model.positions = Some(reader.float_arrays(count, "positions")?),
            ChunkTag::Normals => model.normals = Some(reader.float_arrays(count, "normals")?),
            ChunkTag::Colors => model.colors = Some(reader.float_arrays(count, "colors")?),
            ChunkTag::TexCoords => model.uvs = Some(reader.float_arrays(count, "uvs")?),
            ChunkTag::Indices => model.indices = Some(reader.u32s(count, "indices")?),
            ChunkTag::BoneIndices => {
                let bytes = reader.take(count, MAX_INFLUENCES * 2, "bone indices")?;
                let slots = bytes
                    .chunks_exact(MAX_INFLUENCES * 2)
                    .map(|vertex| {
                        let mut out = [0u16; MAX_INFLUENCES];
                        for (slot, b) in out.iter_mut().zip(vertex.chunks_exact(2)) {
                            *slot = u16::from_le_bytes([b[0], b[1]]);
                        }
                        out
                    })
                    .collect();
                skin_indices = Some(slots);
            }
            ChunkTag::BoneWeights => {
                skin_weights = Some(reader.float_arrays(count, "bone weights")?);
            }
            ChunkTag::BoneTree => model.skeleton = Some(read_bone_tree(&mut reader, count)?),
            ChunkTag::Animations => {
                for _ in 0..count {
                    model.animations.push(read_animation(&mut reader, bones)?);
                }
            }
        }
        tracing::trace!("Read chunk {}", tag);
    }

    model.skin = match (skin_indices, skin_weights) {
        (Some(indices), Some(weights)) => Some(SkinWeights { indices, weights }),
        (None, None) => None,
        (Some(_), None) => {
            tracing::warn!("CIAB buffer has bone indices but no bone weights, ignoring skinning");
            None
        }
        (None, Some(_)) => {
            tracing::warn!("CIAB buffer has bone weights but no bone indices, ignoring skinning");
            None
        }
    };

    // Presence rules, skin bone indices and bone tree links
    model.validate()?;

    tracing::debug!(
        "Decoded CIAB buffer: {} vertices, {} indices, {} bones, {} animations",
        header.vertex_count,
        header.index_count,
        header.bone_count,
        header.animation_count
    );

    Ok(model)
}

/// Read and decode a CIAB stream
pub fn read_ciab<R: Read>(r: &mut R) -> Result<CiabModel, CiabError> {
    let mut data = Vec::new();
    r.read_to_end(&mut data)?;
    decode_ciab(&data)
}

fn read_bone_tree(reader: &mut ChunkReader<'_>, count: usize) -> Result<BoneTree, CiabError> {
    let root_index = reader.i16("bone root index")?;
    let mut bones = Vec::with_capacity(count.min(reader.remaining() / BoneRecord::FIXED_SIZE));

    for i in 0..count {
        let parent_index = reader.i16("bone parent index")?;
        let child_count = reader.i16("bone child count")?;
        if child_count < 0 {
            return Err(CiabError::InvalidBoneTree(format!(
                "bone {} has negative child count {}",
                i, child_count
            )));
        }
        let child_indices = reader.i16s(child_count as usize, "bone child indices")?;
        let inverse_bind = reader.matrix("bone inverse bind pose")?;
        let parent_offset = reader.matrix("bone parent offset")?;
        bones.push(BoneRecord {
            parent_index,
            child_indices,
            inverse_bind,
            parent_offset,
        });
    }

    let tree = BoneTree { root_index, bones };
    Ok(tree)
}

fn read_animation(reader: &mut ChunkReader<'_>, bones: usize) -> Result<AnimationClip, CiabError> {
    let header: AnimationHeader = reader.record("animation header")?;
    let keys = header.key_count as usize;

    // Bound the whole clip up front so a corrupt key_count cannot trigger a huge allocation
    let needed = header.data_size(bones);
    if needed > reader.remaining() {
        return Err(CiabError::Truncated {
            what: "animation samples",
            needed,
            remaining: reader.remaining(),
        });
    }

    let mut tracks = Vec::with_capacity(bones);
    for _ in 0..bones {
        let mut track = Vec::with_capacity(keys);
        for _ in 0..keys {
            track.push(reader.record::<KeySample>("animation sample")?);
        }
        tracks.push(track);
    }

    Ok(AnimationClip {
        fps: header.fps,
        key_count: header.key_count,
        tracks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{encode_ciab, IDENTITY_MATRIX};

    fn rigged_model() -> CiabModel {
        let translate = |x: f32| {
            let mut m = IDENTITY_MATRIX;
            m[12] = x;
            m
        };
        let sample = |time: f32, x: f32| KeySample {
            time,
            position: [x, 0.0, 0.0],
            rotation: [1.0, 0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        };

        CiabModel {
            vertex_count: 3,
            index_count: 3,
            bone_count: 2,
            positions: Some(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            colors: Some(vec![[1.0, 0.5, 0.25]; 3]),
            uvs: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            indices: Some(vec![0, 1, 2]),
            skin: Some(SkinWeights {
                indices: vec![[0, 0, 0, 0], [1, 0, 0, 0], [0, 1, 0, 0]],
                weights: vec![
                    [1.0, 0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0, 0.0],
                    [0.5, 0.5, 0.0, 0.0],
                ],
            }),
            skeleton: Some(BoneTree {
                root_index: 0,
                bones: vec![
                    BoneRecord {
                        parent_index: -1,
                        child_indices: vec![1],
                        inverse_bind: IDENTITY_MATRIX,
                        parent_offset: IDENTITY_MATRIX,
                    },
                    BoneRecord {
                        parent_index: 0,
                        child_indices: vec![],
                        inverse_bind: translate(-1.0),
                        parent_offset: translate(1.0),
                    },
                ],
            }),
            animations: vec![AnimationClip {
                fps: 2,
                key_count: 2,
                tracks: vec![
                    vec![sample(0.0, 0.0), sample(0.5, 0.0)],
                    vec![sample(0.0, 1.0), sample(0.5, 2.0)],
                ],
            }],
        }
    }

    #[test]
    fn test_decode_full_model() {
        let model = rigged_model();
        let bytes = encode_ciab(&model).unwrap();
        let decoded = decode_ciab(&bytes).unwrap();
        assert_eq!(decoded, model);
        assert!(decoded.is_animated());
    }

    #[test]
    fn test_absent_chunks_tolerated() {
        let mut model = rigged_model();
        model.colors = None;
        model.uvs = None;
        let decoded = decode_ciab(&encode_ciab(&model).unwrap()).unwrap();
        assert!(decoded.colors.is_none());
        assert!(decoded.uvs.is_none());
        assert_eq!(decoded.positions, model.positions);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut bytes = CiabHeader::new(1, 0, 0, 0).to_bytes().to_vec();
        bytes.push(ChunkTag::Normals.as_u8());
        bytes.extend_from_slice(&[0u8; 12]);
        bytes.push(ChunkTag::Positions.as_u8());
        bytes.extend_from_slice(&[0u8; 12]);

        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::OutOfOrder {
                previous: ChunkTag::Normals,
                found: ChunkTag::Positions
            })
        ));
    }

    #[test]
    fn test_duplicate_chunk_rejected() {
        let mut bytes = CiabHeader::new(1, 0, 0, 0).to_bytes().to_vec();
        for _ in 0..2 {
            bytes.push(ChunkTag::Positions.as_u8());
            bytes.extend_from_slice(&[0u8; 12]);
        }
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_empty_chunk_rejected() {
        let mut bytes = CiabHeader::new(0, 0, 0, 0).to_bytes().to_vec();
        bytes.push(ChunkTag::Positions.as_u8());
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::EmptyChunk(ChunkTag::Positions))
        ));
    }

    #[test]
    fn test_reserved_tag_rejected() {
        let mut bytes = CiabHeader::new(1, 0, 0, 0).to_bytes().to_vec();
        bytes.push(5);
        assert!(matches!(decode_ciab(&bytes), Err(CiabError::UnknownTag(5))));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let bytes = encode_ciab(&rigged_model()).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            decode_ciab(cut),
            Err(CiabError::Truncated { .. })
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut bytes = encode_ciab(&rigged_model()).unwrap();
        bytes[0] = 1;
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::UnsupportedVersion(1))
        ));
        assert!(read_header(&bytes).is_err());
    }

    #[test]
    fn test_huge_key_count_does_not_allocate() {
        let mut bytes = CiabHeader::new(0, 0, 4, 1).to_bytes().to_vec();
        bytes.push(ChunkTag::Animations.as_u8());
        bytes.extend_from_slice(&AnimationHeader::new(30, u32::MAX).to_bytes());
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::Truncated { .. })
        ));
    }

    #[test]
    fn test_read_from_stream() {
        let bytes = encode_ciab(&rigged_model()).unwrap();
        let model = read_ciab(&mut bytes.as_slice()).unwrap();
        assert_eq!(model.bone_count, 2);
    }

    #[test]
    fn test_declared_bones_without_tree_rejected() {
        let bytes = CiabHeader::new(0, 0, 2, 0).to_bytes();
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::MissingChunk(ChunkTag::BoneTree))
        ));
    }

    #[test]
    fn test_vertices_without_positions_rejected() {
        let mut bytes = CiabHeader::new(3, 0, 0, 0).to_bytes().to_vec();
        bytes.push(ChunkTag::Normals.as_u8());
        bytes.extend_from_slice(&[0u8; 36]);
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::MissingChunk(ChunkTag::Positions))
        ));
    }

    // Offsets into the encoded rigged model: header 17, positions 37,
    // normals 37, colors 37, uvs 25, indices 13, bone indices 25, weights 49
    const BONE_INDICES_AT: usize = 166;
    const BONE_TREE_AT: usize = 240;

    #[test]
    fn test_bone_index_out_of_range_rejected() {
        let mut bytes = encode_ciab(&rigged_model()).unwrap();
        assert_eq!(bytes[BONE_INDICES_AT], ChunkTag::BoneIndices.as_u8());
        bytes[BONE_INDICES_AT + 1..BONE_INDICES_AT + 3].copy_from_slice(&900u16.to_le_bytes());
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::BoneIndexOutOfRange { bone: 900, .. })
        ));
    }

    #[test]
    fn test_inconsistent_bone_links_rejected() {
        let mut bytes = encode_ciab(&rigged_model()).unwrap();
        assert_eq!(bytes[BONE_TREE_AT], ChunkTag::BoneTree.as_u8());
        // Root, parent -1, one child: point that child at the root itself
        let child_at = BONE_TREE_AT + 1 + 2 + 2 + 2;
        bytes[child_at..child_at + 2].copy_from_slice(&0i16.to_le_bytes());
        assert!(matches!(
            decode_ciab(&bytes),
            Err(CiabError::InvalidBoneTree(_))
        ));
    }
}
