//! In-memory form of a whole CIAB buffer
//!
//! Every optional chunk is an `Option<Vec<_>>`: `None` means the chunk is
//! absent, and `Some` must never hold an empty vector. Use [`non_empty`] when
//! building a model from arrays that may be empty.

use super::{AnimationClip, BoneTree, ChunkTag, CiabHeader, MAX_INFLUENCES};
use crate::CiabError;

/// Per-vertex bone influences, `MAX_INFLUENCES` slots each, zero-padded
#[derive(Debug, Clone, PartialEq)]
pub struct SkinWeights {
    pub indices: Vec<[u16; MAX_INFLUENCES]>,
    pub weights: Vec<[f32; MAX_INFLUENCES]>,
}

impl SkinWeights {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Sum of the weights assigned to one vertex
    pub fn weight_sum(&self, vertex: usize) -> f32 {
        self.weights[vertex].iter().sum()
    }
}

/// Decoded (or about to be encoded) CIAB file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CiabModel {
    pub vertex_count: u32,
    pub index_count: u32,
    pub bone_count: u32,
    pub positions: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// RGB
    pub colors: Option<Vec<[f32; 3]>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    pub skin: Option<SkinWeights>,
    pub skeleton: Option<BoneTree>,
    pub animations: Vec<AnimationClip>,
}

/// Wrap an array as a chunk payload, mapping an empty array to an absent chunk.
pub fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() { None } else { Some(values) }
}

impl CiabModel {
    pub fn header(&self) -> CiabHeader {
        CiabHeader::new(
            self.vertex_count,
            self.index_count,
            self.bone_count,
            self.animations.len() as u32,
        )
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }

    pub fn is_animated(&self) -> bool {
        self.is_skinned() && !self.animations.is_empty()
    }

    /// Tags this model will emit, in canonical order
    pub fn present_chunks(&self) -> Vec<ChunkTag> {
        let present = [
            (ChunkTag::Positions, self.positions.is_some()),
            (ChunkTag::Normals, self.normals.is_some()),
            (ChunkTag::Colors, self.colors.is_some()),
            (ChunkTag::TexCoords, self.uvs.is_some()),
            (ChunkTag::Indices, self.indices.is_some()),
            (ChunkTag::BoneIndices, self.skin.is_some()),
            (ChunkTag::BoneWeights, self.skin.is_some()),
            (ChunkTag::BoneTree, self.skeleton.is_some()),
            (ChunkTag::Animations, !self.animations.is_empty()),
        ];
        present
            .into_iter()
            .filter_map(|(tag, is_present)| is_present.then_some(tag))
            .collect()
    }

    /// Check every present chunk against the header counts.
    ///
    /// The writer calls this before emitting a single byte, so an invalid
    /// model never produces a partial buffer. The reader runs it on every
    /// decoded buffer.
    pub fn validate(&self) -> Result<(), CiabError> {
        self.check_presence()?;

        let vertices = self.vertex_count as usize;
        let bones = self.bone_count as usize;

        check_chunk(ChunkTag::Positions, self.positions.as_ref().map(Vec::len), vertices)?;
        check_chunk(ChunkTag::Normals, self.normals.as_ref().map(Vec::len), vertices)?;
        check_chunk(ChunkTag::Colors, self.colors.as_ref().map(Vec::len), vertices)?;
        check_chunk(ChunkTag::TexCoords, self.uvs.as_ref().map(Vec::len), vertices)?;
        check_chunk(
            ChunkTag::Indices,
            self.indices.as_ref().map(Vec::len),
            self.index_count as usize,
        )?;
        if let Some(skin) = &self.skin {
            check_chunk(ChunkTag::BoneIndices, Some(skin.indices.len()), vertices)?;
            check_chunk(ChunkTag::BoneWeights, Some(skin.weights.len()), vertices)?;
            for (vertex, slots) in skin.indices.iter().enumerate() {
                if let Some(&bone) = slots.iter().find(|&&bone| bone as usize >= bones) {
                    return Err(CiabError::BoneIndexOutOfRange {
                        vertex,
                        bone,
                        bone_count: bones,
                    });
                }
            }
        }

        if let Some(skeleton) = &self.skeleton {
            check_chunk(ChunkTag::BoneTree, Some(skeleton.len()), bones)?;
            skeleton.validate()?;
        }

        for clip in &self.animations {
            if clip.tracks.len() != bones {
                return Err(CiabError::LengthMismatch {
                    chunk: ChunkTag::Animations,
                    expected: bones,
                    actual: clip.tracks.len(),
                });
            }
            if let Some(track) = clip
                .tracks
                .iter()
                .find(|track| track.len() != clip.key_count as usize)
            {
                return Err(CiabError::LengthMismatch {
                    chunk: ChunkTag::Animations,
                    expected: clip.key_count as usize,
                    actual: track.len(),
                });
            }
        }

        Ok(())
    }

    /// Non-zero counts require their chunks; skin and animations require the bone tree
    fn check_presence(&self) -> Result<(), CiabError> {
        let required = [
            (ChunkTag::Positions, self.vertex_count > 0, self.positions.is_some()),
            (ChunkTag::Normals, self.vertex_count > 0, self.normals.is_some()),
            (ChunkTag::Indices, self.index_count > 0, self.indices.is_some()),
            (ChunkTag::BoneTree, self.bone_count > 0, self.skeleton.is_some()),
        ];
        if let Some(&(tag, ..)) = required
            .iter()
            .find(|&&(_, needed, present)| needed && !present)
        {
            return Err(CiabError::MissingChunk(tag));
        }

        if self.skeleton.is_none() {
            let orphan = if self.is_skinned() {
                Some(ChunkTag::BoneIndices)
            } else if !self.animations.is_empty() {
                Some(ChunkTag::Animations)
            } else {
                None
            };
            if let Some(chunk) = orphan {
                return Err(CiabError::MissingDependency {
                    chunk,
                    requires: ChunkTag::BoneTree,
                });
            }
        }
        Ok(())
    }

    /// Exact size of the encoded buffer
    pub fn encoded_size(&self) -> usize {
        let vertices = self.vertex_count as usize;
        let mut size = CiabHeader::SIZE;
        let mut chunk = |present: bool, payload: usize| {
            if present {
                size += 1 + payload;
            }
        };

        chunk(self.positions.is_some(), vertices * 12);
        chunk(self.normals.is_some(), vertices * 12);
        chunk(self.colors.is_some(), vertices * 12);
        chunk(self.uvs.is_some(), vertices * 8);
        chunk(self.indices.is_some(), self.index_count as usize * 4);
        chunk(self.skin.is_some(), vertices * MAX_INFLUENCES * 2);
        chunk(self.skin.is_some(), vertices * MAX_INFLUENCES * 4);
        chunk(
            self.skeleton.is_some(),
            self.skeleton.as_ref().map_or(0, BoneTree::encoded_size),
        );
        chunk(
            !self.animations.is_empty(),
            self.animations.iter().map(AnimationClip::encoded_size).sum(),
        );
        size
    }
}

fn check_chunk(tag: ChunkTag, actual: Option<usize>, expected: usize) -> Result<(), CiabError> {
    match actual {
        None => Ok(()),
        Some(0) => Err(CiabError::EmptyChunk(tag)),
        Some(actual) if actual != expected => Err(CiabError::LengthMismatch {
            chunk: tag,
            expected,
            actual,
        }),
        Some(_) => Ok(()),
    }
}
