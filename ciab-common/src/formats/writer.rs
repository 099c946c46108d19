//! CIAB chunk writer
//!
//! Emits the header followed by each present chunk in canonical order.
//! Absent chunks produce no bytes at all, not even a tag.

use std::io::Write;

use bytemuck::cast_slice;

use super::{AnimationClip, BoneTree, ChunkTag, CiabModel};
use crate::CiabError;

/// Write a complete CIAB buffer
///
/// The model is validated first; nothing is written if validation fails.
pub fn write_ciab<W: Write>(w: &mut W, model: &CiabModel) -> Result<(), CiabError> {
    model.validate()?;

    w.write_all(&model.header().to_bytes())?;

    if let Some(positions) = &model.positions {
        write_tag(w, ChunkTag::Positions)?;
        write_f32s(w, cast_slice(positions.as_slice()))?;
    }
    if let Some(normals) = &model.normals {
        write_tag(w, ChunkTag::Normals)?;
        write_f32s(w, cast_slice(normals.as_slice()))?;
    }
    if let Some(colors) = &model.colors {
        write_tag(w, ChunkTag::Colors)?;
        write_f32s(w, cast_slice(colors.as_slice()))?;
    }
    if let Some(uvs) = &model.uvs {
        write_tag(w, ChunkTag::TexCoords)?;
        write_f32s(w, cast_slice(uvs.as_slice()))?;
    }
    if let Some(indices) = &model.indices {
        write_tag(w, ChunkTag::Indices)?;
        for index in indices {
            w.write_all(&index.to_le_bytes())?;
        }
    }
    if let Some(skin) = &model.skin {
        write_tag(w, ChunkTag::BoneIndices)?;
        for index in cast_slice::<_, u16>(skin.indices.as_slice()) {
            w.write_all(&index.to_le_bytes())?;
        }
        write_tag(w, ChunkTag::BoneWeights)?;
        write_f32s(w, cast_slice(skin.weights.as_slice()))?;
    }
    if let Some(skeleton) = &model.skeleton {
        write_tag(w, ChunkTag::BoneTree)?;
        write_bone_tree(w, skeleton)?;
    }
    if !model.animations.is_empty() {
        write_tag(w, ChunkTag::Animations)?;
        for clip in &model.animations {
            write_animation(w, clip)?;
        }
    }

    Ok(())
}

/// Encode a model into a fresh buffer
pub fn encode_ciab(model: &CiabModel) -> Result<Vec<u8>, CiabError> {
    let mut buffer = Vec::with_capacity(model.encoded_size());
    write_ciab(&mut buffer, model)?;
    debug_assert_eq!(buffer.len(), model.encoded_size());
    tracing::debug!(
        "Encoded CIAB buffer: {} bytes, chunks {:?}",
        buffer.len(),
        model.present_chunks()
    );
    Ok(buffer)
}

fn write_tag<W: Write>(w: &mut W, tag: ChunkTag) -> Result<(), CiabError> {
    w.write_all(&[tag.as_u8()])?;
    Ok(())
}

fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> Result<(), CiabError> {
    for value in values {
        w.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn write_bone_tree<W: Write>(w: &mut W, tree: &BoneTree) -> Result<(), CiabError> {
    w.write_all(&tree.root_index.to_le_bytes())?;
    for bone in &tree.bones {
        w.write_all(&bone.parent_index.to_le_bytes())?;
        w.write_all(&(bone.child_indices.len() as i16).to_le_bytes())?;
        for child in &bone.child_indices {
            w.write_all(&child.to_le_bytes())?;
        }
        write_f32s(w, &bone.inverse_bind)?;
        write_f32s(w, &bone.parent_offset)?;
    }
    Ok(())
}

fn write_animation<W: Write>(w: &mut W, clip: &AnimationClip) -> Result<(), CiabError> {
    w.write_all(&clip.header().to_bytes())?;
    for track in &clip.tracks {
        for sample in track {
            w.write_all(&sample.to_bytes())?;
        }
    }
    Ok(())
}
