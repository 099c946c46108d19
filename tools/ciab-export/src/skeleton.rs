//! Skeleton flattener (host bones -> bone tree)
//!
//! Bones keep their host order. Parent and child references are resolved
//! through a single name table; nothing assumes parents come first.

use ciab_common::{BoneRecord, BoneTree, MAX_BONES};
use glam::Mat4;
use hashbrown::HashMap;

use crate::axis::AxisConversion;
use crate::host::{Armature, HostBone};

#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    #[error("bone name '{0}' is used more than once")]
    DuplicateBone(String),

    #[error("bone '{bone}' has unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },

    #[error("skeleton has {0} bones, maximum is {max}", max = MAX_BONES)]
    TooManyBones(usize),
}

/// Flattened skeleton plus the name table built while flattening
#[derive(Debug, Clone)]
pub struct FlattenedSkeleton {
    pub tree: BoneTree,
    bone_indices: HashMap<String, u16>,
}

impl FlattenedSkeleton {
    /// Flattened index of a bone, by name
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.bone_indices.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// Flatten an armature into wire bone records
pub fn flatten_skeleton(
    armature: &Armature,
    axis: AxisConversion,
) -> Result<FlattenedSkeleton, SkeletonError> {
    let bones = &armature.bones;
    if bones.len() > MAX_BONES {
        return Err(SkeletonError::TooManyBones(bones.len()));
    }

    let mut bone_indices: HashMap<String, u16> = HashMap::with_capacity(bones.len());
    for (i, bone) in bones.iter().enumerate() {
        if bone_indices.insert(bone.name.clone(), i as u16).is_some() {
            return Err(SkeletonError::DuplicateBone(bone.name.clone()));
        }
    }

    let parents = bones
        .iter()
        .map(|bone| resolve_parent(bone, &bone_indices))
        .collect::<Result<Vec<_>, _>>()?;

    // Pushing in index order keeps every child list ascending
    let mut children: Vec<Vec<i16>> = vec![Vec::new(); bones.len()];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(p) = parent {
            children[*p].push(i as i16);
        }
    }

    let records = bones
        .iter()
        .zip(parents.iter())
        .zip(children)
        .map(|((bone, parent), child_indices)| {
            let offset = match parent {
                Some(p) => bones[*p].bind_matrix.inverse() * bone.bind_matrix,
                None => bone.bind_matrix,
            };
            BoneRecord {
                parent_index: parent.map_or(-1, |p| p as i16),
                child_indices,
                inverse_bind: to_wire(axis, bone.bind_matrix.inverse()),
                parent_offset: to_wire(axis, offset),
            }
        })
        .collect();

    let root_index = parents
        .iter()
        .position(Option::is_none)
        .map_or(-1, |i| i as i16);

    tracing::debug!(
        "Flattened skeleton: {} bones, root {}",
        bones.len(),
        root_index
    );

    Ok(FlattenedSkeleton {
        tree: BoneTree {
            root_index,
            bones: records,
        },
        bone_indices,
    })
}

fn resolve_parent(
    bone: &HostBone,
    bone_indices: &HashMap<String, u16>,
) -> Result<Option<usize>, SkeletonError> {
    let Some(parent) = &bone.parent else {
        return Ok(None);
    };
    bone_indices
        .get(parent.as_str())
        .map(|&i| Some(i as usize))
        .ok_or_else(|| SkeletonError::UnknownParent {
            bone: bone.name.clone(),
            parent: parent.clone(),
        })
}

fn to_wire(axis: AxisConversion, m: Mat4) -> [f32; 16] {
    axis.convert_transform(m).to_cols_array()
}
