//! Bone tree chunk (tag 10)
//!
//! # Layout
//! ```text
//! root_index i16                    - First bone without a parent, -1 if none
//! per bone:
//!   parent_index i16                - -1 for a root
//!   child_count i16
//!   child_indices i16 × child_count
//!   inverse_bind f32 × 16           - column-major
//!   parent_offset f32 × 16          - column-major, local transform relative to the parent
//! ```

use crate::CiabError;

/// Floats in one column-major 4×4 matrix
pub const MATRIX_FLOATS: usize = 16;

/// Largest bone count addressable by the i16 indices of the bone tree
pub const MAX_BONES: usize = i16::MAX as usize;

/// Column-major identity, handy for tests and defaults
pub const IDENTITY_MATRIX: [f32; MATRIX_FLOATS] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// One flattened bone
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRecord {
    pub parent_index: i16,
    pub child_indices: Vec<i16>,
    /// Maps model space into bone space (target convention)
    pub inverse_bind: [f32; MATRIX_FLOATS],
    /// Bone transform relative to its parent (target convention)
    pub parent_offset: [f32; MATRIX_FLOATS],
}

impl BoneRecord {
    /// Size of the fixed part (parent + child count + two matrices)
    pub const FIXED_SIZE: usize = 4 + 2 * MATRIX_FLOATS * 4;

    pub fn encoded_size(&self) -> usize {
        Self::FIXED_SIZE + self.child_indices.len() * 2
    }

    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }
}

/// Flattened skeleton, index-stable
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTree {
    pub root_index: i16,
    pub bones: Vec<BoneRecord>,
}

impl BoneTree {
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Size of the chunk payload (without the tag byte)
    pub fn encoded_size(&self) -> usize {
        2 + self.bones.iter().map(BoneRecord::encoded_size).sum::<usize>()
    }

    /// Check that every referenced index points inside the skeleton and that
    /// parent and child links agree.
    pub fn validate(&self) -> Result<(), CiabError> {
        let count = self.bones.len();
        let in_range = |index: i16| index >= 0 && (index as usize) < count;

        if count > MAX_BONES {
            return Err(CiabError::InvalidBoneTree(format!(
                "{} bones exceed the maximum of {}",
                count, MAX_BONES
            )));
        }
        if self.root_index != -1 && !in_range(self.root_index) {
            return Err(CiabError::InvalidBoneTree(format!(
                "root index {} out of range for {} bones",
                self.root_index, count
            )));
        }
        if in_range(self.root_index) && !self.bones[self.root_index as usize].is_root() {
            return Err(CiabError::InvalidBoneTree(format!(
                "root index {} names a bone with a parent",
                self.root_index
            )));
        }
        for (i, bone) in self.bones.iter().enumerate() {
            if bone.parent_index != -1 && !in_range(bone.parent_index) {
                return Err(CiabError::InvalidBoneTree(format!(
                    "bone {} has parent {} out of range",
                    i, bone.parent_index
                )));
            }
            if let Some(&child) = bone.child_indices.iter().find(|&&c| !in_range(c)) {
                return Err(CiabError::InvalidBoneTree(format!(
                    "bone {} has child {} out of range",
                    i, child
                )));
            }
        }

        // Indices are all in range from here on
        for (i, bone) in self.bones.iter().enumerate() {
            let index = i as i16;
            if !bone.is_root() {
                let parent = &self.bones[bone.parent_index as usize];
                if !parent.child_indices.contains(&index) {
                    return Err(CiabError::InvalidBoneTree(format!(
                        "bone {} has parent {}, which does not list it as a child",
                        i, bone.parent_index
                    )));
                }
            }
            if let Some(&child) = bone
                .child_indices
                .iter()
                .find(|&&c| self.bones[c as usize].parent_index != index)
            {
                return Err(CiabError::InvalidBoneTree(format!(
                    "bone {} lists child {}, whose parent is {}",
                    i, child, self.bones[child as usize].parent_index
                )));
            }
        }
        Ok(())
    }
}
