//! Bone influence resolver
//!
//! Each emitted corner gets `MAX_INFLUENCES` (bone, weight) slots taken from
//! its host vertex's group memberships, in host order. Extra memberships are
//! truncated and missing ones are padded with `(0, 0.0)`.

use ciab_common::{SkinWeights, MAX_INFLUENCES};
use hashbrown::HashSet;
use serde::Deserialize;

use crate::host::MeshSnapshot;
use crate::skeleton::FlattenedSkeleton;

/// What to do with a vertex group that names no bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnmatchedGroupPolicy {
    /// Bind the slot to bone 0 with zero weight and log a warning
    #[default]
    Fallback,
    /// Fail the export
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum SkinningError {
    #[error("vertex group '{0}' does not match any bone")]
    UnmatchedGroup(String),

    #[error("vertex {vertex} is in group {group}, but the mesh has {group_count} groups")]
    GroupOutOfRange {
        vertex: u32,
        group: usize,
        group_count: usize,
    },
}

/// Resolve per-corner influences for the collected corners
pub fn resolve_influences(
    mesh: &MeshSnapshot,
    corner_sources: &[u32],
    skeleton: &FlattenedSkeleton,
    policy: UnmatchedGroupPolicy,
) -> Result<SkinWeights, SkinningError> {
    // Group index -> bone index, resolved once per export
    let group_bones: Vec<Option<u16>> = mesh
        .vertex_groups
        .iter()
        .map(|name| skeleton.index_of(name))
        .collect();

    let mut warned: HashSet<usize> = HashSet::new();
    let mut indices = Vec::with_capacity(corner_sources.len());
    let mut weights = Vec::with_capacity(corner_sources.len());

    for &source in corner_sources {
        let mut slot_bones = [0u16; MAX_INFLUENCES];
        let mut slot_weights = [0.0f32; MAX_INFLUENCES];

        // The collector already checked that every source vertex exists
        let memberships = mesh
            .vertices
            .get(source as usize)
            .map(|v| v.groups.as_slice())
            .unwrap_or_default();

        for (slot, membership) in memberships.iter().take(MAX_INFLUENCES).enumerate() {
            let bone = group_bones
                .get(membership.group)
                .ok_or(SkinningError::GroupOutOfRange {
                    vertex: source,
                    group: membership.group,
                    group_count: group_bones.len(),
                })?;

            match (bone, policy) {
                (Some(bone), _) => {
                    slot_bones[slot] = *bone;
                    slot_weights[slot] = membership.weight;
                }
                (None, UnmatchedGroupPolicy::Error) => {
                    return Err(SkinningError::UnmatchedGroup(
                        mesh.vertex_groups[membership.group].clone(),
                    ));
                }
                (None, UnmatchedGroupPolicy::Fallback) => {
                    if warned.insert(membership.group) {
                        tracing::warn!(
                            "Vertex group '{}' matches no bone, \
                             binding it to bone 0 with zero weight",
                            mesh.vertex_groups[membership.group]
                        );
                    }
                }
            }
        }

        indices.push(slot_bones);
        weights.push(slot_weights);
    }

    tracing::debug!(
        "Resolved influences for {} vertices ({} unmatched groups)",
        indices.len(),
        warned.len()
    );

    Ok(SkinWeights { indices, weights })
}
