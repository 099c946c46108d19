//! Animation sampler (actions -> dense per-bone tracks)
//!
//! Every bone gets one sample per integer frame in `[start, end)`. Bones the
//! action does not touch keep the neutral pose on top of their rest pose.

use ciab_common::{AnimationClip, KeySample};
use glam::{Quat, Vec3};
use hashbrown::HashMap;
use rayon::prelude::*;

use crate::axis::{normalize_or_identity, quat_to_wxyz, AxisConversion};
use crate::host::{Action, Armature, ChannelCurve, ChannelGroup, ChannelPath, HostBone};

/// Pose components for one bone at one frame, before rest composition
#[derive(Debug, Clone, Copy, PartialEq)]
struct SampledPose {
    translation: [f32; 3],
    /// w, x, y, z
    rotation: [f32; 4],
    scale: [f32; 3],
}

impl SampledPose {
    const NEUTRAL: Self = Self {
        translation: [0.0; 3],
        rotation: [1.0, 0.0, 0.0, 0.0],
        scale: [1.0; 3],
    };
}

/// Integer frame span of an action, truncated toward zero
pub fn frame_span(action: &Action) -> (i64, u32) {
    let start = action.frame_range.0.trunc() as i64;
    let end = action.frame_range.1.trunc() as i64;
    let count = (end - start).clamp(0, u32::MAX as i64) as u32;
    (start, count)
}

/// Sample one action for every bone of the armature, in flattened order
pub fn sample_action(
    action: &Action,
    armature: &Armature,
    fps: u32,
    axis: AxisConversion,
) -> AnimationClip {
    let (start, key_count) = frame_span(action);

    let groups: HashMap<&str, &ChannelGroup> = action
        .groups
        .iter()
        .map(|group| (group.name.as_str(), group))
        .collect();

    let tracks = armature
        .bones
        .iter()
        .map(|bone| {
            let group = groups.get(bone.name.as_str()).copied();
            (0..key_count)
                .map(|i| {
                    let frame = start + i as i64;
                    let pose = group
                        .map_or(SampledPose::NEUTRAL, |g| sample_group(g, frame as f32));
                    compose(bone, &pose, frame, fps, axis)
                })
                .collect()
        })
        .collect();

    tracing::debug!(
        "Sampled action '{}': {} bones x {} frames from frame {}",
        action.name,
        armature.bones.len(),
        key_count,
        start
    );

    AnimationClip {
        fps,
        key_count,
        tracks,
    }
}

/// Sample all actions in parallel; output order matches `actions`
pub fn sample_actions(
    actions: &[Action],
    armature: &Armature,
    fps: u32,
    axis: AxisConversion,
) -> Vec<AnimationClip> {
    actions
        .par_iter()
        .map(|action| sample_action(action, armature, fps, axis))
        .collect()
}

fn sample_group(group: &ChannelGroup, frame: f32) -> SampledPose {
    let mut pose = SampledPose::NEUTRAL;
    for channel in &group.channels {
        let slot = match channel.path {
            ChannelPath::Location => pose.translation.get_mut(channel.index),
            ChannelPath::RotationQuaternion => pose.rotation.get_mut(channel.index),
            ChannelPath::Scale => pose.scale.get_mut(channel.index),
            ChannelPath::Other(_) => None,
        };
        if let Some(slot) = slot {
            *slot = channel.curve.evaluate(frame);
        }
    }
    pose
}

fn compose(
    bone: &HostBone,
    pose: &SampledPose,
    frame: i64,
    fps: u32,
    axis: AxisConversion,
) -> KeySample {
    let [w, x, y, z] = pose.rotation;
    let translation = bone.head + Vec3::from_array(pose.translation);
    let rotation = normalize_or_identity(bone.rest_rotation * Quat::from_xyzw(x, y, z, w));

    KeySample {
        time: frame as f32 / fps as f32,
        position: axis.convert_vector(translation).to_array(),
        rotation: quat_to_wxyz(axis.convert_quaternion(rotation)),
        scale: pose.scale,
    }
}
