//! glTF/GLB front end
//!
//! Reads the first mesh primitive, the first skin and every animation.
//! Joint rest poses are the joints' local TRS, and animation channels are
//! stored relative to them, so the sampler's `head + delta` and
//! `rest * delta` composition reproduces the animated local transform.

use anyhow::{bail, Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation as GltfInterpolation;
use hashbrown::{HashMap, HashSet};
use std::path::Path;

use crate::host::{
    Action, Armature, Channel, ChannelGroup, ChannelPath, GroupWeight, HostBone, HostVertex,
    Interpolation, Keyframe, KeyframeCurve, MeshSnapshot, SceneSnapshot,
};

/// Frame rate used to turn keyframe times into frames when none is given
pub const DEFAULT_FPS: u32 = 30;

/// Skin joints in skin order, keyed by node index
struct JointTable {
    names: Vec<String>,
    by_node: HashMap<usize, usize>,
}

/// Load a glTF/GLB file into a scene snapshot
pub fn load_gltf(input: &Path, fps: u32) -> Result<SceneSnapshot> {
    if fps == 0 {
        bail!("Frame rate must be non-zero");
    }
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let skeleton = match document.skins().next() {
        Some(skin) => Some(read_skeleton(&document, &skin, &buffers)?),
        None => None,
    };
    let joints = skeleton.as_ref().map(|(_, joints)| joints);

    let mesh = read_mesh(&document, &buffers, joints)?;

    let actions = match &skeleton {
        Some((armature, joints)) => document
            .animations()
            .map(|animation| read_action(&animation, &buffers, joints, armature, fps))
            .collect::<Result<Vec<_>>>()?,
        None => {
            if document.animations().next().is_some() {
                tracing::warn!("glTF has animations but no skin, ignoring animations");
            }
            Vec::new()
        }
    };

    tracing::info!(
        "Loaded glTF scene: {} triangles, {} bones, {} animations",
        mesh.faces.len(),
        skeleton.as_ref().map_or(0, |(armature, _)| armature.bones.len()),
        actions.len()
    );

    Ok(SceneSnapshot {
        mesh: Some(mesh),
        armature: skeleton.map(|(armature, _)| armature),
        actions,
        fps,
    })
}

fn read_mesh(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    joints: Option<&JointTable>,
) -> Result<MeshSnapshot> {
    // Get the first mesh
    let mesh = document
        .meshes()
        .next()
        .context("No meshes found in glTF")?;
    let primitive = mesh
        .primitives()
        .next()
        .context("No primitives found in mesh")?;
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        bail!(
            "Primitive mode {:?} is not supported, only triangle lists",
            primitive.mode()
        );
    }

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    // Positions and normals (required)
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("No positions in mesh")?
        .collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .context("No normals in mesh; export the glTF with normals")?
        .collect();
    if normals.len() != positions.len() {
        bail!(
            "Mesh has {} normals for {} positions",
            normals.len(),
            positions.len()
        );
    }
    let vertex_count = positions.len();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..vertex_count as u32).collect(),
    };
    if indices.len() % 3 != 0 {
        bail!("Index count {} is not a multiple of 3", indices.len());
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        bail!("Index {} out of range for {} vertices", bad, vertex_count);
    }
    let faces: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .collect();

    // UVs and colors (optional), spread onto face corners
    let uvs: Option<Vec<[f32; 2]>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().collect());
    let colors: Option<Vec<[f32; 3]>> = reader
        .read_colors(0)
        .map(|iter| iter.into_rgb_f32().collect());
    let uv_layer = corner_layer(&faces, uvs, vertex_count, "TEXCOORD_0");
    let color_layer = corner_layer(&faces, colors, vertex_count, "COLOR_0");

    // Skinning (optional): one vertex group per joint, in skin order
    let joint_sets = reader.read_joints(0).map(|iter| iter.into_u16());
    let weight_sets = reader.read_weights(0).map(|iter| iter.into_f32());
    let (groups, vertex_groups): (Vec<Vec<GroupWeight>>, Vec<String>) =
        match (joints, joint_sets, weight_sets) {
            (Some(joints), Some(joint_sets), Some(weight_sets)) => {
                let groups = joint_sets
                    .zip(weight_sets)
                    .map(|(joint, weight)| {
                        (0..4)
                            .filter(|&k| weight[k] > 0.0)
                            .map(|k| GroupWeight {
                                group: joint[k] as usize,
                                weight: weight[k],
                            })
                            .collect()
                    })
                    .collect();
                (groups, joints.names.clone())
            }
            (Some(_), Some(_), None) | (Some(_), None, Some(_)) => {
                tracing::warn!(
                    "Mesh has partial skinning data (joints or weights missing), ignoring skinning"
                );
                (Vec::new(), Vec::new())
            }
            (None, Some(_), _) => {
                tracing::warn!("Mesh has JOINTS_0 but the glTF has no skin, ignoring skinning");
                (Vec::new(), Vec::new())
            }
            _ => (Vec::new(), Vec::new()),
        };

    let mut groups = groups.into_iter();
    let vertices = positions
        .into_iter()
        .zip(normals)
        .map(|(position, normal)| HostVertex {
            position: Vec3::from_array(position),
            normal: Vec3::from_array(normal),
            groups: groups.next().unwrap_or_default(),
        })
        .collect();

    Ok(MeshSnapshot {
        vertices,
        faces,
        uv_layer,
        color_layer,
        vertex_groups,
    })
}

/// Spread a per-vertex attribute onto face corners
fn corner_layer<T: Copy>(
    faces: &[[u32; 3]],
    values: Option<Vec<T>>,
    vertex_count: usize,
    semantic: &str,
) -> Option<Vec<[T; 3]>> {
    let values = values?;
    if values.len() != vertex_count {
        tracing::warn!(
            "Mesh has mismatched {} count ({} vs {} vertices), ignoring it",
            semantic,
            values.len(),
            vertex_count
        );
        return None;
    }
    Some(
        faces
            .iter()
            .map(|face| face.map(|i| values[i as usize]))
            .collect(),
    )
}

fn read_skeleton(
    document: &gltf::Document,
    skin: &gltf::Skin,
    buffers: &[gltf::buffer::Data],
) -> Result<(Armature, JointTable)> {
    let joints: Vec<gltf::Node> = skin.joints().collect();
    let names = joint_names(&joints);
    let by_node: HashMap<usize, usize> = joints
        .iter()
        .enumerate()
        .map(|(i, joint)| (joint.index(), i))
        .collect();

    let mut parent_of: HashMap<usize, usize> = HashMap::new();
    for node in document.nodes() {
        for child in node.children() {
            parent_of.insert(child.index(), node.index());
        }
    }

    // Missing inverse bind matrices mean identity
    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let inverse_binds: Vec<Mat4> = match reader.read_inverse_bind_matrices() {
        Some(iter) => iter.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
        None => vec![Mat4::IDENTITY; joints.len()],
    };
    if inverse_binds.len() < joints.len() {
        bail!(
            "Skin has {} inverse bind matrices for {} joints",
            inverse_binds.len(),
            joints.len()
        );
    }

    let bones = joints
        .iter()
        .zip(&inverse_binds)
        .enumerate()
        .map(|(i, (joint, inverse_bind))| {
            // A joint whose parent node is not a joint is a root
            let parent = parent_of
                .get(&joint.index())
                .and_then(|parent| by_node.get(parent))
                .map(|&p| names[p].clone());
            let (translation, rotation, _scale) = joint.transform().decomposed();
            HostBone {
                name: names[i].clone(),
                parent,
                bind_matrix: inverse_bind.inverse(),
                head: Vec3::from_array(translation),
                rest_rotation: Quat::from_array(rotation),
            }
        })
        .collect();

    tracing::debug!(
        "Read skin '{}': {} joints",
        skin.name().unwrap_or("unnamed"),
        joints.len()
    );

    Ok((Armature { bones }, JointTable { names, by_node }))
}

/// Joint names, made unique so the name table cannot alias two joints
fn joint_names(joints: &[gltf::Node]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    joints
        .iter()
        .map(|joint| {
            let base = joint
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("joint_{}", joint.index()));
            let name = if seen.contains(&base) {
                format!("{}_{}", base, joint.index())
            } else {
                base
            };
            seen.insert(name.clone());
            name
        })
        .collect()
}

fn read_action(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
    joints: &JointTable,
    armature: &Armature,
    fps: u32,
) -> Result<Action> {
    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation_{}", animation.index()));

    let mut groups: Vec<ChannelGroup> = joints
        .names
        .iter()
        .map(|joint| ChannelGroup {
            name: joint.clone(),
            channels: Vec::new(),
        })
        .collect();
    let mut max_time: Option<f32> = None;

    for channel in animation.channels() {
        // Skip if not a joint in our skin
        let node = channel.target().node().index();
        let Some(&bone) = joints.by_node.get(&node) else {
            continue;
        };
        let rest = &armature.bones[bone];

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .context("Animation channel has no keyframe times")?
            .collect();
        if let Some(&last) = times.last() {
            max_time = Some(max_time.map_or(last, |t: f32| t.max(last)));
        }

        let interpolation = channel.sampler().interpolation();
        let cubic = interpolation == GltfInterpolation::CubicSpline;
        // Cubic spline outputs are (in-tangent, value, out-tangent) triples
        let is_tangent = |j: usize| cubic && j % 3 != 1;

        let (path, components): (ChannelPath, Vec<Vec<f32>>) =
            match reader.read_outputs().context("Animation channel has no outputs")? {
                ReadOutputs::Translations(iter) => {
                    let deltas = iter.enumerate().map(|(j, v)| {
                        let v = Vec3::from_array(v);
                        let delta = if is_tangent(j) { v } else { v - rest.head };
                        delta.to_array()
                    });
                    (ChannelPath::Location, split_components(deltas))
                }
                ReadOutputs::Rotations(rotations) => {
                    let inverse_rest = rest.rest_rotation.inverse();
                    let deltas = rotations.into_f32().map(|q| {
                        let d = inverse_rest * Quat::from_array(q);
                        [d.w, d.x, d.y, d.z]
                    });
                    (ChannelPath::RotationQuaternion, split_components(deltas))
                }
                ReadOutputs::Scales(iter) => (ChannelPath::Scale, split_components(iter)),
                ReadOutputs::MorphTargetWeights(_) => continue,
            };

        for (index, values) in components.into_iter().enumerate() {
            let curve = build_curve(&times, &values, interpolation, fps)
                .with_context(|| format!("Animation '{}' joint '{}'", name, rest.name))?;
            groups[bone].channels.push(Channel {
                path: path.clone(),
                index,
                curve,
            });
        }
    }

    groups.retain(|group| !group.channels.is_empty());

    // Include the frame of the last key
    let frame_range = match max_time {
        Some(t) => (0.0, (t * fps as f32).round() + 1.0),
        None => (0.0, 0.0),
    };

    Ok(Action {
        name,
        frame_range,
        groups,
    })
}

/// Split `[f32; N]` outputs into one value list per component
fn split_components<const N: usize>(values: impl Iterator<Item = [f32; N]>) -> Vec<Vec<f32>> {
    let mut components = vec![Vec::new(); N];
    for value in values {
        for (component, v) in components.iter_mut().zip(value) {
            component.push(v);
        }
    }
    components
}

/// Build a frame-based curve from glTF keyframe times (seconds) and values
fn build_curve(
    times: &[f32],
    values: &[f32],
    interpolation: GltfInterpolation,
    fps: u32,
) -> Result<KeyframeCurve> {
    let fps = fps as f32;
    let frames: Vec<f32> = times.iter().map(|t| t * fps).collect();

    let keys = match interpolation {
        GltfInterpolation::Step | GltfInterpolation::Linear => {
            if values.len() != times.len() {
                bail!("{} values for {} keyframes", values.len(), times.len());
            }
            let mode = if interpolation == GltfInterpolation::Step {
                Interpolation::Constant
            } else {
                Interpolation::Linear
            };
            frames
                .iter()
                .zip(values)
                .map(|(&frame, &value)| Keyframe::new(frame, value, mode))
                .collect()
        }
        GltfInterpolation::CubicSpline => {
            if values.len() != times.len() * 3 {
                bail!("{} values for {} cubic spline keyframes", values.len(), times.len());
            }
            // Hermite tangents become Bézier handles one third along each segment
            (0..times.len())
                .map(|k| {
                    let value = values[3 * k + 1];
                    let dt_before = if k > 0 { times[k] - times[k - 1] } else { 0.0 };
                    let dt_after = times.get(k + 1).map_or(0.0, |t| t - times[k]);
                    let left = [
                        frames[k] - dt_before * fps / 3.0,
                        value - values[3 * k] * dt_before / 3.0,
                    ];
                    let right = [
                        frames[k] + dt_after * fps / 3.0,
                        value + values[3 * k + 2] * dt_after / 3.0,
                    ];
                    Keyframe::new(frames[k], value, Interpolation::Bezier).with_handles(left, right)
                })
                .collect()
        }
    };

    Ok(KeyframeCurve::new(keys))
}
