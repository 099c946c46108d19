//! Read-only snapshot of a host scene
//!
//! Front ends (glTF, OBJ, or a DCC plugin) fill these types once; the export
//! pipeline never reaches back into the host.

use glam::{Mat4, Quat, Vec3};

pub use crate::curve::{ChannelCurve, Interpolation, Keyframe, KeyframeCurve};

/// Everything one export call consumes
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    /// The finalized, triangulated mesh
    pub mesh: Option<MeshSnapshot>,
    pub armature: Option<Armature>,
    pub actions: Vec<Action>,
    /// Scene frame rate
    pub fps: u32,
}

/// One vertex group membership
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupWeight {
    /// Index into [`MeshSnapshot::vertex_groups`]
    pub group: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostVertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Memberships in host order
    pub groups: Vec<GroupWeight>,
}

impl HostVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshSnapshot {
    pub vertices: Vec<HostVertex>,
    /// Triangles as host vertex indices
    pub faces: Vec<[u32; 3]>,
    /// Per face, per corner UV
    pub uv_layer: Option<Vec<[[f32; 2]; 3]>>,
    /// Per face, per corner RGB
    pub color_layer: Option<Vec<[[f32; 3]; 3]>>,
    /// Vertex group names, indexed by [`GroupWeight::group`]
    pub vertex_groups: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Armature {
    pub bones: Vec<HostBone>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostBone {
    pub name: String,
    pub parent: Option<String>,
    /// Armature-space bind pose
    pub bind_matrix: Mat4,
    /// Rest head; sampled translations are added to it
    pub head: Vec3,
    /// Rest orientation; sampled rotations are applied after it
    pub rest_rotation: Quat,
}

impl HostBone {
    /// Bone whose rest head and orientation come from its bind matrix
    pub fn from_bind_matrix(
        name: impl Into<String>,
        parent: Option<String>,
        bind_matrix: Mat4,
    ) -> Self {
        let (_scale, rest_rotation, head) = bind_matrix.to_scale_rotation_translation();
        Self {
            name: name.into(),
            parent,
            bind_matrix,
            head,
            rest_rotation,
        }
    }
}

/// Which pose component a channel drives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPath {
    Location,
    /// Components are ordered w, x, y, z
    RotationQuaternion,
    Scale,
    /// Anything else (euler rotation, custom properties); ignored by the sampler
    Other(String),
}

impl ChannelPath {
    /// Parse the trailing property of a host data path such as
    /// `pose.bones["Arm"].location`
    pub fn from_data_path(path: &str) -> Self {
        let property = path.rsplit('.').next().unwrap_or(path);
        match property {
            "location" => Self::Location,
            "rotation_quaternion" => Self::RotationQuaternion,
            "scale" => Self::Scale,
            _ => Self::Other(path.to_string()),
        }
    }
}

/// One animated scalar
#[derive(Debug, Clone)]
pub struct Channel {
    pub path: ChannelPath,
    /// Component index within the path
    pub index: usize,
    pub curve: KeyframeCurve,
}

/// Channels grouped under a bone name
#[derive(Debug, Clone, Default)]
pub struct ChannelGroup {
    pub name: String,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default)]
pub struct Action {
    pub name: String,
    /// `[start, end)` in frames; fractional bounds truncate toward zero
    pub frame_range: (f32, f32),
    pub groups: Vec<ChannelGroup>,
}
