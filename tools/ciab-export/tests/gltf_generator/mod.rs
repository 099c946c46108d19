//! Programmatic GLB generation for integration tests.
//!
//! The skinned scene is a unit quad in the XY plane bound to a two-bone
//! chain (Root -> Arm, Arm one unit up) with a one second "Wave" animation:
//! Root translates from the origin to (0, 2, 0) and Arm rotates a quarter
//! turn about Z.

#![allow(dead_code)]

mod buffer;

use buffer::BufferBuilder;
use gltf_json as json;
use json::accessor::Type;
use json::validation::Checked::Valid;
use std::collections::BTreeMap;

pub const BONE_NAMES: [&str; 2] = ["Root", "Arm"];
pub const ARM_HEIGHT: f32 = 1.0;
pub const ANIMATION_SECONDS: f32 = 1.0;

pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Bottom vertices follow Root, top vertices are mostly Arm
pub const QUAD_JOINTS: [[u16; 4]; 4] = [[0, 0, 0, 0], [0, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0]];
pub const QUAD_WEIGHTS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0, 0.0],
    [0.75, 0.25, 0.0, 0.0],
    [0.75, 0.25, 0.0, 0.0],
];

/// Skinned, animated quad with UVs
pub fn generate_skinned_glb() -> Vec<u8> {
    build_glb(true)
}

/// The same quad with vertex colors and no skin or animation
pub fn generate_static_glb() -> Vec<u8> {
    build_glb(false)
}

fn build_glb(skinned: bool) -> Vec<u8> {
    let mut buffer = BufferBuilder::default();

    let positions = buffer.vertex_f32(&QUAD_POSITIONS, Type::Vec3, true);
    let normals = buffer.vertex_f32(&[[0.0, 0.0, 1.0]; 4], Type::Vec3, false);
    let indices = buffer.indices(&QUAD_INDICES);

    let mut attributes = BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);
    attributes.insert(Valid(json::mesh::Semantic::Normals), normals);

    if skinned {
        let uvs = buffer.vertex_f32(
            &[[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
            Type::Vec2,
            false,
        );
        let joints = buffer.joints(&QUAD_JOINTS);
        let weights = buffer.vertex_f32(&QUAD_WEIGHTS, Type::Vec4, false);
        attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), uvs);
        attributes.insert(Valid(json::mesh::Semantic::Joints(0)), joints);
        attributes.insert(Valid(json::mesh::Semantic::Weights(0)), weights);
    } else {
        let colors = buffer.vertex_f32(
            &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.0]],
            Type::Vec3,
            false,
        );
        attributes.insert(Valid(json::mesh::Semantic::Colors(0)), colors);
    }

    let meshes = vec![json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Quad".to_string()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(indices),
            material: None,
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    }];

    let (nodes, scene_nodes, skins, animations) = if skinned {
        skinned_parts(&mut buffer)
    } else {
        (
            vec![node("Quad", None, None, Some(0), false)],
            vec![json::Index::new(0)],
            Vec::new(),
            Vec::new(),
        )
    };

    let root = json::Root {
        accessors: Vec::new(),
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("ciab-export-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        // Accessors, views and the buffer are filled in by `into_glb`
        buffers: Vec::new(),
        buffer_views: Vec::new(),
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some("TestScene".to_string()),
            nodes: scene_nodes,
        }],
        skins,
        textures: Vec::new(),
    };

    buffer.into_glb(root)
}

type SkinnedParts = (
    Vec<json::Node>,
    Vec<json::Index<json::Node>>,
    Vec<json::Skin>,
    Vec<json::Animation>,
);

fn skinned_parts(buffer: &mut BufferBuilder) -> SkinnedParts {
    // Node 0: Root, node 1: Arm, node 2: the skinned mesh
    let nodes = vec![
        node("Root", Some([0.0, 0.0, 0.0]), Some(vec![1]), None, false),
        node("Arm", Some([0.0, ARM_HEIGHT, 0.0]), None, None, false),
        node("Quad", None, None, Some(0), true),
    ];

    // Column-major inverse bind matrices
    let mut arm_ibm = identity();
    arm_ibm[13] = -ARM_HEIGHT;
    let ibms = buffer.data_f32(&[identity(), arm_ibm], Type::Mat4, false);

    let skins = vec![json::Skin {
        extensions: Default::default(),
        extras: Default::default(),
        inverse_bind_matrices: Some(ibms),
        joints: vec![json::Index::new(0), json::Index::new(1)],
        name: Some("Chain".to_string()),
        skeleton: Some(json::Index::new(0)),
    }];

    let s = std::f32::consts::FRAC_1_SQRT_2;
    let times = buffer.data_f32(&[[0.0], [ANIMATION_SECONDS]], Type::Scalar, true);
    let root_translation =
        buffer.data_f32(&[[0.0, 0.0, 0.0], [0.0, 2.0, 0.0]], Type::Vec3, false);
    let arm_rotation =
        buffer.data_f32(&[[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, s, s]], Type::Vec4, false);

    let tracks = [
        (0, json::animation::Property::Translation, root_translation),
        (1, json::animation::Property::Rotation, arm_rotation),
    ];
    let mut samplers = Vec::new();
    let mut channels = Vec::new();
    for (node_index, property, output) in tracks {
        samplers.push(json::animation::Sampler {
            input: times,
            interpolation: Valid(json::animation::Interpolation::Linear),
            output,
            extensions: Default::default(),
            extras: Default::default(),
        });
        channels.push(json::animation::Channel {
            sampler: json::Index::new(samplers.len() as u32 - 1),
            target: json::animation::Target {
                node: json::Index::new(node_index),
                path: Valid(property),
                extensions: Default::default(),
                extras: Default::default(),
            },
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    let animations = vec![json::Animation {
        channels,
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Wave".to_string()),
        samplers,
    }];

    (
        nodes,
        vec![json::Index::new(0), json::Index::new(2)],
        skins,
        animations,
    )
}

fn node(
    name: &str,
    translation: Option<[f32; 3]>,
    children: Option<Vec<u32>>,
    mesh: Option<u32>,
    skinned: bool,
) -> json::Node {
    json::Node {
        camera: None,
        children: children.map(|c| c.into_iter().map(json::Index::new).collect()),
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: mesh.map(json::Index::new),
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        translation,
        skin: skinned.then(|| json::Index::new(0)),
        weights: None,
    }
}

fn identity() -> [f32; 16] {
    let mut m = [0.0; 16];
    for i in 0..4 {
        m[i * 5] = 1.0;
    }
    m
}
