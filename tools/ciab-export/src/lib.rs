//! ciab-export library
//!
//! Flattens a host scene (mesh, armature, actions) into a CIAB model and
//! writes it to disk. The CLI in `main.rs` is a thin layer over this.

pub mod animation;
pub mod axis;
pub mod curve;
pub mod export;
pub mod host;
pub mod import;
pub mod manifest;
pub mod mesh;
pub mod skeleton;
pub mod skinning;

// Re-export the export entry points
pub use export::{
    export_scene, export_to_file, save_ciab, with_ciab_extension, ExportError, ExportOptions,
};

// Re-export conversion knobs
pub use axis::AxisConversion;
pub use skinning::UnmatchedGroupPolicy;

// Re-export front ends
pub use import::{load_gltf, load_obj, load_scene, SourceFormat, DEFAULT_FPS};

// Re-export host scene types
pub use host::{
    Action, Armature, Channel, ChannelGroup, ChannelPath, GroupWeight, HostBone, HostVertex,
    MeshSnapshot, SceneSnapshot,
};
