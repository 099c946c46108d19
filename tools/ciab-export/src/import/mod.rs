//! Scene front ends (glTF/GLB, OBJ -> scene snapshot)

mod gltf;
mod obj;

use anyhow::{bail, Result};
use std::path::Path;

pub use self::gltf::{load_gltf, DEFAULT_FPS};
pub use self::obj::load_obj;

use crate::host::SceneSnapshot;

/// Source formats the exporter can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Gltf,
    Obj,
}

impl SourceFormat {
    /// Detect format by extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "gltf" | "glb" => Some(Self::Gltf),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

/// Load any supported source file into a scene snapshot
///
/// `fps` is the rate glTF keyframe times are converted to frames with; OBJ
/// files carry no animation and simply record it.
pub fn load_scene(path: &Path, fps: u32) -> Result<SceneSnapshot> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Gltf) => load_gltf(path, fps),
        Some(SourceFormat::Obj) => load_obj(path, fps),
        None => bail!(
            "Unsupported source format: {:?} (use .gltf, .glb, or .obj)",
            path
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_path(Path::new("a/b.GLB")), Some(SourceFormat::Gltf));
        assert_eq!(SourceFormat::from_path(Path::new("b.gltf")), Some(SourceFormat::Gltf));
        assert_eq!(SourceFormat::from_path(Path::new("c.obj")), Some(SourceFormat::Obj));
        assert_eq!(SourceFormat::from_path(Path::new("d.fbx")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        assert!(load_scene(Path::new("model.fbx"), 30).is_err());
    }
}
