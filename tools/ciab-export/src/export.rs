//! Export orchestration (scene snapshot -> CIAB model -> file)

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use ciab_common::{encode_ciab, non_empty, CiabError, CiabModel, CIAB_EXT};

use crate::animation::sample_actions;
use crate::axis::AxisConversion;
use crate::host::SceneSnapshot;
use crate::mesh::{collect_vertices, MeshError};
use crate::skeleton::{flatten_skeleton, SkeletonError};
use crate::skinning::{resolve_influences, SkinningError, UnmatchedGroupPolicy};

/// Knobs for one export call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub axis: AxisConversion,
    /// Replaces the scene frame rate when set
    pub fps_override: Option<u32>,
    pub unmatched_groups: UnmatchedGroupPolicy,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("scene has no mesh to export")]
    NoMesh,

    #[error("output path is empty")]
    EmptyOutputPath,

    #[error("frame rate must be non-zero")]
    ZeroFrameRate,

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Skeleton(#[from] SkeletonError),

    #[error(transparent)]
    Skinning(#[from] SkinningError),

    #[error(transparent)]
    Codec(#[from] CiabError),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Build the CIAB model for a scene without touching the filesystem
pub fn export_scene(
    scene: &SceneSnapshot,
    options: &ExportOptions,
) -> Result<CiabModel, ExportError> {
    let mesh = scene.mesh.as_ref().ok_or(ExportError::NoMesh)?;
    let fps = options.fps_override.unwrap_or(scene.fps);
    if fps == 0 {
        return Err(ExportError::ZeroFrameRate);
    }

    let collected = collect_vertices(mesh, options.axis)?;

    let skeleton = scene
        .armature
        .as_ref()
        .map(|armature| flatten_skeleton(armature, options.axis))
        .transpose()?
        .filter(|skeleton| !skeleton.is_empty());

    let skin = match &skeleton {
        Some(skeleton) if collected.vertex_count() > 0 => Some(resolve_influences(
            mesh,
            &collected.corner_sources,
            skeleton,
            options.unmatched_groups,
        )?),
        _ => None,
    };

    let animations = match (&skeleton, &scene.armature) {
        (Some(_), Some(armature)) => sample_actions(&scene.actions, armature, fps, options.axis),
        _ => {
            if !scene.actions.is_empty() {
                tracing::warn!(
                    "Dropping {} actions: the scene has no armature to animate",
                    scene.actions.len()
                );
            }
            Vec::new()
        }
    };

    let vertex_count = collected.vertex_count() as u32;
    let model = CiabModel {
        vertex_count,
        index_count: collected.indices.len() as u32,
        bone_count: skeleton.as_ref().map_or(0, |s| s.len() as u32),
        positions: non_empty(collected.positions),
        normals: non_empty(collected.normals),
        colors: collected.colors.and_then(non_empty),
        uvs: collected.uvs.and_then(non_empty),
        indices: non_empty(collected.indices),
        skin,
        skeleton: skeleton.map(|s| s.tree),
        animations,
    };
    model.validate()?;

    tracing::debug!("Export chunks: {:?}", model.present_chunks());
    Ok(model)
}

/// Append the `.ciab` extension unless the path already ends with it
pub fn with_ciab_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CIAB_EXT));
    if has_ext {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(CIAB_EXT);
    PathBuf::from(name)
}

/// Encode a model and write it atomically
///
/// The bytes go to a temporary file in the destination directory, which is
/// renamed over the target only once fully written.
pub fn save_ciab(model: &CiabModel, path: &Path) -> Result<PathBuf, ExportError> {
    if path.as_os_str().is_empty() {
        return Err(ExportError::EmptyOutputPath);
    }
    let path = with_ciab_extension(path);
    let bytes = encode_ciab(model)?;

    let io_err = |source| ExportError::Io {
        path: path.clone(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(&path).map_err(|e| io_err(e.error))?;

    Ok(path)
}

/// Export a scene straight to disk, returning the path actually written
pub fn export_to_file(
    scene: &SceneSnapshot,
    options: &ExportOptions,
    path: &Path,
) -> Result<PathBuf, ExportError> {
    // Fail on a bad destination before doing any work
    if path.as_os_str().is_empty() {
        return Err(ExportError::EmptyOutputPath);
    }

    let model = export_scene(scene, options)?;
    let written = save_ciab(&model, path)?;

    tracing::info!(
        "Exported CIAB: {} vertices, {} bones, {} animations -> {:?}",
        model.vertex_count,
        model.bone_count,
        model.animations.len(),
        written
    );
    Ok(written)
}
