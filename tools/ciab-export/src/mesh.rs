//! Vertex attribute collector
//!
//! Emits one output vertex per triangle corner, in face order. Vertices are
//! never deduplicated, so the index array is always `0..corner_count`.

use crate::axis::AxisConversion;
use crate::host::MeshSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        face: usize,
        vertex: u32,
        vertex_count: usize,
    },

    #[error("{layer} layer covers {actual} faces, mesh has {expected}")]
    LayerMismatch {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} triangles emit more vertices than u32 indices can address")]
    TooManyTriangles(usize),
}

/// Per-corner attribute arrays, aligned 1:1
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedVertices {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
    /// Host vertex each corner was emitted from
    pub corner_sources: Vec<u32>,
}

impl CollectedVertices {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Walk the faces and emit per-corner attributes
pub fn collect_vertices(
    mesh: &MeshSnapshot,
    axis: AxisConversion,
) -> Result<CollectedVertices, MeshError> {
    let face_count = mesh.faces.len();
    let corner_count = face_count
        .checked_mul(3)
        .filter(|&n| u32::try_from(n).is_ok())
        .ok_or(MeshError::TooManyTriangles(face_count))?;

    check_layer("uv", mesh.uv_layer.as_ref().map(Vec::len), face_count)?;
    check_layer("color", mesh.color_layer.as_ref().map(Vec::len), face_count)?;

    let mut out = CollectedVertices {
        positions: Vec::with_capacity(corner_count),
        normals: Vec::with_capacity(corner_count),
        indices: Vec::with_capacity(corner_count),
        corner_sources: Vec::with_capacity(corner_count),
        ..Default::default()
    };

    for (face_index, face) in mesh.faces.iter().enumerate() {
        for &vertex in face {
            let host = mesh
                .vertices
                .get(vertex as usize)
                .ok_or(MeshError::VertexOutOfRange {
                    face: face_index,
                    vertex,
                    vertex_count: mesh.vertices.len(),
                })?;

            out.indices.push(out.positions.len() as u32);
            out.positions
                .push(axis.convert_vector(host.position).to_array());
            out.normals.push(axis.convert_vector(host.normal).to_array());
            out.corner_sources.push(vertex);
        }
    }

    out.uvs = mesh
        .uv_layer
        .as_ref()
        .map(|layer| layer.iter().flatten().copied().collect());
    out.colors = mesh
        .color_layer
        .as_ref()
        .map(|layer| layer.iter().flatten().copied().collect());

    tracing::debug!(
        "Collected {} vertices from {} triangles (uvs: {}, colors: {})",
        out.vertex_count(),
        face_count,
        out.uvs.is_some(),
        out.colors.is_some()
    );

    Ok(out)
}

fn check_layer(
    layer: &'static str,
    actual: Option<usize>,
    expected: usize,
) -> Result<(), MeshError> {
    match actual {
        Some(actual) if actual != expected => Err(MeshError::LayerMismatch {
            layer,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}
