//! OBJ front end
//!
//! Polygons are fan-triangulated and every face corner becomes its own host
//! vertex, since OBJ normals and UVs are indexed per corner. Normals are
//! required. `v x y z r g b` vertex colors are picked up when every used
//! position carries them.

use anyhow::{bail, Context, Result};
use glam::Vec3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::host::{HostVertex, MeshSnapshot, SceneSnapshot};

/// Load an OBJ file as a static scene
pub fn load_obj(input: &Path, fps: u32) -> Result<SceneSnapshot> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    let mesh = parse_obj(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ: {:?}", input))?;

    tracing::info!(
        "Loaded OBJ mesh: {} triangles, uvs={}, colors={}",
        mesh.faces.len(),
        mesh.uv_layer.is_some(),
        mesh.color_layer.is_some()
    );

    Ok(SceneSnapshot {
        mesh: Some(mesh),
        armature: None,
        actions: Vec::new(),
        fps,
    })
}

/// One resolved face corner: (position, uv, normal) indices, zero-based
type Corner = (usize, Option<usize>, usize);

/// Parse OBJ text into a triangulated mesh snapshot
pub(crate) fn parse_obj<R: BufRead>(reader: R) -> Result<MeshSnapshot> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut position_colors: Vec<Option<[f32; 3]>> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();

    let mut mesh = MeshSnapshot::default();
    let mut uvs: Vec<Option<[f32; 2]>> = Vec::new();
    let mut colors: Vec<Option<[f32; 3]>> = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line_number = line_index + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };
        let args: Vec<&str> = parts.collect();

        match keyword {
            "v" => {
                let values = parse_floats(&args, 3, line_number)?;
                positions.push([values[0], values[1], values[2]]);
                // x y z r g b; a lone fourth value is the homogeneous w
                let color = (values.len() >= 6).then(|| [values[3], values[4], values[5]]);
                position_colors.push(color);
            }
            "vt" => {
                let values = parse_floats(&args, 2, line_number)?;
                tex_coords.push([values[0], values[1]]);
            }
            "vn" => {
                let values = parse_floats(&args, 3, line_number)?;
                normals.push([values[0], values[1], values[2]]);
            }
            "f" => {
                if args.len() < 3 {
                    bail!("line {}: face needs at least 3 vertices", line_number);
                }
                let corners = args
                    .iter()
                    .map(|s| {
                        parse_obj_vertex(s, positions.len(), tex_coords.len(), normals.len())
                            .with_context(|| {
                                format!("line {}: bad face vertex '{}'", line_number, s)
                            })
                    })
                    .collect::<Result<Vec<Corner>>>()?;

                // Fan triangulation (convex polygons)
                for i in 1..corners.len() - 1 {
                    let base = mesh.vertices.len() as u32;
                    for &(vi, vti, vni) in &[corners[0], corners[i], corners[i + 1]] {
                        let position = Vec3::from_array(positions[vi]);
                        let normal = Vec3::from_array(normals[vni]);
                        mesh.vertices.push(HostVertex::new(position, normal));
                        uvs.push(vti.map(|ti| tex_coords[ti]));
                        colors.push(position_colors[vi]);
                    }
                    mesh.faces.push([base, base + 1, base + 2]);
                }
            }
            _ => {}
        }
    }

    if mesh.faces.is_empty() {
        bail!("No faces found in OBJ file");
    }
    if u32::try_from(mesh.vertices.len()).is_err() {
        bail!("OBJ mesh has {} face corners, too many for u32 indices", mesh.vertices.len());
    }

    mesh.uv_layer = corner_layer(&uvs, "texture coordinates");
    mesh.color_layer = corner_layer(&colors, "vertex colors");

    Ok(mesh)
}

/// Group per-corner values into per-face triples; `None` unless every corner has one
fn corner_layer<T: Copy + Default>(values: &[Option<T>], what: &str) -> Option<Vec<[T; 3]>> {
    let present = values.iter().filter(|v| v.is_some()).count();
    if present == 0 {
        return None;
    }
    if present != values.len() {
        tracing::warn!(
            "OBJ has {} on only {} of {} face corners, ignoring them",
            what,
            present,
            values.len()
        );
        return None;
    }
    Some(
        values
            .chunks_exact(3)
            .map(|face| {
                let mut out = [T::default(); 3];
                for (slot, value) in out.iter_mut().zip(face) {
                    *slot = value.unwrap_or_default();
                }
                out
            })
            .collect(),
    )
}

fn parse_floats(args: &[&str], min: usize, line_number: usize) -> Result<Vec<f32>> {
    if args.len() < min {
        bail!(
            "line {}: expected at least {} values, found {}",
            line_number,
            min,
            args.len()
        );
    }
    args.iter()
        .map(|s| {
            s.parse::<f32>()
                .with_context(|| format!("line {}: invalid number '{}'", line_number, s))
        })
        .collect()
}

/// Parse an OBJ vertex reference: "v/vt/vn" or "v//vn"
///
/// Indices are 1-based; negative indices count back from the latest element.
fn parse_obj_vertex(
    s: &str,
    position_count: usize,
    uv_count: usize,
    normal_count: usize,
) -> Result<Corner> {
    let mut parts = s.split('/');
    let vi = resolve_index(parts.next(), position_count, "position")?
        .context("missing position index")?;
    let vti = resolve_index(parts.next(), uv_count, "texture coordinate")?;
    let vni = resolve_index(parts.next(), normal_count, "normal")?
        .context("vertex has no normal; export the OBJ with normals")?;
    Ok((vi, vti, vni))
}

fn resolve_index(part: Option<&str>, count: usize, what: &str) -> Result<Option<usize>> {
    let Some(part) = part.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let raw: i64 = part
        .parse()
        .with_context(|| format!("invalid {} index '{}'", what, part))?;
    let index = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => count.checked_sub(r.unsigned_abs() as usize),
    };
    match index {
        Some(i) if i < count => Ok(Some(i)),
        _ => bail!("{} index {} out of range ({} defined)", what, raw, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<MeshSnapshot> {
        parse_obj(text.as_bytes())
    }

    const QUAD: &str = "\
# quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_quad_fan_triangulated() {
        let mesh = parse(QUAD).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.vertices[3].position, Vec3::ZERO);
        assert_eq!(mesh.vertices[5].position, Vec3::new(0.0, 1.0, 0.0));
        assert!(mesh.vertices.iter().all(|v| v.normal == Vec3::Z));

        let uvs = mesh.uv_layer.unwrap();
        assert_eq!(uvs[1], [[0.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert!(mesh.color_layer.is_none());
        assert!(mesh.vertex_groups.is_empty());
    }

    #[test]
    fn test_vertex_colors() {
        let mesh = parse(
            "v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nvn 0 0 1\nf 1//1 2//1 3//1\n",
        )
        .unwrap();
        let colors = mesh.color_layer.unwrap();
        assert_eq!(colors[0][1], [0.0, 1.0, 0.0]);
        assert!(mesh.uv_layer.is_none());
    }

    #[test]
    fn test_negative_indices() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf -3//-1 -2//-1 -1//-1\n").unwrap();
        assert_eq!(mesh.vertices[2].position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_partial_uvs_dropped() {
        let mesh = parse(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2//1 3//1\n",
        )
        .unwrap();
        assert!(mesh.uv_layer.is_none());
    }

    #[test]
    fn test_missing_normals_rejected() {
        assert!(parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").is_err());
    }

    #[test]
    fn test_out_of_range_reference_rejected() {
        assert!(parse("v 0 0 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").is_err());
    }

    #[test]
    fn test_bad_number_rejected() {
        assert!(parse("v 0 zero 0\n").is_err());
    }

    #[test]
    fn test_no_faces_rejected() {
        assert!(parse("v 0 0 0\n").is_err());
    }
}
