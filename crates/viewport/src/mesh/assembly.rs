//! Turns kernel face lists into renderable meshes.
//!
//! Faces arrive with face-local triangle indices. Merging concatenates their
//! vertex arrays and shifts each face's indices by the number of vertices
//! emitted before it. Normals come from the kernel when every face has them
//! and are synthesized from the merged geometry otherwise.

use glam::Vec3;
use serde_json::Value;
use shared::{DecomposedMesh, Edge, Face};

use super::MergedMesh;

/// Merge faces into one indexed mesh. Malformed faces are skipped with a warning.
pub fn merge_faces(faces: &[Face]) -> MergedMesh {
    let usable: Vec<&Face> = faces
        .iter()
        .filter(|face| {
            let ok = face.is_well_formed();
            if !ok {
                tracing::warn!("skipping malformed face {} ({} floats, {} indices)",
                    face.index, face.vertices.len(), face.triangle_indices.len());
            }
            ok
        })
        .collect();

    let vertex_total: usize = usable.iter().map(|f| f.vertices.len()).sum();
    let index_total: usize = usable.iter().map(|f| f.triangle_indices.len()).sum();

    let mut positions = Vec::with_capacity(vertex_total);
    let mut indices = Vec::with_capacity(index_total);
    let mut offset = 0u32;
    for face in &usable {
        positions.extend_from_slice(&face.vertices);
        indices.extend(face.triangle_indices.iter().map(|&i| i + offset));
        offset += face.vertex_count() as u32;
    }

    let normals = if !usable.is_empty() && usable.iter().all(|f| f.has_normals()) {
        usable.iter().flat_map(|f| f.normals.iter().copied()).collect()
    } else {
        compute_vertex_normals(&positions, &indices)
    };

    let uvs = if !usable.is_empty()
        && usable
            .iter()
            .all(|f| f.uvs.as_ref().is_some_and(|uv| uv.len() == f.vertex_count() * 2))
    {
        Some(usable.iter().flat_map(|f| f.uvs.iter().flatten().copied()).collect())
    } else {
        None
    };

    MergedMesh { positions, normals, indices, uvs }
}

/// Area-weighted vertex normals
pub fn compute_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let count = positions.len() / 3;
    let mut acc = vec![Vec3::ZERO; count];
    let at = |i: u32| Vec3::from_slice(&positions[i as usize * 3..i as usize * 3 + 3]);

    for tri in indices.chunks_exact(3) {
        if tri.iter().any(|&i| i as usize >= count) {
            continue;
        }
        let (a, b, c) = (at(tri[0]), at(tri[1]), at(tri[2]));
        // Unnormalized: the cross product's length is twice the triangle area.
        let n = (b - a).cross(c - a);
        for &i in tri {
            acc[i as usize] += n;
        }
    }

    acc.into_iter()
        .flat_map(|n| n.normalize_or_zero().to_array())
        .collect()
}

/// Mirror of `mesh`: same vertices, reversed winding and negated normals
pub fn back_face(mesh: &MergedMesh) -> MergedMesh {
    let mut indices = Vec::with_capacity(mesh.indices.len());
    for tri in mesh.indices.chunks_exact(3) {
        indices.extend_from_slice(&[tri[1], tri[0], tri[2]]);
    }
    MergedMesh {
        positions: mesh.positions.clone(),
        normals: mesh.normals.iter().map(|n| -n).collect(),
        indices,
        uvs: mesh.uvs.clone(),
    }
}

/// Parse a kernel tessellation response. A response that does not have the
/// expected shape yields an empty mesh.
pub fn decode_decomposed(value: &Value) -> DecomposedMesh {
    match serde_json::from_value::<DecomposedMesh>(value.clone()) {
        Ok(mesh) => mesh,
        Err(e) => {
            tracing::warn!("corrupted mesh response, drawing nothing: {e}");
            DecomposedMesh::default()
        }
    }
}

/// Parse a list of tessellation responses; each corrupted entry becomes empty.
pub fn decode_decomposed_list(value: &Value) -> Vec<DecomposedMesh> {
    match value.as_array() {
        Some(items) => items.iter().map(decode_decomposed).collect(),
        None => {
            tracing::warn!("expected a list of meshes, got {}", json_kind(value));
            Vec::new()
        }
    }
}

/// Edge polylines with at least two vertices
pub fn edge_polylines(edges: &[Edge]) -> Vec<Vec<Vec3>> {
    edges
        .iter()
        .filter(|e| e.vertices.len() >= 2)
        .map(|e| e.vertices.iter().map(|p| Vec3::from_array(*p)).collect())
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
