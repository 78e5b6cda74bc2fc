//! CPU-side triangle and line geometry handed to the renderer.

pub mod assembly;
pub mod primitives;

pub use assembly::{back_face, compute_vertex_normals, decode_decomposed, decode_decomposed_list, edge_polylines, merge_faces};

use crate::bounds::Aabb;

/// Indexed triangle mesh with one normal per vertex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedMesh {
    /// Flat xyz positions
    pub positions: Vec<f32>,
    /// Flat xyz normals, same length as `positions`
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Flat uv pairs, present only when every source face carried them
    pub uvs: Option<Vec<f32>>,
}

impl MergedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_positions(&self.positions)
    }

    /// Position of vertex `i`
    pub fn position(&self, i: usize) -> glam::Vec3 {
        glam::Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    pub fn normal(&self, i: usize) -> glam::Vec3 {
        glam::Vec3::from_slice(&self.normals[i * 3..i * 3 + 3])
    }
}
