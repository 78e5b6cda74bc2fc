//! Decomposed mesh: the kernel's triangulated output for one shape.

use serde::{Deserialize, Serialize};

/// A point as it travels over the wire
pub type Point3 = [f32; 3];

/// Kernel response shape for a tessellated shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposedMesh {
    #[serde(default)]
    pub face_list: Vec<Face>,
    #[serde(default)]
    pub edge_list: Vec<Edge>,
    #[serde(default)]
    pub points_list: Vec<Point3>,
}

impl DecomposedMesh {
    pub fn is_empty(&self) -> bool {
        self.face_list.is_empty() && self.edge_list.is_empty() && self.points_list.is_empty()
    }

    /// Total number of triangles over all faces
    pub fn triangle_count(&self) -> usize {
        self.face_list.iter().map(Face::triangle_count).sum()
    }
}

/// One triangulated face. `triangle_indices` point into this face's own vertices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    /// Flat xyz positions
    #[serde(default)]
    pub vertices: Vec<f32>,
    /// Flat xyz normals; empty when the kernel did not compute them
    #[serde(default)]
    pub normals: Vec<f32>,
    #[serde(default)]
    pub triangle_indices: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uvs: Option<Vec<f32>>,
    #[serde(default)]
    pub index: usize,
}

impl Face {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    /// Structural check: complete position/index arrays, in-range indices
    /// and, if present, one normal per vertex.
    pub fn is_well_formed(&self) -> bool {
        if self.vertices.is_empty() || self.vertices.len() % 3 != 0 {
            return false;
        }
        if self.triangle_indices.is_empty() || self.triangle_indices.len() % 3 != 0 {
            return false;
        }
        if !self.normals.is_empty() && self.normals.len() != self.vertices.len() {
            return false;
        }
        let count = self.vertex_count() as u32;
        self.triangle_indices.iter().all(|&i| i < count)
    }
}

/// Edge polyline of a shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub vertices: Vec<Point3>,
    #[serde(default)]
    pub index: usize,
}
