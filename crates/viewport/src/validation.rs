//! Mesh validation utilities.
//!
//! `MeshValidator` checks the integrity of a [`MergedMesh`]: buffer strides,
//! in-range indices, unit normals, winding against normals and bounds.

use crate::bounds::Aabb;
use crate::mesh::{compute_vertex_normals, MergedMesh};

/// Read-only checks over one merged mesh
pub struct MeshValidator<'a> {
    mesh: &'a MergedMesh,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a MergedMesh) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Positions and normals are whole xyz triples of equal length.
    pub fn is_stride_valid(&self) -> bool {
        self.mesh.positions.len() % 3 == 0 && self.mesh.normals.len() == self.mesh.positions.len()
    }

    pub fn is_index_stride_valid(&self) -> bool {
        self.mesh.indices.len() % 3 == 0
    }

    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.indices.iter().all(|&i| i < max_idx)
    }

    /// Every normal is unit length within `epsilon`
    pub fn are_normals_normalized(&self, epsilon: f32) -> bool {
        (0..self.vertex_count()).all(|i| (self.mesh.normal(i).length() - 1.0).abs() <= epsilon)
    }

    /// Every vertex normal points to the same side as the normal implied by
    /// the triangle winding.
    pub fn normals_agree_with_winding(&self) -> bool {
        let geometric = compute_vertex_normals(&self.mesh.positions, &self.mesh.indices);
        geometric
            .chunks_exact(3)
            .zip(self.mesh.normals.chunks_exact(3))
            .all(|(g, n)| g[0] * n[0] + g[1] * n[1] + g[2] * n[2] >= 0.0)
    }

    pub fn aabb(&self) -> Aabb {
        self.mesh.bounds()
    }

    pub fn dimensions(&self) -> [f32; 3] {
        self.aabb().size().to_array()
    }

    /// Width, height and depth each within `tolerance` of `expected`
    pub fn assert_dimensions_approx(&self, expected: [f32; 3], tolerance: f32) -> bool {
        let dims = self.dimensions();
        dims.iter().zip(expected).all(|(d, e)| (d - e).abs() < tolerance)
    }

    /// Every structural problem found, as readable messages; empty when the mesh is sound
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.is_stride_valid() {
            errors.push(format!(
                "Position/normal buffers malformed: {} positions, {} normals",
                self.mesh.positions.len(),
                self.mesh.normals.len()
            ));
        }

        if !self.is_index_stride_valid() {
            errors.push(format!(
                "Index buffer length {} is not a multiple of 3",
                self.mesh.indices.len()
            ));
        }

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self.mesh.indices.iter().filter(|&&i| i >= max_idx).take(5).collect();
            errors.push(format!(
                "Indices out of range (vertex_count={}): {:?}",
                max_idx, out_of_range
            ));
        }

        if self.is_stride_valid() && self.vertex_count() > 0 && !self.are_normals_normalized(0.1) {
            errors.push("Some normals are not unit-length (epsilon=0.1)".to_string());
        }

        if let Some(uvs) = &self.mesh.uvs {
            if uvs.len() != self.vertex_count() * 2 {
                errors.push(format!("{} uv floats for {} vertices", uvs.len(), self.vertex_count()));
            }
        }

        errors
    }
}
