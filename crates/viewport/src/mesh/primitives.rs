//! Fixed geometry used by the scene itself: point spheres and the ground plane.

use glam::Vec3;

use super::MergedMesh;

/// Unit sphere centred at the origin; normals equal positions
pub fn unit_sphere(rings: u32, sectors: u32) -> MergedMesh {
    let rings = rings.max(2);
    let sectors = sectors.max(3);
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for r in 0..=rings {
        let phi = std::f32::consts::PI * r as f32 / rings as f32;
        let sp = phi.sin();
        let cp = phi.cos();

        for s in 0..=sectors {
            let theta = std::f32::consts::TAU * s as f32 / sectors as f32;
            positions.extend_from_slice(&[sp * theta.cos(), cp, sp * theta.sin()]);
        }
    }

    for r in 0..rings {
        for s in 0..sectors {
            let cur = r * (sectors + 1) + s;
            let next = cur + sectors + 1;
            indices.extend_from_slice(&[cur, cur + 1, next, cur + 1, next + 1, next]);
        }
    }

    MergedMesh {
        normals: positions.clone(),
        positions,
        indices,
        uvs: None,
    }
}

/// Square in the XZ plane facing +Y, `size` units across
pub fn ground_plane(center: Vec3, size: f32) -> MergedMesh {
    let h = size * 0.5;
    let corners = [
        center + Vec3::new(-h, 0.0, -h),
        center + Vec3::new(-h, 0.0, h),
        center + Vec3::new(h, 0.0, h),
        center + Vec3::new(h, 0.0, -h),
    ];
    MergedMesh {
        positions: corners.iter().flat_map(|c| c.to_array()).collect(),
        normals: [0.0, 1.0, 0.0].repeat(4),
        indices: vec![0, 1, 2, 0, 2, 3],
        uvs: Some(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::compute_vertex_normals;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_sphere_counts() {
        let s = unit_sphere(4, 6);
        assert_eq!(s.vertex_count(), 5 * 7);
        assert_eq!(s.triangle_count(), 4 * 6 * 2);
        assert!(s.indices.iter().all(|&i| (i as usize) < s.vertex_count()));
    }

    #[test]
    fn test_unit_sphere_is_unit() {
        let s = unit_sphere(6, 8);
        for i in 0..s.vertex_count() {
            assert_relative_eq!(s.position(i).length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_ground_plane_faces_up() {
        let g = ground_plane(Vec3::new(0.0, -1.0, 0.0), 10.0);
        let n = compute_vertex_normals(&g.positions, &g.indices);
        assert_relative_eq!(n[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(g.bounds().max_extent(), 10.0);
    }
}
