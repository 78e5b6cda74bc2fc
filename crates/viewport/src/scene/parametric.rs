//! Parametric geometry that tessellates itself before drawing.

use glam::Vec3;
use shared::Face;

/// A curve over `t ∈ [0, 1]`
pub trait ParametricCurve {
    fn point_at(&self, t: f32) -> Vec3;

    /// `segments + 1` evenly spaced samples including both ends
    fn tessellate(&self, segments: u32) -> Vec<Vec3> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }
}

/// A surface over `(u, v) ∈ [0, 1]²`
pub trait ParametricSurface {
    fn point_at(&self, u: f32, v: f32) -> Vec3;

    /// Regular grid triangulation as a single face without normals
    fn tessellate(&self, segments: u32) -> Face {
        let n = segments.max(1);
        let mut vertices = Vec::with_capacity(((n + 1) * (n + 1) * 3) as usize);
        let mut uvs = Vec::with_capacity(((n + 1) * (n + 1) * 2) as usize);
        for j in 0..=n {
            let v = j as f32 / n as f32;
            for i in 0..=n {
                let u = i as f32 / n as f32;
                vertices.extend_from_slice(&self.point_at(u, v).to_array());
                uvs.extend_from_slice(&[u, v]);
            }
        }

        let mut triangle_indices = Vec::with_capacity((n * n * 6) as usize);
        let row = n + 1;
        for j in 0..n {
            for i in 0..n {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                triangle_indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }

        Face {
            vertices,
            normals: Vec::new(),
            triangle_indices,
            uvs: Some(uvs),
            index: 0,
        }
    }
}

/// Bézier curve of any degree
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    pub control_points: Vec<Vec3>,
}

impl BezierCurve {
    pub fn new(control_points: Vec<Vec3>) -> Self {
        Self { control_points }
    }

    pub fn degree(&self) -> usize {
        self.control_points.len().saturating_sub(1)
    }
}

impl ParametricCurve for BezierCurve {
    fn point_at(&self, t: f32) -> Vec3 {
        de_casteljau(&self.control_points, t)
    }
}

/// Tensor-product Bézier patch; `control_points[row][column]`, rows along `v`
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSurface {
    pub control_points: Vec<Vec<Vec3>>,
}

impl BezierSurface {
    pub fn new(control_points: Vec<Vec<Vec3>>) -> Self {
        Self { control_points }
    }
}

impl ParametricSurface for BezierSurface {
    fn point_at(&self, u: f32, v: f32) -> Vec3 {
        let column: Vec<Vec3> = self
            .control_points
            .iter()
            .map(|row| de_casteljau(row, u))
            .collect();
        de_casteljau(&column, v)
    }
}

fn de_casteljau(points: &[Vec3], t: f32) -> Vec3 {
    let mut work = points.to_vec();
    let Some(n) = work.len().checked_sub(1) else {
        return Vec3::ZERO;
    };
    for level in 0..n {
        for i in 0..n - level {
            work[i] = work[i].lerp(work[i + 1], t);
        }
    }
    work[0]
}
