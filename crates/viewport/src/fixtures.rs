//! Factory functions for test data: point sets, kernel meshes, camera setups.

use glam::Vec3;
use serde_json::{json, Value};
use shared::{DecomposedMesh, Edge, Face};

use crate::bounds::Aabb;
use crate::camera::OrbitCameraConfig;
use crate::scene::BezierSurface;

// ── Points and colours ──────────────────────────────────────────

/// The three-point set used throughout the drawing scenarios
pub fn three_points() -> Vec<Vec3> {
    vec![
        Vec3::new(1.0, -2.0, 3.0),
        Vec3::new(2.0, 3.0, 4.0),
        Vec3::new(-3.0, 2.0, -1.0),
    ]
}

pub fn three_points_json() -> Value {
    json!([[1, -2, 3], [2, 3, 4], [-3, 2, -1]])
}

/// `n` points along the X axis
pub fn points_on_x(n: usize) -> Vec<Vec3> {
    (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()
}

pub fn colours(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

// ── Kernel meshes ───────────────────────────────────────────────

/// Axis-aligned box as the kernel would decompose it: one quad face per side
/// with flat normals, and the twelve box edges.
pub fn box_mesh(center: Vec3, size: Vec3) -> DecomposedMesh {
    let h = size * 0.5;
    let corner = |x: f32, y: f32, z: f32| center + Vec3::new(x * h.x, y * h.y, z * h.z);

    // (normal, four corners counter-clockwise seen from outside)
    let sides: [(Vec3, [Vec3; 4]); 6] = [
        (Vec3::Z, [corner(-1., -1., 1.), corner(1., -1., 1.), corner(1., 1., 1.), corner(-1., 1., 1.)]),
        (Vec3::NEG_Z, [corner(1., -1., -1.), corner(-1., -1., -1.), corner(-1., 1., -1.), corner(1., 1., -1.)]),
        (Vec3::X, [corner(1., -1., 1.), corner(1., -1., -1.), corner(1., 1., -1.), corner(1., 1., 1.)]),
        (Vec3::NEG_X, [corner(-1., -1., -1.), corner(-1., -1., 1.), corner(-1., 1., 1.), corner(-1., 1., -1.)]),
        (Vec3::Y, [corner(-1., 1., 1.), corner(1., 1., 1.), corner(1., 1., -1.), corner(-1., 1., -1.)]),
        (Vec3::NEG_Y, [corner(-1., -1., -1.), corner(1., -1., -1.), corner(1., -1., 1.), corner(-1., -1., 1.)]),
    ];

    let face_list = sides
        .iter()
        .enumerate()
        .map(|(index, (normal, quad))| Face {
            vertices: quad.iter().flat_map(|v| v.to_array()).collect(),
            normals: (0..4).flat_map(|_| normal.to_array()).collect(),
            triangle_indices: vec![0, 1, 2, 0, 2, 3],
            uvs: None,
            index,
        })
        .collect();

    let mut edge_list = Vec::new();
    for (a, b) in BOX_EDGES {
        edge_list.push(Edge {
            vertices: vec![corner(a[0], a[1], a[2]).to_array(), corner(b[0], b[1], b[2]).to_array()],
            index: edge_list.len(),
        });
    }

    let points_list = [-1., 1.]
        .iter()
        .flat_map(|&x| [-1., 1.].iter().flat_map(move |&y| [-1., 1.].iter().map(move |&z| (x, y, z))))
        .map(|(x, y, z)| corner(x, y, z).to_array())
        .collect();

    DecomposedMesh { face_list, edge_list, points_list }
}

const BOX_EDGES: [([f32; 3], [f32; 3]); 12] = [
    ([-1., -1., -1.], [1., -1., -1.]),
    ([1., -1., -1.], [1., -1., 1.]),
    ([1., -1., 1.], [-1., -1., 1.]),
    ([-1., -1., 1.], [-1., -1., -1.]),
    ([-1., 1., -1.], [1., 1., -1.]),
    ([1., 1., -1.], [1., 1., 1.]),
    ([1., 1., 1.], [-1., 1., 1.]),
    ([-1., 1., 1.], [-1., 1., -1.]),
    ([-1., -1., -1.], [-1., 1., -1.]),
    ([1., -1., -1.], [1., 1., -1.]),
    ([1., -1., 1.], [1., 1., 1.]),
    ([-1., -1., 1.], [-1., 1., 1.]),
];

/// Unit cube centred at the origin
pub fn unit_cube_mesh() -> DecomposedMesh {
    box_mesh(Vec3::ZERO, Vec3::ONE)
}

/// Same cube with normals stripped, so the viewport has to synthesize them
pub fn cube_mesh_without_normals() -> DecomposedMesh {
    let mut mesh = unit_cube_mesh();
    for face in &mut mesh.face_list {
        face.normals.clear();
    }
    mesh
}

/// A response missing its required arrays
pub fn corrupted_mesh_json() -> Value {
    json!({ "faceList": [{ "vertices": "not an array" }] })
}

pub fn mesh_json(mesh: &DecomposedMesh) -> Value {
    serde_json::to_value(mesh).unwrap_or(Value::Null)
}

// ── Parametric geometry ─────────────────────────────────────────

/// Gently curved 3x3 patch over the unit square in XZ
pub fn bezier_patch() -> BezierSurface {
    BezierSurface::new(
        (0..3)
            .map(|j| {
                (0..3)
                    .map(|i| {
                        let y = if i == 1 && j == 1 { 1.0 } else { 0.0 };
                        Vec3::new(i as f32 * 0.5, y, j as f32 * 0.5)
                    })
                    .collect()
            })
            .collect(),
    )
}

// ── Camera ──────────────────────────────────────────────────────

pub fn camera_config(distance: f32, pitch: f32, yaw: f32) -> OrbitCameraConfig {
    OrbitCameraConfig {
        distance,
        pitch,
        yaw,
        pivot_point: [0.0; 3],
        ..OrbitCameraConfig::default()
    }
}

/// Cube of side `extent` centred at `center`
pub fn cube_bounds(center: Vec3, extent: f32) -> Aabb {
    Aabb::new(center - Vec3::splat(extent / 2.0), center + Vec3::splat(extent / 2.0))
}
