//! Triangle soup → `DecomposedMesh`.
//!
//! Coplanar triangles connected through shared edges become one `Face`.
//! Edges between faces (and open boundaries) are chained into `Edge`
//! polylines, breaking at vertices where more than two of them meet.

use std::collections::{HashMap, HashSet};

use shared::{DecomposedMesh, Edge, Face, Point3};

/// Two triangles belong to the same face when their normals agree this closely
const COPLANAR_THRESHOLD: f32 = 0.999;

/// Positions are welded on a grid of this resolution
const WELD_SCALE: f32 = 1.0e4;

type VertexKey = (i64, i64, i64);
type EdgeKey = (VertexKey, VertexKey);

fn key_of(p: Point3) -> VertexKey {
    (
        (p[0] * WELD_SCALE).round() as i64,
        (p[1] * WELD_SCALE).round() as i64,
        (p[2] * WELD_SCALE).round() as i64,
    )
}

fn edge_key(a: VertexKey, b: VertexKey) -> EdgeKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sub(a: Point3, b: Point3) -> Point3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Point3, b: Point3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(v: Point3) -> Point3 {
    let len = dot(v, v).sqrt();
    if len > f32::EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// Decompose an indexed triangle soup (flat xyz positions) into faces, edges and no points.
pub fn decompose(positions: &[f32], indices: &[u32]) -> DecomposedMesh {
    let vertex_count = positions.len() / 3;
    let point = |i: u32| -> Point3 {
        let i = i as usize * 3;
        [positions[i], positions[i + 1], positions[i + 2]]
    };

    let triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .filter(|t| t.iter().all(|&i| (i as usize) < vertex_count))
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    if triangles.is_empty() {
        return DecomposedMesh::default();
    }

    let normals: Vec<Point3> = triangles
        .iter()
        .map(|t| {
            let (p0, p1, p2) = (point(t[0]), point(t[1]), point(t[2]));
            normalize(cross(sub(p1, p0), sub(p2, p0)))
        })
        .collect();

    let tri_keys: Vec<[VertexKey; 3]> = triangles
        .iter()
        .map(|t| [key_of(point(t[0])), key_of(point(t[1])), key_of(point(t[2]))])
        .collect();

    // Edge → triangles adjacency on welded positions
    let mut edge_to_tris: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (tri_idx, keys) in tri_keys.iter().enumerate() {
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            edge_to_tris
                .entry(edge_key(keys[a], keys[b]))
                .or_default()
                .push(tri_idx);
        }
    }

    // Flood fill coplanar groups
    let mut face_of = vec![usize::MAX; triangles.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for seed in 0..triangles.len() {
        if face_of[seed] != usize::MAX {
            continue;
        }
        let group_id = groups.len();
        let seed_normal = normals[seed];
        let mut group = vec![seed];
        face_of[seed] = group_id;
        let mut stack = vec![seed];

        while let Some(current) = stack.pop() {
            let keys = tri_keys[current];
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                let Some(neighbors) = edge_to_tris.get(&edge_key(keys[a], keys[b])) else {
                    continue;
                };
                for &neighbor in neighbors {
                    if face_of[neighbor] != usize::MAX {
                        continue;
                    }
                    if dot(seed_normal, normals[neighbor]) > COPLANAR_THRESHOLD {
                        face_of[neighbor] = group_id;
                        group.push(neighbor);
                        stack.push(neighbor);
                    }
                }
            }
        }

        groups.push(group);
    }

    let face_list = groups
        .iter()
        .enumerate()
        .map(|(index, group)| build_face(index, group, &triangles, &tri_keys, &normals, &point))
        .collect();

    // Segments whose two sides lie on different faces, or with only one side
    let mut segments: Vec<(VertexKey, VertexKey)> = Vec::new();
    let mut key_positions: HashMap<VertexKey, Point3> = HashMap::new();
    let mut seen: HashSet<EdgeKey> = HashSet::new();
    for (tri_idx, keys) in tri_keys.iter().enumerate() {
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let ek = edge_key(keys[a], keys[b]);
            if !seen.insert(ek) {
                continue;
            }
            let tris = &edge_to_tris[&ek];
            let crease = tris.len() == 1 || tris.iter().any(|&t| face_of[t] != face_of[tri_idx]);
            if crease {
                key_positions.insert(keys[a], point(triangles[tri_idx][a]));
                key_positions.insert(keys[b], point(triangles[tri_idx][b]));
                segments.push(ek);
            }
        }
    }

    let edge_list = chain_segments(&segments, &key_positions);

    DecomposedMesh {
        face_list,
        edge_list,
        points_list: Vec::new(),
    }
}

fn build_face(
    index: usize,
    group: &[usize],
    triangles: &[[u32; 3]],
    tri_keys: &[[VertexKey; 3]],
    normals: &[Point3],
    point: &impl Fn(u32) -> Point3,
) -> Face {
    let mut normal = [0.0_f32; 3];
    for &t in group {
        normal = [
            normal[0] + normals[t][0],
            normal[1] + normals[t][1],
            normal[2] + normals[t][2],
        ];
    }
    let normal = normalize(normal);

    let mut local: HashMap<VertexKey, u32> = HashMap::new();
    let mut vertices = Vec::new();
    let mut vertex_normals = Vec::new();
    let mut triangle_indices = Vec::with_capacity(group.len() * 3);

    for &t in group {
        for corner in 0..3 {
            let key = tri_keys[t][corner];
            let idx = *local.entry(key).or_insert_with(|| {
                let p = point(triangles[t][corner]);
                vertices.extend_from_slice(&p);
                vertex_normals.extend_from_slice(&normal);
                (vertices.len() / 3 - 1) as u32
            });
            triangle_indices.push(idx);
        }
    }

    Face {
        vertices,
        normals: vertex_normals,
        triangle_indices,
        uvs: None,
        index,
    }
}

/// Join segments into polylines, passing only through vertices of degree two.
fn chain_segments(segments: &[EdgeKey], positions: &HashMap<VertexKey, Point3>) -> Vec<Edge> {
    let mut incident: HashMap<VertexKey, Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        incident.entry(*a).or_default().push(i);
        incident.entry(*b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut edges = Vec::new();

    // Start from junction/end vertices first so open chains are walked whole
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by_key(|&i| {
        let (a, b) = segments[i];
        incident[&a].len() == 2 && incident[&b].len() == 2
    });

    for start in order {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        // Orient so the walk moves away from a junction if there is one
        let (first, mut tail) = if incident[&b].len() != 2 && incident[&a].len() == 2 {
            (b, a)
        } else {
            (a, b)
        };
        let mut chain = vec![first, tail];

        while incident[&tail].len() == 2 {
            let next = incident[&tail].iter().copied().find(|&s| !used[s]);
            let Some(next) = next else {
                break;
            };
            used[next] = true;
            let (na, nb) = segments[next];
            tail = if na == tail { nb } else { na };
            chain.push(tail);
        }

        let vertices = chain
            .iter()
            .filter_map(|k| positions.get(k).copied())
            .collect();
        edges.push(Edge {
            vertices,
            index: edges.len(),
        });
    }

    edges
}
