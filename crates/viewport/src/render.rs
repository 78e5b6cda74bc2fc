//! Flattened, thread-safe copy of the visible scene for the GPU renderer.
//!
//! The scene graph shares materials through `Rc` and so stays on the UI
//! thread; the paint callback receives this snapshot instead.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::grouping::PointDetail;
use crate::material::MaterialId;
use crate::scene::{Light, NodeContent, SceneGraph, TagLabel};

#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    pub key: String,
    pub material_id: MaterialId,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    pub color: [f32; 4],
    pub z_offset: f32,
    pub casts_shadow: bool,
}

/// Line segments as consecutive vertex pairs
#[derive(Debug, Clone, PartialEq)]
pub struct LineDraw {
    pub key: String,
    pub material_id: MaterialId,
    pub vertices: Vec<f32>,
    pub color: [f32; 4],
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDraw {
    pub key: String,
    pub material_id: MaterialId,
    /// Flat xyz sphere centres
    pub offsets: Vec<f32>,
    pub radius: f32,
    pub detail: PointDetail,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    /// Scene version this snapshot was taken at
    pub version: u64,
    pub meshes: Vec<MeshDraw>,
    pub lines: Vec<LineDraw>,
    pub instances: Vec<InstanceDraw>,
    pub labels: Vec<TagLabel>,
    pub lights: Vec<Light>,
}

impl RenderSnapshot {
    /// Capture every visible node. Opaque meshes come before transparent ones.
    pub fn capture(scene: &SceneGraph) -> Self {
        let mut snapshot = RenderSnapshot {
            version: scene.version(),
            ..Default::default()
        };

        for node in scene.visible_nodes() {
            let name = node.name();
            match &node.content {
                NodeContent::Group => {}
                NodeContent::Mesh(surface) => {
                    if surface.mesh.is_empty() {
                        continue;
                    }
                    snapshot.meshes.push(MeshDraw {
                        key: name.to_string(),
                        material_id: surface.material.id,
                        positions: surface.mesh.positions.clone(),
                        normals: surface.mesh.normals.clone(),
                        indices: surface.mesh.indices.clone(),
                        color: surface.material.rgba(),
                        z_offset: surface.material.z_offset,
                        casts_shadow: surface.casts_shadow,
                    });
                }
                NodeContent::Lines(batches) => {
                    for (i, batch) in batches.iter().enumerate() {
                        let mut vertices = Vec::new();
                        for polyline in &batch.polylines {
                            for pair in polyline.windows(2) {
                                vertices.extend_from_slice(&pair[0].to_array());
                                vertices.extend_from_slice(&pair[1].to_array());
                            }
                        }
                        snapshot.lines.push(LineDraw {
                            key: format!("{name}#{i}"),
                            material_id: batch.material.id,
                            vertices,
                            color: batch.material.rgba(),
                            width: batch.width,
                        });
                    }
                }
                NodeContent::Points(batches) => {
                    for (i, batch) in batches.iter().enumerate() {
                        snapshot.instances.push(InstanceDraw {
                            key: format!("{name}#{i}"),
                            material_id: batch.material.id,
                            offsets: batch.positions.iter().flat_map(|p| p.to_array()).collect(),
                            radius: batch.radius,
                            detail: batch.detail,
                            color: batch.material.rgba(),
                        });
                    }
                }
                NodeContent::Tags(labels) => snapshot.labels.extend(labels.iter().cloned()),
                NodeContent::Light(light) => snapshot.lights.push(light.clone()),
            }
        }

        snapshot.meshes.sort_by_key(|m| m.color[3] < 1.0);
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.lines.is_empty() && self.instances.is_empty() && self.labels.is_empty()
    }
}

/// Material ids whose GPU state still has to be freed.
///
/// Shared between the UI thread, which queues ids as the cache disposes
/// them, and the paint callback, which drains them. Ids stay queued until a
/// callback actually runs, so a skipped frame loses nothing.
#[derive(Debug, Clone, Default)]
pub struct PendingDisposals(Arc<Mutex<Vec<MaterialId>>>);

impl PendingDisposals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, ids: impl IntoIterator<Item = MaterialId>) {
        self.lock().extend(ids);
    }

    pub fn drain(&self) -> Vec<MaterialId> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic mid-push leaves a valid Vec behind
    fn lock(&self) -> MutexGuard<'_, Vec<MaterialId>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
