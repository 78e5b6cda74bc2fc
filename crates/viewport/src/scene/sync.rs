//! Synchronous drawing: entity in, named scene node out.
//!
//! A draw without a previous node classifies the entity and inserts a fresh
//! node. A draw against a previous node dispatches on the tag stored on that
//! node and either updates it in place or replaces it, depending on the
//! drawing type and whether the element layout still matches.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{DecomposedMesh, Edge};

use super::entity::{Entity, Polyline, TextTag};
use super::options::DrawOptions;
use super::parametric::{BezierSurface, ParametricCurve, ParametricSurface};
use super::{
    DrawingType, InstanceBatch, LineBatch, MeshSurface, NodeContent, NodeName, NodeTag, SceneGraph, TagLabel,
};
use crate::grouping::{group_by_color, group_by_resolved, resolve_colors, PointDetail};
use crate::material::{parse_hex_color, MaterialCache};
use crate::mesh::{back_face, edge_polylines, merge_faces};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneSyncConfig {
    pub material_cache_capacity: usize,
    /// Point batches at or above this size use the coarse sphere
    pub instance_detail_threshold: usize,
}

impl Default for SceneSyncConfig {
    fn default() -> Self {
        Self {
            material_cache_capacity: 256,
            instance_detail_threshold: 1000,
        }
    }
}

pub struct SceneSync {
    scene: SceneGraph,
    materials: MaterialCache,
    config: SceneSyncConfig,
    /// Latest sequence stamp issued per node
    stamps: HashMap<NodeName, u64>,
    next_stamp: u64,
}

impl SceneSync {
    pub fn new(config: SceneSyncConfig) -> Self {
        Self {
            scene: SceneGraph::new(),
            materials: MaterialCache::new(config.material_cache_capacity),
            config,
            stamps: HashMap::new(),
            next_stamp: 0,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialCache {
        &mut self.materials
    }

    pub fn config(&self) -> &SceneSyncConfig {
        &self.config
    }

    /// Draw or update an entity. Returns `None` when the entity cannot be
    /// drawn synchronously or does not match the previous node's type.
    pub fn draw(&mut self, entity: &Entity, options: Option<&DrawOptions>, previous: Option<&str>) -> Option<NodeName> {
        let previous = self.tagged(previous);
        let drawing_type = match previous {
            Some(prev) => self.scene.tag(prev)?.drawing_type,
            None => entity.drawing_type(),
        };
        if entity.drawing_type() != drawing_type {
            tracing::warn!(
                "cannot update a {drawing_type:?} node with a {:?} entity",
                entity.drawing_type()
            );
            return None;
        }
        if entity.is_kernel_backed() {
            tracing::debug!("{drawing_type:?} needs the kernel, use the async draw");
            return None;
        }

        let options = self.resolve_options(options, previous);
        if let Some(prev) = previous {
            self.issue_stamp(prev);
        }

        let name = match entity {
            Entity::Point(p) => self.place_points(std::slice::from_ref(p), &options, previous),
            Entity::Points(ps) => self.place_points(ps, &options, previous),
            Entity::Line(l) => {
                let polyline = Polyline::open(vec![l.start, l.end]);
                self.place_polylines(std::slice::from_ref(&polyline), &options, previous)
            }
            Entity::Lines(ls) => {
                let polylines: Vec<Polyline> = ls.iter().map(|l| Polyline::open(vec![l.start, l.end])).collect();
                self.place_polylines(&polylines, &options, previous)
            }
            Entity::Polyline(p) => self.place_polylines(std::slice::from_ref(p), &options, previous),
            Entity::Polylines(ps) => self.place_polylines(ps, &options, previous),
            Entity::Curve(c) => {
                let polyline = Polyline::open(c.tessellate(options.tessellation_segments));
                self.place_polylines(std::slice::from_ref(&polyline), &options, previous)
            }
            Entity::Curves(cs) => {
                let polylines: Vec<Polyline> = cs
                    .iter()
                    .map(|c| Polyline::open(c.tessellate(options.tessellation_segments)))
                    .collect();
                self.place_polylines(&polylines, &options, previous)
            }
            Entity::Surface(s) => {
                let mesh = surface_mesh(s, options.tessellation_segments);
                self.place_meshes(std::slice::from_ref(&mesh), false, &options, previous)
            }
            Entity::Surfaces(ss) => {
                let meshes: Vec<DecomposedMesh> = ss
                    .iter()
                    .map(|s| surface_mesh(s, options.tessellation_segments))
                    .collect();
                self.place_meshes(&meshes, true, &options, previous)
            }
            Entity::DecomposedMesh(m) => self.place_meshes(std::slice::from_ref(m), false, &options, previous),
            Entity::DecomposedMeshes(ms) => self.place_meshes(ms, true, &options, previous),
            Entity::Tag(t) => self.place_tags(std::slice::from_ref(t), &options, previous),
            Entity::Tags(ts) => self.place_tags(ts, &options, previous),
            Entity::KernelShape(_) | Entity::KernelShapes(_) => return None,
        };
        Some(self.finish(name, drawing_type, options))
    }

    /// Draw untyped input. With a previous node the value is parsed as that
    /// node's drawing type; otherwise it is classified.
    pub fn draw_value(&mut self, value: &Value, options: Option<&DrawOptions>, previous: Option<&str>) -> Option<NodeName> {
        let entity = match self.tagged(previous).and_then(|p| self.scene.tag(p)) {
            Some(tag) => Entity::parse_as(value, tag.drawing_type),
            None => Entity::classify(value),
        };
        match entity {
            Some(entity) => self.draw(&entity, options, previous),
            None => {
                tracing::debug!("nothing drawable in input");
                None
            }
        }
    }

    /// Remove a node and forget its pending async work. Idempotent.
    pub fn remove(&mut self, name: &str) -> bool {
        self.stamps.remove(name);
        self.scene.remove(name)
    }

    /// Drop the whole scene and every cached material
    pub fn dispose(&mut self) {
        self.scene.clear();
        self.stamps.clear();
        self.materials.dispose();
    }

    /// Claim the newest sequence number for `name`
    pub fn issue_stamp(&mut self, name: &str) -> u64 {
        self.next_stamp += 1;
        self.stamps.insert(name.to_string(), self.next_stamp);
        self.next_stamp
    }

    /// Whether `stamp` is still the newest one issued for `name`
    pub fn is_latest(&self, name: &str, stamp: u64) -> bool {
        self.stamps.get(name) == Some(&stamp)
    }

    /// The previous node if it still exists and carries a tag
    pub(crate) fn tagged<'a>(&self, previous: Option<&'a str>) -> Option<&'a str> {
        let prev = previous?;
        if self.scene.tag(prev).is_some() {
            Some(prev)
        } else {
            tracing::debug!("previous node {prev} is gone or untagged, drawing a new node");
            None
        }
    }

    /// Explicit options, else the previous node's, else defaults
    pub(crate) fn resolve_options(&self, options: Option<&DrawOptions>, previous: Option<&str>) -> DrawOptions {
        options
            .cloned()
            .or_else(|| previous.and_then(|p| self.scene.tag(p)).map(|t| t.options.clone()))
            .unwrap_or_default()
    }

    /// Build or rebuild a mesh group from tessellated shapes
    pub(crate) fn place_meshes(
        &mut self,
        meshes: &[DecomposedMesh],
        plural: bool,
        options: &DrawOptions,
        previous: Option<&str>,
    ) -> NodeName {
        let prefix = if plural { "meshes" } else { "mesh" };
        let group = match previous.filter(|p| self.scene.contains(p)) {
            Some(prev) => {
                self.scene.clear_children(prev);
                self.scene.set_content(prev, NodeContent::Group);
                prev.to_string()
            }
            None => self.scene.insert(&SceneGraph::generate_name(prefix), NodeContent::Group, None),
        };

        for mesh in meshes {
            let parent = if plural {
                self.scene.insert(&SceneGraph::generate_name("mesh"), NodeContent::Group, Some(&group))
            } else {
                group.clone()
            };
            self.populate_mesh(&parent, mesh, options);
        }
        group
    }

    pub(crate) fn finish(&mut self, name: NodeName, drawing_type: DrawingType, options: DrawOptions) -> NodeName {
        self.scene.set_visible(&name, !options.hidden);
        self.scene.set_tag(&name, NodeTag { drawing_type, options });
        name
    }

    fn place_points(&mut self, positions: &[Vec3], options: &DrawOptions, previous: Option<&str>) -> NodeName {
        let batches = group_by_color(positions, &options.colours, options.colour_strategy)
            .into_iter()
            .map(|group| InstanceBatch {
                material: self.materials.standard(&group.color, options.opacity, options.z_offset),
                detail: PointDetail::for_count(group.len(), self.config.instance_detail_threshold),
                positions: group.items,
                radius: options.size,
            })
            .collect();
        self.place_replaceable("points", NodeContent::Points(batches), options, previous)
    }

    fn place_polylines(&mut self, polylines: &[Polyline], options: &DrawOptions, previous: Option<&str>) -> NodeName {
        let mut resolved = resolve_colors(polylines.len(), &options.colours, options.colour_strategy);
        for (color, polyline) in resolved.iter_mut().zip(polylines) {
            if let Some(own) = &polyline.color {
                color.clone_from(own);
            }
        }
        let vertices: Vec<Vec<Vec3>> = polylines.iter().map(Polyline::vertices).collect();
        let batches = group_by_resolved(&vertices, resolved)
            .into_iter()
            .map(|group| LineBatch {
                material: self.materials.standard(&group.color, options.opacity, options.z_offset),
                polylines: group.items,
                width: options.edge_width,
            })
            .collect();
        self.place_replaceable("lines", NodeContent::Lines(batches), options, previous)
    }

    fn place_tags(&mut self, tags: &[TextTag], options: &DrawOptions, previous: Option<&str>) -> NodeName {
        let labels = tags
            .iter()
            .map(|t| {
                let colour = t.colour.as_deref().unwrap_or(options.primary_colour());
                TagLabel {
                    text: t.text.clone(),
                    position: t.position,
                    size: t.size.unwrap_or(options.tag_size),
                    color: parse_hex_color(colour).unwrap_or([1.0, 0.0, 0.0]),
                }
            })
            .collect();
        let content = NodeContent::Tags(labels);
        match previous.filter(|p| self.scene.contains(p)) {
            Some(prev) => {
                self.scene.set_content(prev, content);
                prev.to_string()
            }
            None => self.scene.insert(&SceneGraph::generate_name("tags"), content, None),
        }
    }

    /// Swap buffers in place when allowed and the layout matches; otherwise
    /// replace the previous node with a freshly named one.
    fn place_replaceable(
        &mut self,
        prefix: &str,
        content: NodeContent,
        options: &DrawOptions,
        previous: Option<&str>,
    ) -> NodeName {
        if let Some(prev) = previous {
            let same_layout = self
                .scene
                .get(prev)
                .is_some_and(|node| node.content.layout() == content.layout());
            if options.updatable && same_layout {
                self.scene.set_content(prev, content);
                return prev.to_string();
            }
            tracing::debug!("replacing {prev}: updatable={}, same layout={same_layout}", options.updatable);
            self.remove(prev);
        }
        self.scene.insert(&SceneGraph::generate_name(prefix), content, None)
    }

    fn populate_mesh(&mut self, parent: &str, mesh: &DecomposedMesh, options: &DrawOptions) {
        if options.draw_faces {
            let merged = merge_faces(&mesh.face_list);
            if !merged.is_empty() {
                if options.draw_two_sided {
                    let back = MeshSurface {
                        mesh: back_face(&merged),
                        material: self.materials.standard(
                            &options.back_face_colour,
                            options.back_face_opacity,
                            options.z_offset,
                        ),
                        casts_shadow: false,
                    };
                    self.scene.insert(&SceneGraph::generate_name("back-faces"), NodeContent::Mesh(back), Some(parent));
                }
                let front = MeshSurface {
                    mesh: merged,
                    material: self.materials.standard(&options.face_colour, options.face_opacity, options.z_offset),
                    casts_shadow: true,
                };
                self.scene.insert(&SceneGraph::generate_name("faces"), NodeContent::Mesh(front), Some(parent));
            }
        }

        if options.draw_edges {
            let polylines = edge_polylines(&mesh.edge_list);
            if !polylines.is_empty() {
                let batch = LineBatch {
                    material: self.materials.standard(&options.edge_colour, 1.0, options.z_offset),
                    polylines,
                    width: options.edge_width,
                };
                self.scene.insert(&SceneGraph::generate_name("edges"), NodeContent::Lines(vec![batch]), Some(parent));
            }
        }

        if options.draw_vertices && !mesh.points_list.is_empty() {
            let positions: Vec<Vec3> = mesh.points_list.iter().map(|p| Vec3::from_array(*p)).collect();
            let batch = InstanceBatch {
                material: self.materials.standard(&options.vertex_colour, 1.0, options.z_offset),
                detail: PointDetail::for_count(positions.len(), self.config.instance_detail_threshold),
                positions,
                radius: options.vertex_size,
            };
            self.scene.insert(&SceneGraph::generate_name("vertices"), NodeContent::Points(vec![batch]), Some(parent));
        }
    }
}

/// Tessellated surface as a one-face mesh with its four boundary curves as edges
fn surface_mesh(surface: &BezierSurface, segments: u32) -> DecomposedMesh {
    let n = segments.max(1);
    let boundaries = [
        sample_boundary(n, |t| surface.point_at(t, 0.0)),
        sample_boundary(n, |t| surface.point_at(1.0, t)),
        sample_boundary(n, |t| surface.point_at(1.0 - t, 1.0)),
        sample_boundary(n, |t| surface.point_at(0.0, 1.0 - t)),
    ];
    DecomposedMesh {
        face_list: vec![surface.tessellate(n)],
        edge_list: boundaries
            .into_iter()
            .enumerate()
            .map(|(index, vertices)| Edge { vertices, index })
            .collect(),
        points_list: Vec::new(),
    }
}

fn sample_boundary(n: u32, f: impl Fn(f32) -> Vec3) -> Vec<[f32; 3]> {
    (0..=n).map(|i| f(i as f32 / n as f32).to_array()).collect()
}
