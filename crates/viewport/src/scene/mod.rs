//! Scene graph and the synchronizer that keeps it in step with draw calls.
//!
//! Nodes are addressed by generated names. A drawn node carries a [`NodeTag`]
//! recording what was drawn and with which options, so a later draw against
//! the same name can update it without classifying its input again.

pub mod entity;
pub mod kernel_draw;
pub mod options;
pub mod parametric;
pub mod sync;

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::grouping::PointDetail;
use crate::material::Material;
use crate::mesh::MergedMesh;

pub use entity::{Entity, Line, Polyline, TextTag};
pub use kernel_draw::{draw_async, draw_value_async};
pub use options::DrawOptions;
pub use parametric::{BezierCurve, BezierSurface, ParametricCurve, ParametricSurface};
pub use sync::{SceneSync, SceneSyncConfig};

pub type NodeName = String;

/// What a node was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawingType {
    Point,
    Points,
    Line,
    Lines,
    Polyline,
    Polylines,
    Curve,
    Curves,
    Surface,
    Surfaces,
    KernelMesh,
    KernelMeshes,
    Tag,
    Tags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeTag {
    pub drawing_type: DrawingType,
    pub options: DrawOptions,
}

/// One instanced draw: a sphere per position, all in one material
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    pub material: Rc<Material>,
    pub positions: Vec<Vec3>,
    pub radius: f32,
    pub detail: PointDetail,
}

#[derive(Debug, Clone)]
pub struct LineBatch {
    pub material: Rc<Material>,
    pub polylines: Vec<Vec<Vec3>>,
    pub width: f32,
}

#[derive(Debug, Clone)]
pub struct MeshSurface {
    pub mesh: MergedMesh,
    pub material: Rc<Material>,
    pub casts_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagLabel {
    pub text: String,
    pub position: Vec3,
    pub size: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Hemisphere {
        sky_color: [f32; 3],
        ground_color: [f32; 3],
        intensity: f32,
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        position: Vec3,
        casts_shadow: bool,
        shadow_map_size: u32,
        /// Half-width of the orthographic shadow frustum
        shadow_extent: f32,
    },
}

#[derive(Debug, Clone)]
pub enum NodeContent {
    Group,
    Points(Vec<InstanceBatch>),
    Lines(Vec<LineBatch>),
    Mesh(MeshSurface),
    Tags(Vec<TagLabel>),
    Light(Light),
}

impl NodeContent {
    /// `(elements, vertices)`; two contents with equal layouts can swap
    /// buffers without reallocating.
    pub fn layout(&self) -> (usize, usize) {
        match self {
            NodeContent::Points(batches) => {
                let n = batches.iter().map(|b| b.positions.len()).sum();
                (n, n)
            }
            NodeContent::Lines(batches) => batches.iter().fold((0, 0), |(items, verts), b| {
                (
                    items + b.polylines.len(),
                    verts + b.polylines.iter().map(Vec::len).sum::<usize>(),
                )
            }),
            NodeContent::Mesh(surface) => (surface.mesh.triangle_count(), surface.mesh.vertex_count()),
            NodeContent::Tags(tags) => (tags.len(), tags.len()),
            NodeContent::Group | NodeContent::Light(_) => (0, 0),
        }
    }

    /// Local bounds, not including children
    pub fn bounds(&self) -> Aabb {
        match self {
            NodeContent::Points(batches) => batches.iter().fold(Aabb::empty(), |acc, b| {
                let pts = Aabb::from_points(&b.positions);
                if pts.is_valid() {
                    acc.union(&pts.inflated(b.radius))
                } else {
                    acc
                }
            }),
            NodeContent::Lines(batches) => {
                let mut aabb = Aabb::empty();
                for p in batches.iter().flat_map(|b| b.polylines.iter().flatten()) {
                    aabb.extend(*p);
                }
                aabb
            }
            NodeContent::Mesh(surface) => surface.mesh.bounds(),
            NodeContent::Tags(tags) => {
                let mut aabb = Aabb::empty();
                for t in tags {
                    aabb.extend(t.position);
                }
                aabb
            }
            NodeContent::Group | NodeContent::Light(_) => Aabb::empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    name: NodeName,
    pub visible: bool,
    pub content: NodeContent,
    tag: Option<NodeTag>,
    parent: Option<NodeName>,
    children: Vec<NodeName>,
}

impl SceneNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&NodeTag> {
        self.tag.as_ref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[NodeName] {
        &self.children
    }
}

/// Flat node store with parent/child links
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeName, SceneNode>,
    roots: Vec<NodeName>,
    version: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh unique name with a readable prefix
    pub fn generate_name(prefix: &str) -> NodeName {
        format!("{prefix}-{}", uuid::Uuid::new_v4())
    }

    /// Insert a node under `parent` (or at the root). Inserting a name that
    /// already exists replaces its content and keeps its place and children.
    pub fn insert(&mut self, name: &str, content: NodeContent, parent: Option<&str>) -> NodeName {
        self.version += 1;
        if let Some(node) = self.nodes.get_mut(name) {
            node.content = content;
            return node.name.clone();
        }

        let parent = match parent {
            Some(p) if self.nodes.contains_key(p) => Some(p.to_string()),
            Some(p) => {
                tracing::warn!("parent {p} not in scene, inserting {name} at the root");
                None
            }
            None => None,
        };
        match &parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children.push(name.to_string());
                }
            }
            None => self.roots.push(name.to_string()),
        }
        self.nodes.insert(
            name.to_string(),
            SceneNode {
                name: name.to_string(),
                visible: true,
                content,
                tag: None,
                parent,
                children: Vec::new(),
            },
        );
        name.to_string()
    }

    /// Remove a node and its subtree. Removing a missing name is a no-op.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(node) = self.nodes.remove(name) else {
            return false;
        };
        self.version += 1;
        match &node.parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(p) {
                    parent.children.retain(|c| c != name);
                }
            }
            None => self.roots.retain(|r| r != name),
        }
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                stack.extend(removed.children);
            }
        }
        true
    }

    /// Remove every child of `name`, keeping the node itself
    pub fn clear_children(&mut self, name: &str) {
        let children = match self.nodes.get(name) {
            Some(node) => node.children.clone(),
            None => return,
        };
        for child in children {
            self.remove(&child);
        }
    }

    pub fn set_content(&mut self, name: &str, content: NodeContent) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                node.content = content;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                if node.visible != visible {
                    node.visible = visible;
                    self.version += 1;
                }
                true
            }
            None => false,
        }
    }

    pub fn set_tag(&mut self, name: &str, tag: NodeTag) -> bool {
        match self.nodes.get_mut(name) {
            Some(node) => {
                node.tag = Some(tag);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.get(name)
    }

    pub fn tag(&self, name: &str) -> Option<&NodeTag> {
        self.nodes.get(name)?.tag.as_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeName] {
        &self.roots
    }

    pub fn children(&self, name: &str) -> &[NodeName] {
        self.nodes.get(name).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Incremented on every structural or content change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bounds of a node and everything below it, hidden or not
    pub fn world_bounds(&self, name: &str) -> Option<Aabb> {
        let mut aabb = Aabb::empty();
        let mut stack = vec![self.nodes.get(name)?];
        while let Some(node) = stack.pop() {
            let local = node.content.bounds();
            if local.is_valid() {
                aabb = aabb.union(&local);
            }
            stack.extend(node.children.iter().filter_map(|c| self.nodes.get(c)));
        }
        aabb.is_valid().then_some(aabb)
    }

    /// Visible nodes in depth-first order; a hidden node hides its subtree.
    pub fn visible_nodes(&self) -> Vec<&SceneNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&SceneNode> = self.roots.iter().rev().filter_map(|r| self.nodes.get(r)).collect();
        while let Some(node) = stack.pop() {
            if !node.visible {
                continue;
            }
            out.push(node);
            stack.extend(node.children.iter().rev().filter_map(|c| self.nodes.get(c)));
        }
        out
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.version += 1;
    }
}
