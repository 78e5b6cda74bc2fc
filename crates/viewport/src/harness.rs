//! Headless test rig: a synchronizer, an orbit camera and a scripted kernel.
//!
//! Integration tests drive draws and camera input through [`TestHarness`]
//! and inspect the resulting scene without a GL context.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use shared::{methods, DecomposedMesh, HandleRef, Kernel, KernelError};
use tokio::sync::oneshot;

use crate::camera::{create_orbit_camera, OrbitCameraConfig, OrbitCameraController, RenderSurface};
use crate::error::{CameraError, DrawError};
use crate::input::InputEvent;
use crate::mesh::MergedMesh;
use crate::render::RenderSnapshot;
use crate::scene::{draw_async, DrawOptions, Entity, NodeContent, NodeName, SceneSync, SceneSyncConfig};

// ── Scripted kernel ─────────────────────────────────────────────

/// Kernel double that answers tessellation requests from registered meshes.
///
/// Calls for a held handle wait until the matching sender fires, so tests
/// can choose the order in which concurrent requests complete.
#[derive(Default)]
pub struct MockKernel {
    meshes: RefCell<HashMap<u64, Value>>,
    holds: RefCell<HashMap<u64, oneshot::Receiver<()>>>,
    calls: RefCell<Vec<(String, Value)>>,
    failure: RefCell<Option<KernelError>>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the mesh returned for `hash`; returns the handle to draw.
    pub fn add_mesh(&self, hash: u64, mesh: &DecomposedMesh) -> HandleRef {
        let value = serde_json::to_value(mesh).unwrap_or(Value::Null);
        self.meshes.borrow_mut().insert(hash, value);
        HandleRef::shape(hash)
    }

    /// Register a raw response, e.g. a corrupted one
    pub fn add_raw(&self, hash: u64, response: Value) -> HandleRef {
        self.meshes.borrow_mut().insert(hash, response);
        HandleRef::shape(hash)
    }

    /// The next call for `hash` blocks until the returned sender fires or drops.
    pub fn hold(&self, hash: u64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.borrow_mut().insert(hash, rx);
        tx
    }

    /// Every following call fails with `error`
    pub fn fail_with(&self, error: KernelError) {
        *self.failure.borrow_mut() = Some(error);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }

    fn lookup(&self, handle: &Value) -> Result<Value, KernelError> {
        let hash = handle["hash"]
            .as_u64()
            .ok_or_else(|| KernelError::InvalidPayload {
                method: methods::SHAPE_TO_MESH.to_string(),
                reason: "missing shape hash".to_string(),
            })?;
        self.meshes
            .borrow()
            .get(&hash)
            .cloned()
            .ok_or(KernelError::UnknownHandle(hash))
    }
}

impl Kernel for MockKernel {
    fn invoke(&self, method: &str, payload: Value) -> impl std::future::Future<Output = Result<Value, KernelError>> {
        tracing::debug!("mock kernel: {method}");
        self.calls.borrow_mut().push((method.to_string(), payload.clone()));

        let hold = payload["shape"]["hash"]
            .as_u64()
            .and_then(|hash| self.holds.borrow_mut().remove(&hash));
        let failure = self.failure.borrow().clone();
        let result = match method {
            methods::SHAPE_TO_MESH => self.lookup(&payload["shape"]),
            methods::SHAPES_TO_MESHES => payload["shapes"]
                .as_array()
                .map(|shapes| shapes.iter().map(|s| self.lookup(s)).collect::<Result<Vec<_>, _>>())
                .unwrap_or_else(|| Ok(Vec::new()))
                .map(Value::Array),
            methods::RELEASE_HANDLE | methods::RELEASE_HANDLES | methods::RELEASE_ALL => Ok(Value::Null),
            other => Err(KernelError::UnknownMethod(other.to_string())),
        };

        async move {
            if let Some(hold) = hold {
                let _ = hold.await;
            }
            match failure {
                Some(error) => Err(error),
                None => result,
            }
        }
    }
}

// ── Harness ─────────────────────────────────────────────────────

pub struct TestHarness {
    pub sync: Rc<RefCell<SceneSync>>,
    pub camera: OrbitCameraController,
    pub kernel: MockKernel,
}

impl TestHarness {
    pub fn new() -> Result<Self, CameraError> {
        Self::with_camera(OrbitCameraConfig::default())
    }

    pub fn with_camera(config: OrbitCameraConfig) -> Result<Self, CameraError> {
        Ok(Self {
            sync: Rc::new(RefCell::new(SceneSync::new(SceneSyncConfig::default()))),
            camera: create_orbit_camera(&config, Some(RenderSurface::new(800, 600)))?,
            kernel: MockKernel::new(),
        })
    }

    // ── Drawing ─────────────────────────────────────────────────

    pub fn draw(&self, entity: &Entity, options: Option<&DrawOptions>, previous: Option<&str>) -> Option<NodeName> {
        self.sync.borrow_mut().draw(entity, options, previous)
    }

    pub fn draw_json(&self, value: &Value, options: Option<&DrawOptions>, previous: Option<&str>) -> Option<NodeName> {
        self.sync.borrow_mut().draw_value(value, options, previous)
    }

    /// Draw through the scripted kernel
    pub async fn draw_kernel(
        &self,
        entity: &Entity,
        options: Option<&DrawOptions>,
        previous: Option<&str>,
    ) -> Result<Option<NodeName>, DrawError> {
        draw_async(&self.sync, &self.kernel, entity, options, previous).await
    }

    pub fn remove(&self, name: &str) -> bool {
        self.sync.borrow_mut().remove(name)
    }

    // ── Scene inspection ────────────────────────────────────────

    pub fn exists(&self, name: &str) -> bool {
        self.sync.borrow().scene().contains(name)
    }

    pub fn node_count(&self) -> usize {
        self.sync.borrow().scene().len()
    }

    pub fn material_count(&self) -> usize {
        self.sync.borrow().materials().len()
    }

    /// Instance count of each point batch under `name`
    pub fn point_batches(&self, name: &str) -> Vec<usize> {
        match self.content(name) {
            Some(NodeContent::Points(batches)) => batches.iter().map(|b| b.positions.len()).collect(),
            _ => Vec::new(),
        }
    }

    /// Batch colours of a points or lines node, in batch order
    pub fn batch_colors(&self, name: &str) -> Vec<[f32; 3]> {
        match self.content(name) {
            Some(NodeContent::Points(batches)) => batches.iter().map(|b| b.material.color).collect(),
            Some(NodeContent::Lines(batches)) => batches.iter().map(|b| b.material.color).collect(),
            _ => Vec::new(),
        }
    }

    /// Polyline count of each line batch under `name`
    pub fn line_batches(&self, name: &str) -> Vec<usize> {
        match self.content(name) {
            Some(NodeContent::Lines(batches)) => batches.iter().map(|b| b.polylines.len()).collect(),
            _ => Vec::new(),
        }
    }

    /// Every mesh in the subtree rooted at `name`, depth first
    pub fn meshes(&self, name: &str) -> Vec<MergedMesh> {
        let sync = self.sync.borrow();
        let scene = sync.scene();
        let mut out = Vec::new();
        let mut stack = vec![name.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = scene.get(&current) {
                if let NodeContent::Mesh(surface) = &node.content {
                    out.push(surface.mesh.clone());
                }
                stack.extend(node.children().iter().rev().cloned());
            }
        }
        out
    }

    pub fn content(&self, name: &str) -> Option<NodeContent> {
        self.sync.borrow().scene().get(name).map(|n| n.content.clone())
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(self.sync.borrow().scene())
    }

    // ── Camera ──────────────────────────────────────────────────

    pub fn send(&mut self, event: &InputEvent) -> bool {
        self.camera.handle_event(event)
    }

    pub fn send_all(&mut self, events: &[InputEvent]) {
        for event in events {
            self.camera.handle_event(event);
        }
    }

    /// Advance the camera until it settles on its target
    pub fn settle(&mut self) {
        for _ in 0..600 {
            self.camera.update(1.0 / 60.0);
        }
    }

    pub fn focus(&mut self, name: &str, padding: f32) -> bool {
        let sync = self.sync.borrow();
        self.camera.focus_on_object(sync.scene(), name, padding)
    }
}
