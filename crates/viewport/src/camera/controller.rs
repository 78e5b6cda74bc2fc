use glam::Vec3;

use super::{OrbitCamera, OrbitCameraConfig};
use crate::error::CameraError;
use crate::input::{InputEvent, InputHandler, KeyboardInput, PointerInput, TouchInput};
use crate::scene::SceneGraph;

/// Size of the surface the camera renders into, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurface {
    pub width: u32,
    pub height: u32,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    fn validate(self) -> Result<Self, CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::InvalidSurfaceSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }
}

/// Orbit camera wired to pointer, touch and keyboard input
pub struct OrbitCameraController {
    camera: OrbitCamera,
    pointer: PointerInput,
    touch: TouchInput,
    keyboard: KeyboardInput,
    surface: RenderSurface,
}

/// Create a camera for an initialized rendering surface.
pub fn create_orbit_camera(
    config: &OrbitCameraConfig,
    surface: Option<RenderSurface>,
) -> Result<OrbitCameraController, CameraError> {
    let surface = surface.ok_or(CameraError::SurfaceNotInitialized)?.validate()?;
    tracing::debug!("creating orbit camera for {}x{} surface", surface.width, surface.height);
    Ok(OrbitCameraController {
        camera: OrbitCamera::new(config.clone(), surface.aspect()),
        pointer: PointerInput::new(),
        touch: TouchInput::new(),
        keyboard: KeyboardInput::new(),
        surface,
    })
}

impl OrbitCameraController {
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn surface(&self) -> RenderSurface {
        self.surface
    }

    /// Per-frame tick
    pub fn update(&mut self, dt: f32) {
        self.camera.update(dt);
    }

    /// Route an event to the matching adapter; returns whether the target moved
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer(e) => self.pointer.handle(e, &mut self.camera),
            InputEvent::Touch(e) => self.touch.handle(e, &mut self.camera),
            InputEvent::Key(e) => self.keyboard.handle(e, &mut self.camera),
        }
    }

    /// A zero-sized surface (minimized window) keeps the previous aspect.
    pub fn resize(&mut self, surface: RenderSurface) {
        match surface.validate() {
            Ok(surface) => {
                self.surface = surface;
                self.camera.set_aspect(surface.aspect());
            }
            Err(e) => tracing::debug!("ignoring resize: {e}"),
        }
    }

    /// Detach all input adapters
    pub fn destroy(&mut self) {
        self.pointer.destroy();
        self.touch.destroy();
        self.keyboard.destroy();
    }

    pub fn is_attached(&self) -> bool {
        self.pointer.is_attached() || self.touch.is_attached() || self.keyboard.is_attached()
    }

    pub fn set_pivot_point(&mut self, pivot: Vec3) {
        self.camera.set_pivot_point(pivot);
    }

    pub fn pivot_point(&self) -> Vec3 {
        self.camera.pivot_point()
    }

    /// Frame a scene node and its subtree; `false` if it has no geometry
    pub fn focus_on_object(&mut self, scene: &SceneGraph, name: &str, padding: f32) -> bool {
        match scene.world_bounds(name) {
            Some(bounds) => self.camera.focus(&bounds, padding),
            None => {
                tracing::debug!("nothing to focus on in {name}");
                false
            }
        }
    }

    pub fn reset_camera(&mut self, yaw: f32, pitch: f32, distance: f32) {
        self.camera.reset(yaw, pitch, distance);
    }

    pub fn set_distance_limits(&mut self, min: f32, max: f32) {
        self.camera.set_distance_limits(min, max);
    }

    pub fn set_pitch_limits(&mut self, min: f32, max: f32) {
        self.camera.set_pitch_limits(min, max);
    }

    pub fn distance(&self) -> f32 {
        self.camera.distance()
    }

    pub fn yaw(&self) -> f32 {
        self.camera.yaw()
    }

    pub fn pitch(&self) -> f32 {
        self.camera.pitch()
    }
}
