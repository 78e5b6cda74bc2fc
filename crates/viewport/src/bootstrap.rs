//! Assembles a running viewport: scene, lights, ground and camera.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use crate::camera::{create_orbit_camera, CameraPose, OrbitCameraController, RenderSurface};
use crate::config::ViewportConfig;
use crate::error::CameraError;
use crate::input::InputEvent;
use crate::material::parse_hex_color;
use crate::mesh::primitives::ground_plane;
use crate::render::RenderSnapshot;
use crate::scene::{Light, MeshSurface, NodeContent, NodeName, SceneGraph, SceneSync};

pub struct Viewport {
    config: ViewportConfig,
    sync: Rc<RefCell<SceneSync>>,
    controller: OrbitCameraController,
    lights: Vec<NodeName>,
    ground: Option<NodeName>,
    frames: u64,
}

impl Viewport {
    /// Build the scene rig for a surface. Fails without a usable surface.
    pub fn new(config: ViewportConfig, surface: Option<RenderSurface>) -> Result<Self, CameraError> {
        let mut controller = create_orbit_camera(&config.orbit_camera.config, surface)?;
        if !config.orbit_camera.enabled {
            // Static camera at the configured pose.
            controller.destroy();
        }

        let mut sync = SceneSync::new(config.scene_sync.clone());
        let lights = add_lights(sync.scene_mut(), &config);
        let ground = add_ground(&mut sync, &config);
        tracing::info!(
            "viewport ready: {} lights, ground {}, shadows {}",
            lights.len(),
            if ground.is_some() { "on" } else { "off" },
            if config.shadows.enabled { "on" } else { "off" },
        );

        Ok(Self {
            config,
            sync: Rc::new(RefCell::new(sync)),
            controller,
            lights,
            ground,
            frames: 0,
        })
    }

    /// Shared handle to the synchronizer, for sync and async draws
    pub fn sync(&self) -> Rc<RefCell<SceneSync>> {
        Rc::clone(&self.sync)
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn controller(&self) -> &OrbitCameraController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut OrbitCameraController {
        &mut self.controller
    }

    pub fn lights(&self) -> &[NodeName] {
        &self.lights
    }

    pub fn ground(&self) -> Option<&str> {
        self.ground.as_deref()
    }

    pub fn background_color(&self) -> [f32; 3] {
        color_or(&self.config.background_color, [0.12, 0.12, 0.14])
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.controller.resize(RenderSurface::new(width, height));
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.controller.handle_event(event)
    }

    /// Advance the camera by `dt` seconds and return the pose to render with
    pub fn frame(&mut self, dt: f32) -> CameraPose {
        self.frames += 1;
        self.controller.update(dt);
        *self.controller.camera().pose()
    }

    /// Snapshot of the visible scene
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(self.sync.borrow().scene())
    }

    /// Frame a drawn node with the camera
    pub fn focus_on(&mut self, name: &str, padding: f32) -> bool {
        let sync = self.sync.borrow();
        self.controller.focus_on_object(sync.scene(), name, padding)
    }

    /// Release the scene, every cached material and all input handlers
    pub fn dispose(&mut self) {
        self.sync.borrow_mut().dispose();
        self.controller.destroy();
        self.lights.clear();
        self.ground = None;
        tracing::info!("viewport disposed after {} frames", self.frames);
    }
}

fn add_lights(scene: &mut SceneGraph, config: &ViewportConfig) -> Vec<NodeName> {
    let lights = &config.lights;
    let hemisphere = Light::Hemisphere {
        sky_color: color_or(&lights.hemisphere_sky_color, [1.0; 3]),
        ground_color: color_or(&lights.hemisphere_ground_color, [0.27; 3]),
        intensity: lights.hemisphere_intensity,
    };
    let directional = Light::Directional {
        color: color_or(&lights.directional_color, [1.0; 3]),
        intensity: lights.directional_intensity,
        position: Vec3::from_array(lights.directional_position) * config.scene_size,
        casts_shadow: config.shadows.enabled,
        shadow_map_size: config.shadows.map_size,
        shadow_extent: config.scene_size,
    };
    [("hemisphere-light", hemisphere), ("directional-light", directional)]
        .into_iter()
        .map(|(prefix, light)| scene.insert(&SceneGraph::generate_name(prefix), NodeContent::Light(light), None))
        .collect()
}

fn add_ground(sync: &mut SceneSync, config: &ViewportConfig) -> Option<NodeName> {
    let ground = &config.ground;
    if !ground.enabled {
        return None;
    }
    let material = sync.materials_mut().standard(&ground.color, ground.opacity, 0.0);
    let surface = MeshSurface {
        mesh: ground_plane(Vec3::from_array(ground.center), config.scene_size * ground.scale),
        material,
        casts_shadow: false,
    };
    let name = SceneGraph::generate_name("ground");
    Some(sync.scene_mut().insert(&name, NodeContent::Mesh(surface), None))
}

fn color_or(hex: &str, fallback: [f32; 3]) -> [f32; 3] {
    parse_hex_color(hex).unwrap_or_else(|| {
        tracing::warn!("invalid colour {hex:?} in settings");
        fallback
    })
}
