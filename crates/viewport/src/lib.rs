// Library crate: scene synchronization, camera and input, all testable headless.
// The eframe shell and the GL renderer live in the binary crate.

pub mod bootstrap;
pub mod bounds;
pub mod camera;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod grouping;
pub mod harness;
pub mod input;
pub mod material;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod validation;

pub use bootstrap::Viewport;
pub use camera::{create_orbit_camera, OrbitCamera, OrbitCameraConfig, OrbitCameraController, RenderSurface};
pub use config::ViewportConfig;
pub use error::{CameraError, ConfigError, DrawError};
pub use scene::{draw_async, DrawOptions, Entity, SceneGraph, SceneSync};
