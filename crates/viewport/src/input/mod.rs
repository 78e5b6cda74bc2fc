//! Device input adapters for the orbit camera.
//!
//! Each adapter turns raw events from one device class into changes of the
//! camera's target state and nothing else; visible motion only ever comes
//! from [`OrbitCamera::update`](crate::camera::OrbitCamera::update).

mod keyboard;
mod pointer;
mod touch;

pub use keyboard::KeyboardInput;
pub use pointer::PointerInput;
pub use touch::TouchInput;

use glam::{Vec2, Vec3};

use crate::camera::OrbitCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Positions are in screen pixels, y down
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { button: PointerButton, position: Vec2 },
    Up { button: PointerButton },
    Move { position: Vec2 },
    /// Positive scrolls away from the user, in wheel notches
    Wheel { delta: f32 },
    /// Pointer left the surface or the window lost focus
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub id: u64,
    pub phase: TouchPhase,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Touch(TouchEvent),
    Key(KeyEvent),
}

/// Common surface of the three adapters
pub trait InputHandler {
    type Event;

    /// Apply one event; returns whether the camera target changed
    fn handle(&mut self, event: &Self::Event, camera: &mut OrbitCamera) -> bool;

    /// Detach: the handler ignores all further events
    fn destroy(&mut self);

    fn is_attached(&self) -> bool;
}

/// Orbit by a screen-space drag
pub(crate) fn orbit(camera: &mut OrbitCamera, delta: Vec2) {
    let sensitivity = camera.config().orbit_sensitivity;
    camera.set_pitch(camera.pitch() + delta.y * sensitivity);
    camera.set_yaw(camera.yaw() - delta.x * sensitivity);
}

/// Move the pivot along the current view plane, proportional to the distance
pub(crate) fn pan(camera: &mut OrbitCamera, delta: Vec2) {
    let scale = camera.config().pan_sensitivity * camera.distance();
    let pose = camera.pose();
    let offset: Vec3 = -pose.right() * delta.x * scale + pose.up() * delta.y * scale;
    camera.set_pivot_point(camera.pivot_point() + offset);
}
