use std::collections::HashSet;

use glam::Vec2;

use super::{orbit, pan, InputHandler, PointerButton, PointerEvent};
use crate::camera::OrbitCamera;

/// Mouse and pen: drag to orbit or pan, wheel to zoom
#[derive(Debug, Default)]
pub struct PointerInput {
    held: HashSet<PointerButton>,
    last_position: Option<Vec2>,
    detached: bool,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, button: PointerButton) -> bool {
        self.held.contains(&button)
    }
}

impl InputHandler for PointerInput {
    type Event = PointerEvent;

    fn handle(&mut self, event: &PointerEvent, camera: &mut OrbitCamera) -> bool {
        if self.detached {
            return false;
        }
        match *event {
            PointerEvent::Down { button, position } => {
                self.held.insert(button);
                self.last_position = Some(position);
                false
            }
            PointerEvent::Up { button } => {
                self.held.remove(&button);
                false
            }
            PointerEvent::Move { position } => {
                let delta = self.last_position.map(|last| position - last);
                self.last_position = Some(position);
                let Some(delta) = delta else {
                    return false;
                };
                if self.is_held(PointerButton::Primary) {
                    orbit(camera, delta);
                    true
                } else if self.is_held(PointerButton::Secondary) || self.is_held(PointerButton::Middle) {
                    pan(camera, delta);
                    true
                } else {
                    false
                }
            }
            PointerEvent::Wheel { delta } => {
                let factor = 1.0 + delta * camera.config().distance_sensitivity;
                if factor <= 0.0 || delta == 0.0 {
                    return false;
                }
                camera.set_distance(camera.distance() * factor);
                true
            }
            PointerEvent::Leave => {
                self.held.clear();
                self.last_position = None;
                false
            }
        }
    }

    fn destroy(&mut self) {
        self.held.clear();
        self.last_position = None;
        self.detached = true;
    }

    fn is_attached(&self) -> bool {
        !self.detached
    }
}
