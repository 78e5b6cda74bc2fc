use std::collections::BTreeMap;

use glam::Vec2;

use super::{orbit, pan, InputHandler, TouchEvent, TouchPhase};
use crate::camera::OrbitCamera;

/// One finger orbits; two fingers pinch to zoom and drag to pan
#[derive(Debug, Default)]
pub struct TouchInput {
    contacts: BTreeMap<u64, Vec2>,
    /// Finger spacing and midpoint at the previous two-finger event
    last_pair: Option<(f32, Vec2)>,
    detached: bool,
}

impl TouchInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    fn pair(&self) -> Option<(f32, Vec2)> {
        if self.contacts.len() != 2 {
            return None;
        }
        let mut it = self.contacts.values();
        let (a, b) = (*it.next()?, *it.next()?);
        Some((a.distance(b), (a + b) * 0.5))
    }
}

impl InputHandler for TouchInput {
    type Event = TouchEvent;

    fn handle(&mut self, event: &TouchEvent, camera: &mut OrbitCamera) -> bool {
        if self.detached {
            return false;
        }
        match event.phase {
            TouchPhase::Start => {
                self.contacts.insert(event.id, event.position);
                self.last_pair = self.pair();
                false
            }
            TouchPhase::End | TouchPhase::Cancel => {
                self.contacts.remove(&event.id);
                self.last_pair = self.pair();
                false
            }
            TouchPhase::Move => {
                // Fingers that started elsewhere are not tracked
                let Some(slot) = self.contacts.get_mut(&event.id) else {
                    return false;
                };
                let previous = std::mem::replace(slot, event.position);
                match self.contacts.len() {
                    1 => {
                        orbit(camera, event.position - previous);
                        true
                    }
                    2 => {
                        let Some((spacing, midpoint)) = self.pair() else {
                            return false;
                        };
                        let moved = match self.last_pair {
                            Some((last_spacing, last_midpoint)) => {
                                if spacing > f32::EPSILON && last_spacing > f32::EPSILON {
                                    // Fingers apart zoom in.
                                    camera.set_distance(camera.distance() * last_spacing / spacing);
                                }
                                pan(camera, midpoint - last_midpoint);
                                true
                            }
                            None => false,
                        };
                        self.last_pair = Some((spacing, midpoint));
                        moved
                    }
                    _ => false,
                }
            }
        }
    }

    fn destroy(&mut self) {
        self.contacts.clear();
        self.last_pair = None;
        self.detached = true;
    }

    fn is_attached(&self) -> bool {
        !self.detached
    }
}
