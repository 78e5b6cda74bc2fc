use super::{InputHandler, Key, KeyEvent};
use crate::camera::OrbitCamera;

/// Arrow keys orbit in fixed steps; Shift+Up/Down zooms
#[derive(Debug, Default)]
pub struct KeyboardInput {
    detached: bool,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputHandler for KeyboardInput {
    type Event = KeyEvent;

    fn handle(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) -> bool {
        if self.detached || !event.pressed {
            return false;
        }
        let step = camera.config().keyboard_step;
        let ratio = camera.config().keyboard_zoom_ratio;
        match (event.key, event.shift) {
            (Key::ArrowUp, true) => camera.set_distance(camera.distance() / ratio),
            (Key::ArrowDown, true) => camera.set_distance(camera.distance() * ratio),
            (Key::ArrowUp, false) => camera.set_pitch(camera.pitch() + step),
            (Key::ArrowDown, false) => camera.set_pitch(camera.pitch() - step),
            (Key::ArrowLeft, _) => camera.set_yaw(camera.yaw() + step),
            (Key::ArrowRight, _) => camera.set_yaw(camera.yaw() - step),
            (Key::Other, _) => return false,
        }
        true
    }

    fn destroy(&mut self) {
        self.detached = true;
    }

    fn is_attached(&self) -> bool {
        !self.detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCameraConfig;
    use approx::assert_relative_eq;

    fn press(key: Key, shift: bool) -> KeyEvent {
        KeyEvent { key, pressed: true, shift }
    }

    fn camera() -> OrbitCamera {
        OrbitCamera::new(
            OrbitCameraConfig {
                yaw: 0.0,
                pitch: 0.0,
                distance: 10.0,
                ..OrbitCameraConfig::default()
            },
            1.0,
        )
    }

    #[test]
    fn test_arrows_step_angles() {
        let mut cam = camera();
        let mut kb = KeyboardInput::new();
        kb.handle(&press(Key::ArrowUp, false), &mut cam);
        kb.handle(&press(Key::ArrowLeft, false), &mut cam);
        assert_eq!(cam.pitch(), 5.0);
        assert_eq!(cam.yaw(), 5.0);
    }

    #[test]
    fn test_shift_arrows_zoom() {
        let mut cam = camera();
        let mut kb = KeyboardInput::new();
        kb.handle(&press(Key::ArrowDown, true), &mut cam);
        assert_relative_eq!(cam.distance(), 11.0, epsilon = 1e-5);
        assert_eq!(cam.pitch(), 0.0);
    }

    #[test]
    fn test_release_and_other_keys_ignored() {
        let mut cam = camera();
        let mut kb = KeyboardInput::new();
        let release = KeyEvent { key: Key::ArrowUp, pressed: false, shift: false };
        assert!(!kb.handle(&release, &mut cam));
        assert!(!kb.handle(&press(Key::Other, false), &mut cam));
        kb.destroy();
        assert!(!kb.handle(&press(Key::ArrowUp, false), &mut cam));
        assert_eq!(cam.pitch(), 0.0);
    }
}
