//! Integration tests for the orbit camera and its input adapters.
//!
//! Tests end-to-end: input events -> controller -> damped camera pose.

use approx::assert_relative_eq;
use glam::{Vec2, Vec3};
use vcad_viewport_lib::camera::{create_orbit_camera, OrbitCameraConfig, RenderSurface};
use vcad_viewport_lib::error::CameraError;
use vcad_viewport_lib::fixtures::*;
use vcad_viewport_lib::harness::TestHarness;
use vcad_viewport_lib::input::{
    InputEvent, Key, KeyEvent, PointerButton, PointerEvent, TouchEvent, TouchPhase,
};
use vcad_viewport_lib::scene::{DrawOptions, Entity};
use vcad_viewport_lib::{Viewport, ViewportConfig};

fn pointer(event: PointerEvent) -> InputEvent {
    InputEvent::Pointer(event)
}

fn touch(id: u64, phase: TouchPhase, x: f32, y: f32) -> InputEvent {
    InputEvent::Touch(TouchEvent {
        id,
        phase,
        position: Vec2::new(x, y),
    })
}

fn key(key: Key, shift: bool) -> InputEvent {
    InputEvent::Key(KeyEvent { key, pressed: true, shift })
}

#[test]
fn test_camera_requires_surface() {
    let config = OrbitCameraConfig::default();
    assert_eq!(
        create_orbit_camera(&config, None).err(),
        Some(CameraError::SurfaceNotInitialized)
    );
    assert!(matches!(
        create_orbit_camera(&config, Some(RenderSurface::new(0, 0))),
        Err(CameraError::InvalidSurfaceSize { .. })
    ));
}

#[test]
fn test_initial_pose_matches_config() {
    let h = TestHarness::with_camera(camera_config(10.0, 0.0, 0.0)).unwrap();
    let pose = h.camera.camera().pose();
    assert_relative_eq!(pose.position.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(pose.position.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(pose.position.z, 10.0, epsilon = 1e-5);
    assert_eq!(pose.look_at, Vec3::ZERO);
}

#[test]
fn test_focus_on_drawn_cube() {
    let mut h = TestHarness::new().unwrap();
    let opts = DrawOptions {
        draw_edges: false,
        ..DrawOptions::default()
    };
    let name = h
        .draw(&Entity::DecomposedMesh(box_mesh(Vec3::splat(5.0), Vec3::splat(2.0))), Some(&opts), None)
        .unwrap();

    assert!(h.focus(&name, 1.5));
    let pivot = h.camera.pivot_point();
    assert_relative_eq!(pivot.x, 5.0, epsilon = 1e-4);
    assert_relative_eq!(pivot.y, 5.0, epsilon = 1e-4);
    assert_relative_eq!(pivot.z, 5.0, epsilon = 1e-4);

    let fov = h.camera.camera().pose().fov;
    let expected = 2.0 / (2.0 * (fov / 2.0).tan()) * 1.5;
    assert_relative_eq!(h.camera.distance(), expected, epsilon = 1e-4);
    // Focus jumps without easing
    assert_eq!(h.camera.camera().current().distance, h.camera.distance());
}

#[test]
fn test_focus_on_unknown_node() {
    let mut h = TestHarness::new().unwrap();
    let before = h.camera.pivot_point();
    assert!(!h.focus("mesh-missing", 1.0));
    assert_eq!(h.camera.pivot_point(), before);
}

#[test]
fn test_drag_orbits_and_eases() {
    let mut h = TestHarness::with_camera(camera_config(10.0, 0.0, 0.0)).unwrap();
    h.send_all(&[
        pointer(PointerEvent::Down {
            button: PointerButton::Primary,
            position: Vec2::new(100.0, 100.0),
        }),
        pointer(PointerEvent::Move { position: Vec2::new(100.0, 150.0) }),
        pointer(PointerEvent::Up { button: PointerButton::Primary }),
    ]);

    let sensitivity = OrbitCameraConfig::default().orbit_sensitivity;
    assert_relative_eq!(h.camera.pitch(), 50.0 * sensitivity, epsilon = 1e-4);
    // Nothing moves until the camera is updated
    assert_eq!(h.camera.camera().current().pitch, 0.0);

    h.camera.update(1.0 / 60.0);
    let partway = h.camera.camera().current().pitch;
    assert!(partway > 0.0 && partway < h.camera.pitch());

    h.settle();
    assert_relative_eq!(h.camera.camera().current().pitch, h.camera.pitch(), epsilon = 1e-3);
}

#[test]
fn test_pitch_never_reaches_pole() {
    let mut h = TestHarness::new().unwrap();
    for _ in 0..100 {
        h.send(&key(Key::ArrowUp, false));
    }
    assert!(h.camera.pitch() < 90.0);
    h.settle();
    let pose = h.camera.camera().pose();
    let dir = (pose.position - pose.look_at).normalize();
    assert!(dir.y < 1.0);
}

#[test]
fn test_distance_clamped_by_limits() {
    let mut h = TestHarness::new().unwrap();
    h.camera.set_distance_limits(2.0, 20.0);
    for _ in 0..200 {
        h.send(&pointer(PointerEvent::Wheel { delta: 1.0 }));
    }
    assert_relative_eq!(h.camera.distance(), 20.0);
    for _ in 0..200 {
        h.send(&pointer(PointerEvent::Wheel { delta: -1.0 }));
    }
    assert_relative_eq!(h.camera.distance(), 2.0);
}

#[test]
fn test_yaw_takes_short_way_around() {
    let mut h = TestHarness::with_camera(camera_config(10.0, 0.0, 170.0)).unwrap();
    h.camera.camera_mut().set_yaw(-170.0);
    h.camera.update(1.0 / 60.0);

    // Eased yaw stays within 20 degrees of the start, never sweeping through 0
    let current = h.camera.camera().current().yaw;
    let wrapped = (current - 170.0).rem_euclid(360.0);
    assert!(wrapped <= 20.0 + 1e-3, "current yaw {current}");

    h.settle();
    let pose = h.camera.camera().pose();
    let expected = Vec3::new((-170f32).to_radians().sin(), 0.0, (-170f32).to_radians().cos()) * 10.0;
    assert!((pose.position - expected).length() < 1e-2);
}

#[test]
fn test_keyboard_zoom_and_rotate() {
    let mut h = TestHarness::with_camera(camera_config(10.0, 0.0, 0.0)).unwrap();
    let config = OrbitCameraConfig::default();

    h.send(&key(Key::ArrowUp, true));
    assert_relative_eq!(h.camera.distance(), 10.0 / config.keyboard_zoom_ratio, epsilon = 1e-4);
    h.send(&key(Key::ArrowDown, true));
    assert_relative_eq!(h.camera.distance(), 10.0, epsilon = 1e-4);

    h.send(&key(Key::ArrowLeft, false));
    assert_relative_eq!(h.camera.yaw(), config.keyboard_step);
    assert!(!h.send(&key(Key::Other, false)));
}

#[test]
fn test_pinch_zoom_and_two_finger_pan() {
    let mut h = TestHarness::with_camera(camera_config(10.0, 0.0, 0.0)).unwrap();
    h.send_all(&[
        touch(1, TouchPhase::Start, 100.0, 100.0),
        touch(2, TouchPhase::Start, 200.0, 100.0),
        // spread from 100 to 200 pixels apart around the same midpoint
        touch(1, TouchPhase::Move, 50.0, 100.0),
        touch(2, TouchPhase::Move, 250.0, 100.0),
    ]);
    assert_relative_eq!(h.camera.distance(), 5.0, epsilon = 1e-3);

    // Both fingers slide right together: pan, no zoom
    let pivot = h.camera.pivot_point();
    h.send_all(&[
        touch(1, TouchPhase::Move, 60.0, 100.0),
        touch(2, TouchPhase::Move, 260.0, 100.0),
    ]);
    assert_relative_eq!(h.camera.distance(), 5.0, epsilon = 1e-3);
    assert_ne!(h.camera.pivot_point(), pivot);
}

#[test]
fn test_destroyed_controller_ignores_input() {
    let mut h = TestHarness::new().unwrap();
    h.camera.destroy();
    assert!(!h.camera.is_attached());
    assert!(!h.send(&pointer(PointerEvent::Wheel { delta: 1.0 })));
    assert!(!h.send(&key(Key::ArrowUp, false)));
}

#[test]
fn test_viewport_bootstrap() {
    let mut viewport = Viewport::new(ViewportConfig::default(), Some(RenderSurface::new(1280, 800))).unwrap();
    assert_eq!(viewport.lights().len(), 2);
    assert!(viewport.ground().is_some());

    let snapshot = viewport.snapshot();
    assert_eq!(snapshot.lights.len(), 2);
    assert_eq!(snapshot.meshes.len(), 1);

    let name = viewport
        .sync()
        .borrow_mut()
        .draw(&Entity::Points(three_points()), None, None)
        .unwrap();
    assert!(viewport.focus_on(&name, 1.0));
    let pose = viewport.frame(1.0 / 60.0);
    assert_eq!(pose.look_at, viewport.controller().pivot_point());
    assert_eq!(viewport.frames(), 1);

    viewport.dispose();
    assert!(viewport.sync().borrow().scene().is_empty());
    assert!(!viewport.controller().is_attached());
}

#[test]
fn test_viewport_without_orbit_controls() {
    let mut config = ViewportConfig::default();
    config.orbit_camera.enabled = false;
    config.ground.enabled = false;
    let mut viewport = Viewport::new(config, Some(RenderSurface::new(640, 480))).unwrap();
    assert!(viewport.ground().is_none());
    assert!(!viewport.handle_event(&pointer(PointerEvent::Wheel { delta: 1.0 })));
}

#[test]
fn test_yaw_wrap_moves_backwards() {
    let mut h = TestHarness::with_camera(camera_config(10.0, 0.0, 0.0)).unwrap();
    let camera = h.camera.camera_mut();
    camera.set_yaw(camera.yaw() + 350.0);
    let before = camera.current().yaw;
    camera.update(1.0 / 60.0);
    let after = camera.current().yaw;
    assert!(after < before, "yaw went from {before} to {after}");

    h.settle();
    let pose = h.camera.camera().pose();
    let expected = Vec3::new((-10f32).to_radians().sin(), 0.0, (-10f32).to_radians().cos()) * 10.0;
    assert!((pose.position - expected).length() < 1e-2);
}
