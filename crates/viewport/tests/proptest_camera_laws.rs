//! Property tests for the orbit camera limits.
//!
//! Whatever values are assigned, and however many damped updates run, both the
//! target and the eased state stay inside the configured distance and pitch
//! windows, and pitch never reaches a pole.

use proptest::prelude::*;
use vcad_viewport_lib::camera::{OrbitCamera, OrbitCameraConfig, PITCH_POLE_LIMIT};

fn camera(distance: f32, pitch: f32, yaw: f32) -> OrbitCamera {
    OrbitCamera::new(
        OrbitCameraConfig {
            distance,
            pitch,
            yaw,
            ..OrbitCameraConfig::default()
        },
        1.0,
    )
}

fn finite() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("finite", |v| v.is_finite() && v.abs() < 1.0e6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn distance_stays_within_limits(
        start in 0.5f32..500.0,
        (a, b) in (0.1f32..100.0, 0.1f32..100.0),
        steps in prop::collection::vec((finite(), 0.0f32..0.5), 1..20),
    ) {
        let mut cam = camera(start, 0.0, 0.0);
        cam.set_distance_limits(a, b);
        let (lo, hi) = (a.min(b), a.max(b));
        let slack = 1e-4 * hi.max(1.0);

        prop_assert!(cam.current().distance >= lo && cam.current().distance <= hi);
        for (distance, dt) in steps {
            cam.set_distance(distance);
            prop_assert!(cam.distance() >= lo && cam.distance() <= hi);
            cam.update(dt);
            let eased = cam.current().distance;
            prop_assert!(eased >= lo - slack && eased <= hi + slack, "eased {} outside [{}, {}]", eased, lo, hi);
        }
    }

    #[test]
    fn pitch_stays_within_limits(
        start in -89.0f32..89.0,
        (a, b) in (-200.0f32..200.0, -200.0f32..200.0),
        steps in prop::collection::vec((finite(), 0.0f32..0.5), 1..20),
    ) {
        let mut cam = camera(10.0, start, 0.0);
        cam.set_pitch_limits(a, b);
        let (lo, hi) = cam.pitch_range();
        prop_assert!(lo <= hi);
        prop_assert!(lo >= -PITCH_POLE_LIMIT && hi <= PITCH_POLE_LIMIT);

        prop_assert!(cam.current().pitch >= lo && cam.current().pitch <= hi);
        for (pitch, dt) in steps {
            cam.set_pitch(pitch);
            prop_assert!(cam.pitch() >= lo && cam.pitch() <= hi);
            cam.update(dt);
            let eased = cam.current().pitch;
            prop_assert!(eased >= lo - 1e-3 && eased <= hi + 1e-3, "eased {} outside [{}, {}]", eased, lo, hi);
            prop_assert!(eased.abs() < 90.0);
        }
    }

    #[test]
    fn yaw_turns_the_short_way(start in -720.0f32..720.0, dt in 0.001f32..0.05) {
        let mut cam = camera(10.0, 0.0, start);
        cam.set_yaw(cam.yaw() + 350.0);
        let before = cam.current().yaw;
        cam.update(dt);
        prop_assert!(cam.current().yaw < before);
        prop_assert!(before - cam.current().yaw <= 10.0 + 1e-3);
    }
}
