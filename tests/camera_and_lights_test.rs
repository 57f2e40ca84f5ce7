use approx::assert_relative_eq;
use std::time::Duration;

use cgmath::{Deg, Point3, Vector3};
use scene_ngin::{
    KeyCode,
    camera::{Camera, CameraController, CameraMovement, MAX_PITCH, MAX_ZOOM, MIN_ZOOM},
    lights::{DirectionalLight, LightRegistry, PointLight},
    pipelines::light::MAX_POINT_LIGHTS,
};

#[test]
fn pitch_stays_clamped_under_any_mouse_input() {
    let mut camera = Camera::default();
    let offsets = [500.0, 3000.0, -10_000.0, 42.0, -7.5, 10_000.0, -900.0];
    for (i, dy) in offsets.into_iter().enumerate() {
        camera.process_mouse_movement(i as f32 * 13.0, dy, true);
        assert!(camera.pitch.0.abs() <= MAX_PITCH, "pitch {:?}", camera.pitch);
    }
    camera.process_mouse_movement(0.0, 5000.0, true);
    assert_eq!(camera.pitch, Deg(MAX_PITCH));
}

#[test]
fn unconstrained_pitch_may_pass_the_limit() {
    let mut camera = Camera::default();
    camera.process_mouse_movement(0.0, 1000.0, false);
    assert_relative_eq!(camera.pitch.0, 100.0, epsilon = 1e-4);
}

#[test]
fn zoom_stays_within_bounds() {
    let mut camera = Camera::default();
    for offset in [10.0, 50.0, -3.0, -100.0, 0.5, 44.0] {
        camera.process_mouse_scroll(offset);
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&camera.zoom));
    }
    camera.process_mouse_scroll(100.0);
    assert_eq!(camera.zoom, MIN_ZOOM);
}

#[test]
fn keyboard_moves_along_the_view_direction() {
    let mut camera = Camera::default();
    camera.process_keyboard(CameraMovement::Forward, 1.0);
    assert_relative_eq!(camera.position, Point3::new(0.0, 0.0, -20.0), epsilon = 1e-4);
    camera.process_keyboard(CameraMovement::Right, 0.5);
    assert_relative_eq!(camera.position, Point3::new(10.0, 0.0, -20.0), epsilon = 1e-4);
}

#[test]
fn controller_applies_held_keys_and_mouse_once() {
    let mut camera = Camera::default();
    let mut controller = CameraController::new();
    assert!(controller.process_keyboard(KeyCode::KeyW, winit::event::ElementState::Pressed));
    assert!(!controller.process_keyboard(KeyCode::KeyQ, winit::event::ElementState::Pressed));
    controller.handle_mouse(0.0, 100.0);

    controller.update(&mut camera, Duration::from_millis(500));
    assert_relative_eq!(camera.position.z, -10.0, epsilon = 1e-4);
    // window y grows downwards
    assert_relative_eq!(camera.pitch.0, -10.0, epsilon = 1e-4);

    controller.update(&mut camera, Duration::from_millis(500));
    assert_relative_eq!(camera.pitch.0, -10.0, epsilon = 1e-4);
}

fn sun() -> DirectionalLight {
    DirectionalLight::new(
        "sun",
        Vector3::new(75.0, 0.0, 0.0),
        Vector3::new(0.1, 0.1, 0.1),
        Vector3::new(1.0, 0.5, 0.3),
        Vector3::new(1.0, 0.5, 0.3),
    )
}

fn lamp(name: &str) -> PointLight {
    PointLight::new(
        name,
        Vector3::new(0.0, 3.0, 0.0),
        Vector3::new(0.2, 0.2, 0.2),
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(1.0, 1.0, 1.0),
        1.0,
        0.22,
        0.02,
    )
}

#[test]
fn lights_are_found_and_changed_by_name() {
    let mut lights = LightRegistry::new();
    lights.add_light(sun()).add_light(lamp("porch"));

    let light = lights.directional_light_by_name("sun").unwrap();
    light.diffuse = Vector3::new(0.0, 0.0, 0.0);
    assert_eq!(
        lights.directional_lights()[0].diffuse,
        Vector3::new(0.0, 0.0, 0.0)
    );
    assert!(lights.directional_light_by_name("moon").is_none());
    assert!(lights.spot_light_by_name("porch").is_none());
    assert!(lights.point_light_by_name("porch").is_some());
}

#[test]
fn uniform_holds_counts_and_drops_the_overflow() {
    let mut lights = LightRegistry::new();
    lights.add_light(sun());
    for i in 0..MAX_POINT_LIGHTS + 3 {
        lights.add_light(lamp(&format!("lamp {i}")));
    }
    assert_eq!(lights.point_lights().len(), MAX_POINT_LIGHTS + 3);

    let uniform = lights.to_uniform();
    assert_eq!(uniform.counts, [1, MAX_POINT_LIGHTS as u32, 0, 0]);
    assert_eq!(uniform.directional[0].direction, [75.0, 0.0, 0.0]);
    assert_eq!(uniform.point[0].linear, 0.22);
}

#[test]
fn removed_point_light_is_gone() {
    let mut lights = LightRegistry::new();
    lights.add_light(lamp("a")).add_light(lamp("b"));
    assert_eq!(lights.remove_point_light("a").unwrap().name, "a");
    assert!(lights.remove_point_light("a").is_none());
    assert_eq!(lights.to_uniform().counts, [0, 1, 0, 0]);
    assert!(!lights.is_empty());
}
