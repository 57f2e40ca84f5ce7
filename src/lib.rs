//! scene-ngin
//!
//! A small real-time 3D scene viewer on top of `wgpu`. Drawable nodes
//! accumulate vertex attribute buffers, derive their model matrix from a
//! position/origin/rotation/scale transform and draw themselves with a Phong
//! pipeline lit by directional, point and spot lights, with an optional
//! shadow map and a skybox.
//!
//! High-level modules
//! - `animation`: path following, day cycle and oscillating values
//! - `camera`: fly camera, controller and uniforms for view/projection
//! - `config`: start-up configuration of window, camera, shadows and logging
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: buffers, geometry, textures and the drawable nodes
//! - `flow`: flows (scene parts) and the event/frame loop driving them
//! - `lights`: the light registry pushed to the shaders every frame
//! - `logging`: `env_logger` set-up with a log file
//! - `pipelines`: scene, shadow and skybox pipelines
//! - `render`: what a flow draws in a frame
//! - `resources`: helpers to load models, textures and cube maps
//! - `time`: frame pacing and FPS measurement
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod lights;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::Color;
pub use winit::keyboard::KeyCode;
