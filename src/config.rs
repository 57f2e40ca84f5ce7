//! Start-up configuration of the viewer.
//!
//! Everything has a default, so `ViewerConfig::default()` gives a working
//! window. Knobs that may change at runtime (clear colour, tick duration)
//! are copied into the [`Context`](crate::context::Context) and can be
//! changed there.

use std::path::PathBuf;

use cgmath::Point3;

#[derive(Clone, Debug, PartialEq)]
pub struct ShadowConfig {
    pub enabled: bool,
    /// Width and height of the square shadow map.
    pub resolution: u32,
    /// Half-width of the area around the focus point that receives shadows.
    pub extent: f32,
    /// Distance of the virtual light position from the focus point.
    pub distance: f32,
    /// Depth offset subtracted before the shadow comparison.
    pub bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 2048,
            extent: 150.0,
            distance: 300.0,
            bias: 0.002,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    /// `env_logger` filter such as `info` or `scene_ngin=debug`. `RUST_LOG`
    /// is used when this is `None`.
    pub filter: Option<String>,
    /// File the log is copied to, truncated at start-up.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            file: Some(PathBuf::from("main.log")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Frames per second cap enforced by spin-waiting. `None` renders as
    /// fast as the present mode allows.
    pub fps_cap: Option<u32>,
    pub vsync: bool,
    /// Hide and lock the cursor for mouse look.
    pub capture_cursor: bool,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
    /// How often the window title shows a new FPS value.
    pub fps_refresh_secs: f64,
    pub camera_position: Point3<f32>,
    pub camera_speed: f32,
    pub camera_sensitivity: f32,
    pub shadows: ShadowConfig,
    pub logging: LoggingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "scene-ngin".to_string(),
            width: 1280,
            height: 720,
            fps_cap: Some(60),
            vsync: false,
            capture_cursor: true,
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
            tick_duration_millis: 10,
            fps_refresh_secs: 0.25,
            camera_position: Point3::new(0.0, 5.0, 20.0),
            camera_speed: crate::camera::SPEED,
            camera_sensitivity: crate::camera::SENSITIVITY,
            shadows: ShadowConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps_cap(mut self, fps_cap: Option<u32>) -> Self {
        self.fps_cap = fps_cap;
        self
    }

    pub fn with_shadows(mut self, shadows: ShadowConfig) -> Self {
        self.shadows = shadows;
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}
