//! The application context handed to every flow hook.
//!
//! [`Context`] owns the window surface, the GPU device and everything the
//! frame loop binds: camera, lights, the shadow map, pipelines and the
//! optional skybox. [`InitContext`] is the cheap, cloneable part flows get
//! while they are constructed, enough to load and compile nodes.

use std::sync::Arc;

use anyhow::Context as _;
use cgmath::Deg;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, PITCH, Projection, YAW},
    config::ViewerConfig,
    data_structures::{
        scene_graph::NodeResources,
        texture::{CubeTexture, Texture},
    },
    lights::LightRegistry,
    pipelines::{
        Pipelines,
        light::{LightResources, LightsUniform},
        scene::mk_scene_pipeline,
        shadow::{ShadowResources, mk_shadow_pipeline},
        skybox::{self, Skybox, mk_skybox_pipeline},
    },
};

pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub lights: LightRegistry,
    pub light_resources: LightResources,
    pub nodes: NodeResources,
    pub pipelines: Pipelines,
    pub shadow: ShadowResources,
    pub skybox_layout: wgpu::BindGroupLayout,
    pub skybox: Option<Skybox>,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
    /// Last measured frame rate.
    pub fps: f64,
}

impl Context {
    pub async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;
        log::info!("adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scene-ngin device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders write linear colour and expect an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("no supported surface formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if viewer.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut camera = Camera::new(viewer.camera_position, Deg(YAW), Deg(PITCH));
        camera.movement_speed = viewer.camera_speed;
        camera.mouse_sensitivity = viewer.camera_sensitivity;
        let projection = Projection::new(config.width, config.height, Z_NEAR, Z_FAR);
        let camera = CameraResources::new(&device, camera, projection);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let lights = LightRegistry::new();
        let light_resources = LightResources::new(&device, &LightsUniform::default());
        let nodes = NodeResources::new(&device, &queue);
        let shadow = ShadowResources::new(&device, &viewer.shadows);
        let skybox_layout = skybox::mk_bind_group_layout(&device);

        log::info!("building pipelines");
        let pipelines = Pipelines {
            scene: mk_scene_pipeline(
                &device,
                &config,
                &camera.bind_group_layout,
                &light_resources.bind_group_layout,
                &nodes.layout,
                &shadow.bind_group_layout,
            ),
            shadow: mk_shadow_pipeline(&device, &shadow.pass_bind_group_layout, &nodes.layout),
            skybox: mk_skybox_pipeline(
                &device,
                &config,
                &camera.bind_group_layout,
                &skybox_layout,
            ),
        };

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            lights,
            light_resources,
            nodes,
            pipelines,
            shadow,
            skybox_layout,
            skybox: None,
            clear_colour: viewer.clear_colour,
            tick_duration_millis: viewer.tick_duration_millis,
            fps: 0.0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Replaces the skybox. `None` for `intensity` keeps the previous value
    /// (or the default for the first skybox).
    pub fn set_skybox(&mut self, cube: CubeTexture, intensity: Option<f32>) {
        let intensity = intensity
            .or(self.skybox.as_ref().map(Skybox::intensity))
            .unwrap_or(skybox::DEFAULT_INTENSITY);
        self.skybox = Some(Skybox::new(
            &self.device,
            &self.skybox_layout,
            cube,
            intensity,
        ));
    }

    pub fn set_skybox_intensity(&mut self, intensity: f32) {
        match &mut self.skybox {
            Some(skybox) => skybox.set_intensity(&self.queue, intensity),
            None => log::warn!("skybox intensity set without a skybox"),
        }
    }

    /// Reconfigures the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.camera.projection.resize(width, height);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        log::debug!("resized to {width}x{height}");
        true
    }
}

/// Device handles and node resources for compiling nodes while flows are
/// constructed. `wgpu` handles are reference counted, cloning is cheap.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub nodes: NodeResources,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            nodes: ctx.nodes.clone(),
        }
    }
}
