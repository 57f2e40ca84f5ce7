//! Flow control and application event loop.
//!
//! A "flow" is a part of the scene that owns its nodes, reacts to input,
//! updates its state and tells the engine what to draw each frame. The
//! engine owns the [`Context`] and drives every flow through the same
//! lifecycle.
//!
//! # Lifecycle Flow
//!
//! Each frame:
//! 1. Wait for the frame cap and refresh the FPS in the window title
//! 2. Call `on_tick` on all flows when a tick is due
//! 3. Move the camera and call `on_update` on all flows
//! 4. Upload lights, camera and node uniforms
//! 5. Render the shadow map, the scene and the skybox
//! 6. Present the frame

use std::{pin::Pin, sync::Arc};

use instant::Duration;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window},
};

use crate::{
    config::ViewerConfig,
    context::{Context, InitContext},
    data_structures::scene_graph::SceneNode,
    logging::init_logging,
    pipelines::{CAMERA_GROUP, LIGHT_GROUP, SHADOW_GROUP, SHADOW_PASS_GROUP},
    render::Render,
    time::{FpsCounter, FramePacer, fps_title},
};

/// Trait for implementing a part of the scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after all flows are constructed; add lights,
///    set the skybox or move the camera here
/// 2. `on_window_events()` and `on_device_events()` are called for each winit
///    input event
/// 3. `on_tick()` is called every `tick_duration_millis`
/// 4. `on_update()` is called every frame
/// 5. `on_render()` is called each frame and returns the nodes to draw
pub trait GraphicsFlow {
    fn on_init(&mut self, ctx: &mut Context);

    /// Called every frame with the time since the previous frame.
    fn on_update(&mut self, ctx: &mut Context, dt: Duration);

    /// Called every `tick_duration_millis` milliseconds (see [`Context`]).
    /// Use for fixed-step animation.
    fn on_tick(&mut self, ctx: &mut Context);

    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent);

    fn on_device_events(&mut self, ctx: &Context, event: &DeviceEvent);

    fn on_render(&self) -> Render<'_>;
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`, so models and textures can be loaded concurrently.
pub type FlowConstructor = Box<
    dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow>>>>>,
>;

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: ViewerConfig,
    ctx: Option<Context>,
    graphics_flows: Vec<Box<dyn GraphicsFlow>>,
    // Taken on the first `resumed`.
    constructors: Option<Vec<FlowConstructor>>,
    pacer: FramePacer,
    fps: FpsCounter,
    time_since_tick: Duration,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewerConfig, constructors: Vec<FlowConstructor>) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            async_runtime,
            pacer: FramePacer::new(config.fps_cap),
            fps: FpsCounter::new(Duration::from_secs_f64(config.fps_refresh_secs)),
            config,
            ctx: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            time_since_tick: Duration::ZERO,
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        if self.config.capture_cursor {
            capture_cursor(&window);
        }

        let constructors = self.constructors.take().unwrap_or_default();
        let config = &self.config;
        let init_future = async move {
            let ctx = Context::new(window, config).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                // device and queue are reference counted, this only clones handles
                .map(|constructor| constructor((&ctx).into()))
                .collect();
            let flows = futures::future::join_all(flow_futures)
                .await
                .into_iter()
                .collect::<anyhow::Result<Vec<_>>>()?;
            anyhow::Ok((ctx, flows))
        };
        let (mut ctx, mut flows) = self.async_runtime.block_on(init_future)?;

        flows.iter_mut().for_each(|flow| flow.on_init(&mut ctx));
        log::info!("{} flows initialized", flows.len());
        ctx.window.request_redraw();
        self.graphics_flows = flows;
        self.ctx = Some(ctx);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        // invoke main render loop
        ctx.window.request_redraw();

        let dt = self.pacer.wait();
        if let Some(fps) = self.fps.frame(dt) {
            ctx.fps = fps;
            ctx.window.set_title(&fps_title(&self.config.title, fps));
        }

        self.time_since_tick += dt;
        if self.time_since_tick >= Duration::from_millis(ctx.tick_duration_millis) {
            self.graphics_flows
                .iter_mut()
                .for_each(|flow| flow.on_tick(ctx));
            self.time_since_tick = Duration::ZERO;
        }

        ctx.camera.update(&ctx.queue, dt);
        self.graphics_flows
            .iter_mut()
            .for_each(|flow| flow.on_update(ctx, dt));

        let focus = ctx.camera.camera.position;
        let shadows = ctx
            .shadow
            .update(&ctx.queue, ctx.lights.shadow_caster(), focus);

        match render(ctx, &self.graphics_flows, shadows) {
            Ok(()) => (),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = ctx.window.inner_size();
                ctx.resize(size.width, size.height);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow::anyhow!("GPU out of memory"));
            }
            Err(e) => log::warn!("frame skipped: {e}"),
        }
    }
}

fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("cursor could not be captured: {e}");
    }
    window.set_cursor_visible(false);
}

fn render(
    ctx: &Context,
    graphics_flows: &[Box<dyn GraphicsFlow>],
    shadows: bool,
) -> Result<(), wgpu::SurfaceError> {
    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let nodes: Vec<&dyn SceneNode> = graphics_flows
        .iter()
        .flat_map(|flow| flow.on_render().into_nodes())
        .collect();

    ctx.lights
        .pass_data_to_shader(&ctx.queue, &ctx.light_resources);
    nodes
        .iter()
        .for_each(|node| node.write_to_buffers(&ctx.queue));

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

    if shadows {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.shadow.map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });
        shadow_pass.set_pipeline(&ctx.pipelines.shadow);
        shadow_pass.set_bind_group(SHADOW_PASS_GROUP, &ctx.shadow.pass_bind_group, &[]);
        nodes
            .iter()
            .for_each(|node| node.draw_depth(&mut shadow_pass));
    }

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
            multiview_mask: None,
        });

        render_pass.set_pipeline(&ctx.pipelines.scene);
        render_pass.set_bind_group(CAMERA_GROUP, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(LIGHT_GROUP, &ctx.light_resources.bind_group, &[]);
        render_pass.set_bind_group(SHADOW_GROUP, &ctx.shadow.bind_group, &[]);
        nodes.iter().for_each(|node| node.draw(&mut render_pass));

        // last, so it only fills what the scene left at the far plane
        if let Some(skybox) = &ctx.skybox {
            render_pass.set_pipeline(&ctx.pipelines.skybox);
            render_pass.set_bind_group(CAMERA_GROUP, &ctx.camera.bind_group, &[]);
            skybox.draw(&mut render_pass);
        }
    }

    ctx.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e.context("viewer initialization failed"));
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(ctx) = &mut self.ctx else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            ctx.camera.controller.handle_mouse(dx, dy);
        }
        self.graphics_flows
            .iter_mut()
            .for_each(|flow| flow.on_device_events(ctx, &event));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(ctx) = &mut self.ctx else {
            return;
        };

        ctx.camera.controller.handle_window_events(&event);
        self.graphics_flows
            .iter_mut()
            .for_each(|flow| flow.on_window_events(ctx, &event));

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("exit requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                ctx.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }
}

/// Opens the window, constructs the flows and runs the frame loop until the
/// window is closed or Escape is pressed.
pub fn run(config: ViewerConfig, constructors: Vec<FlowConstructor>) -> anyhow::Result<()> {
    init_logging(&config.logging);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, constructors)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
