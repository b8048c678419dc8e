//! Flow control and application event loop.
//!
//! The viewer is driven by an explicit set of lifecycle hooks instead of global
//! callbacks. [`run`] opens the window, builds the GPU [`Context`] and then calls
//! the hooks in a fixed order:
//!
//! 1. `on_load` once, after the context exists
//! 2. every frame: `on_update` with the elapsed time and the collected input,
//!    then `on_render` inside a render pass that already cleared colour and depth
//! 3. `on_resize` after the surface and depth texture were reconfigured
//! 4. `on_unload` once, before the event loop exits
//!
//! A failing `on_load` stops the loop and the error is returned from [`run`].

use std::{fmt::Debug, iter, sync::Arc};

use anyhow::Context as _;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{context::Context, input::InputState};

/// Returned by `on_update` to keep the loop running or to leave it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Control {
    #[default]
    Continue,
    Exit,
}

pub type LoadHook<S> = Box<dyn FnMut(&mut Context, &mut S) -> anyhow::Result<()>>;
pub type UpdateHook<S> = Box<dyn FnMut(&mut Context, &mut S, Duration, &InputState) -> Control>;
pub type RenderHook<S> = Box<dyn FnMut(&Context, &mut S, &mut wgpu::RenderPass<'_>)>;
pub type ResizeHook<S> = Box<dyn FnMut(&mut Context, &mut S, u32, u32)>;
pub type UnloadHook<S> = Box<dyn FnMut(&mut Context, &mut S)>;

/// The lifecycle hooks of an application. Unset hooks default to no-ops.
pub struct Hooks<S> {
    pub on_load: LoadHook<S>,
    pub on_update: UpdateHook<S>,
    pub on_render: RenderHook<S>,
    pub on_resize: ResizeHook<S>,
    pub on_unload: UnloadHook<S>,
}

impl<S: 'static> Default for Hooks<S> {
    fn default() -> Self {
        Self {
            on_load: Box::new(|_: &mut Context, _: &mut S| Ok(())),
            on_update: Box::new(|_: &mut Context, _: &mut S, _: Duration, _: &InputState| {
                Control::Continue
            }),
            on_render: Box::new(|_: &Context, _: &mut S, _: &mut wgpu::RenderPass<'_>| {}),
            on_resize: Box::new(|_: &mut Context, _: &mut S, _: u32, _: u32| {}),
            on_unload: Box::new(|_: &mut Context, _: &mut S| {}),
        }
    }
}

impl<S> Debug for Hooks<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Hooks { .. }")
    }
}

/// Window creation parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_colour: wgpu::Color,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "glb-viewer".to_string(),
            width: 1000,
            height: 800,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

pub struct App<State: 'static> {
    async_runtime: tokio::runtime::Runtime,
    settings: WindowSettings,
    hooks: Hooks<State>,
    state: State,
    ctx: Option<Context>,
    input: InputState,
    is_surface_configured: bool,
    last_time: Instant,
    // Set when startup fails; handed back to the caller of `run`.
    error: Option<anyhow::Error>,
}

impl<State: 'static> App<State> {
    fn new(settings: WindowSettings, hooks: Hooks<State>, state: State) -> anyhow::Result<Self> {
        let async_runtime =
            tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
        Ok(Self {
            async_runtime,
            settings,
            hooks,
            state,
            ctx: None,
            input: InputState::new(),
            is_surface_configured: false,
            last_time: Instant::now(),
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.width, self.settings.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Cannot create the window")?,
        );

        let mut ctx = self
            .async_runtime
            .block_on(Context::new(window))
            .context("App initialization failed. Cannot create the main context")?;
        ctx.clear_colour = self.settings.clear_colour;

        let size = ctx.window.inner_size();
        self.is_surface_configured = ctx.resize(size.width, size.height);

        (self.hooks.on_load)(&mut ctx, &mut self.state)?;
        ctx.window.request_redraw();
        self.ctx = Some(ctx);
        self.last_time = Instant::now();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        if ctx.resize(width, height) {
            self.is_surface_configured = true;
            (self.hooks.on_resize)(ctx, &mut self.state, width, height);
        }
    }

    /// Run `on_unload` once and leave the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut ctx) = self.ctx.take() {
            (self.hooks.on_unload)(&mut ctx, &mut self.state);
        }
        event_loop.exit();
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let control = (self.hooks.on_update)(ctx, &mut self.state, dt, &self.input);
        self.input.end_frame();
        if control == Control::Exit {
            log::info!("Exit requested");
            self.shutdown(event_loop);
            return;
        }

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            ctx.window.request_redraw();
            return;
        }

        // Reconfigure the surface if it's lost, outdated or suboptimal
        if render(ctx, &mut self.hooks.on_render, &mut self.state) == Frame::Reconfigure {
            let size = ctx.window.inner_size();
            self.resize(size.width, size.height);
        }
        if let Some(ctx) = &self.ctx {
            ctx.window.request_redraw();
        }
    }
}

/// Outcome of one attempt to draw into the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Presented,
    Skipped,
    Reconfigure,
}

fn render<State>(ctx: &Context, on_render: &mut RenderHook<State>, state: &mut State) -> Frame {
    let (output, suboptimal) = match ctx.surface.get_current_texture() {
        wgpu::CurrentSurfaceTexture::Success(output) => (output, false),
        wgpu::CurrentSurfaceTexture::Suboptimal(output) => (output, true),
        wgpu::CurrentSurfaceTexture::Timeout | wgpu::CurrentSurfaceTexture::Occluded => {
            return Frame::Skipped;
        }
        wgpu::CurrentSurfaceTexture::Outdated | wgpu::CurrentSurfaceTexture::Lost => {
            return Frame::Reconfigure;
        }
        wgpu::CurrentSurfaceTexture::Validation => {
            log::error!("Unable to acquire the next surface texture");
            return Frame::Skipped;
        }
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
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

        on_render(ctx, state, &mut render_pass);
    }

    ctx.queue.submit(iter::once(encoder.finish()));
    ctx.window.pre_present_notify();
    output.present();
    if suboptimal {
        Frame::Reconfigure
    } else {
        Frame::Presented
    }
}

impl<State: 'static> ApplicationHandler for App<State> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() || self.error.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if self.ctx.is_some() {
            self.input.process_device_event(&event);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.ctx.is_none() {
            return;
        }
        self.input.process_window_event(&event);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }
}

/// Open a window and drive `hooks` against `state` until the window closes.
pub fn run<State: 'static>(
    settings: WindowSettings,
    hooks: Hooks<State>,
    state: State,
) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, hooks, state)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
