mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::AppConfig;
use egui::Context as EguiContext;
use handgrid_render::{
    CubeMapGenerator, CubeMapImages, DebugTextRenderer, FrameStats, HandScene, RenderView,
    Renderer,
};
use handgrid_render_wgpu::{OrbitCamera, WgpuRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(
    name = "handgrid-desktop",
    about = "Animated procedural hand over a scrolling grid"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid scroll speed override, world units per second
    #[arg(long)]
    speed: Option<f32>,

    /// Per-joint curl delay override, milliseconds
    #[arg(long)]
    phase_step_ms: Option<f32>,

    /// Log a text dump of the initial scene
    #[arg(long)]
    dump_scene: bool,
}

impl Cli {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(speed) = self.speed {
            config.grid.speed = speed;
        }
        if let Some(ms) = self.phase_step_ms {
            config.curl.phase_step_ms = ms;
        }
        Ok(config)
    }
}

/// Application state.
struct AppState {
    scene: HandScene,
    camera: OrbitCamera,
    environment: CubeMapImages,
    show_hud: bool,
    dragging: bool,
    viewport_height: f32,
    last_frame: Instant,
    last_stats: Option<FrameStats>,
}

impl AppState {
    fn new(config: &AppConfig) -> Result<Self> {
        let scene = HandScene::new(config.scene_settings()).context("building scene")?;
        Ok(Self {
            scene,
            camera: config.camera.camera(),
            environment: CubeMapGenerator::default().generate(),
            show_hud: true,
            dragging: false,
            viewport_height: config.window.height as f32,
            last_frame: Instant::now(),
            last_stats: None,
        })
    }

    fn view(&self) -> RenderView {
        RenderView {
            eye: self.camera.position(),
            target: self.camera.target,
            fov_degrees: self.camera.fov.to_degrees(),
        }
    }

    /// Camera first, then the scene's animation, uniforms and idle rotation.
    fn update(&mut self, dt: f32) {
        self.camera.update();
        match self.scene.frame(dt) {
            Ok(stats) => self.last_stats = Some(stats),
            Err(e) => tracing::error!("frame skipped: {e}"),
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed && key == KeyCode::F1 {
            self.show_hud = !self.show_hud;
        }
    }

    fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if button == MouseButton::Left {
            self.dragging = pressed;
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        egui::Window::new("Hand Grid")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.label(format!("Time: {:.2}s", self.scene.clock.elapsed()));
                if let Some(stats) = self.last_stats {
                    ui.label(format!("Frame: {}", stats.frame));
                    ui.label(format!(
                        "Curl: {:.3} rad ({:.1}°)",
                        stats.curl_angle,
                        stats.curl_angle.to_degrees()
                    ));
                }
                ui.label(format!(
                    "Joints: {}  Instances: {}",
                    self.scene.hand.joint_count(),
                    self.scene.phalanxes.len()
                ));
                ui.separator();

                ui.add(
                    egui::Slider::new(&mut self.scene.uniforms.speed, 0.0..=5.0)
                        .text("grid speed"),
                );
                let mut phase_ms = self.scene.driver.phase_step() * 1000.0;
                if ui
                    .add(egui::Slider::new(&mut phase_ms, 0.0..=500.0).text("phase step ms"))
                    .changed()
                {
                    self.scene.driver.set_phase_step(phase_ms / 1000.0);
                }
                ui.separator();
                ui.small("Left drag: orbit   F1: toggle panel");
            });
    }
}

struct GpuApp {
    state: AppState,
    title: String,
    initial_size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState, config: &AppConfig) -> Self {
        Self {
            state,
            title: config.window.title.clone(),
            initial_size: PhysicalSize::new(config.window.width, config.window.height),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("handgrid_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.camera.set_aspect(config.width, config.height);
        self.state.viewport_height = config.height as f32;

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            &self.state.scene,
            &self.state.environment,
        )
        .context("create renderer")?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(renderer),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
            &mut self.renderer,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        renderer.render(device, queue, &view, &self.state.camera, &self.state.scene);

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("failed to initialize GPU: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // A release over the HUD still ends an orbit drag.
        if let WindowEvent::MouseInput {
            button,
            state: ElementState::Released,
            ..
        } = &event
        {
            self.state.handle_mouse_button(*button, false);
        }

        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.camera.set_aspect(config.width, config.height);
                    self.state.viewport_height = config.height as f32;
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button,
                state: btn_state,
                ..
            } => {
                self.state
                    .handle_mouse_button(button, btn_state == ElementState::Pressed);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                self.state.camera.zoom(steps);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.dragging {
                let height = self.state.viewport_height;
                self.state
                    .camera
                    .rotate(delta.0 as f32, delta.1 as f32, height);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    tracing::info!("handgrid-desktop starting");

    let config = cli.load_config()?;
    let state = AppState::new(&config)?;
    if cli.dump_scene {
        let dump = DebugTextRenderer::new().render(&state.scene, &state.view());
        tracing::info!("initial scene:\n{dump}");
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state, &config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from(["handgrid-desktop", "--speed", "3", "--phase-step-ms", "20"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.grid.speed, 3.0);
        assert_eq!(config.curl.phase_step_ms, 20.0);
    }

    #[test]
    fn app_state_starts_with_hud_and_nine_joints() {
        let state = AppState::new(&AppConfig::default()).unwrap();
        assert!(state.show_hud);
        assert_eq!(state.scene.phalanxes.len(), 9);
        assert_eq!(state.environment.faces.len(), 6);
    }

    #[test]
    fn update_advances_scene_and_f1_toggles_hud() {
        let mut state = AppState::new(&AppConfig::default()).unwrap();
        state.update(0.5);
        let stats = state.last_stats.unwrap();
        assert_eq!(stats.frame, 1);
        assert!((state.scene.uniforms.time - 0.5).abs() < 1e-6);

        state.handle_key(KeyCode::F1, true);
        assert!(!state.show_hud);
        state.handle_key(KeyCode::F1, false);
        assert!(!state.show_hud);
    }

    #[test]
    fn left_release_ends_drag() {
        let mut state = AppState::new(&AppConfig::default()).unwrap();
        state.handle_mouse_button(MouseButton::Left, true);
        assert!(state.dragging);
        state.handle_mouse_button(MouseButton::Right, false);
        assert!(state.dragging);
        state.handle_mouse_button(MouseButton::Left, false);
        assert!(!state.dragging);
    }

    #[test]
    fn view_follows_camera() {
        let state = AppState::new(&AppConfig::default()).unwrap();
        let view = state.view();
        assert!((view.fov_degrees - 60.0).abs() < 1e-3);
        assert!((view.eye - glam::Vec3::new(-5.0, 10.0, 20.0)).length() < 1e-3);
    }
}
