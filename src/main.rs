use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

mod camera;
mod demo;
mod loader;

use crate::camera::{Camera, CameraController};
use trisplat_core::{analyzer, SplatGeometry, TriangleScene};
use trisplat_render::{FrameInput, SplatRenderer};

#[derive(Parser)]
#[command(name = "trisplat")]
#[command(about = "Real-time triangle splat viewer")]
struct Args {
    /// Scene base path; expects <base>.json and <base>.bin.
    scene: Option<PathBuf>,

    /// Splat count for the procedural demo scene (used without a scene path).
    #[arg(long, default_value_t = 50_000)]
    demo: usize,

    /// Spherical-harmonic degree for the demo scene.
    #[arg(long)]
    sh_degree: Option<u8>,

    /// Edge softness exponent override.
    #[arg(long)]
    sigma: Option<f32>,

    /// Log a CPU culling report for the initial camera pose.
    #[arg(long)]
    stats: bool,

    /// Render barycentric debug colors.
    #[arg(long)]
    debug: bool,
}

struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    renderer: SplatRenderer,
    camera: Camera,
    controller: CameraController,
}

impl State {
    async fn new(window: Arc<Window>, scene: &TriangleScene, args: &Args) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapters found")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Trisplat Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let geometry = SplatGeometry::build(scene).context("scene rejected")?;

        let camera = Camera {
            eye: glam::Vec3::new(0.0, 0.0, 5.0),
            target: glam::Vec3::ZERO,
            up: glam::Vec3::Y,
            aspect: config.width as f32 / config.height as f32,
            fovy: 45.0_f32.to_radians(),
            znear: 0.01,
            zfar: 1000.0,
        };

        if args.stats {
            let params = analyzer::frame_params(
                camera.view_matrix(),
                camera.projection_matrix(),
                (config.width, config.height),
                geometry.sigma,
            );
            let report = analyzer::analyze(&geometry, &params, 1);
            tracing::info!(
                sampled = report.sampled,
                drawn = report.drawn,
                min_weight = report.min_weight_filtered,
                edge_on = report.edge_on_filtered,
                behind = report.behind_camera_filtered,
                perimeter = report.perimeter_filtered,
                size = report.size_filtered,
                alpha = report.alpha_filtered,
                filtered_pct = report.filter_percentage(),
                radius_buckets = ?report.radius_buckets,
                "culling report"
            );
        }

        let mut renderer = SplatRenderer::new(&device, &queue, surface_format, &geometry)?;
        if let Some(sigma) = args.sigma {
            renderer.set_sigma(sigma);
        }
        renderer.set_debug(args.debug);

        let mut controller = CameraController::new(2.0, 0.003);
        controller.look_at(camera.eye, camera.target);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
            camera,
            controller,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.camera.aspect = new_size.width as f32 / new_size.height as f32;
    }

    fn update(&mut self, dt: f32) {
        self.controller.update_camera(&mut self.camera, dt);

        let frame = FrameInput {
            camera_pos: self.camera.eye,
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(),
            resolution: [self.config.width, self.config.height],
        };
        self.renderer.prepare(&self.queue, &frame);
    }

    fn render(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(f) => f,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("Surface out of memory");
            }
            Err(e) => {
                return Err(anyhow::anyhow!(e));
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Splat Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer.draw(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}

struct App {
    args: Args,
    scene: Option<TriangleScene>,
    window: Option<Arc<Window>>,
    state: Option<State>,
    mouse_captured: bool,
    last_frame: Instant,
}

impl App {
    fn new(args: Args, scene: TriangleScene) -> Self {
        Self {
            args,
            scene: Some(scene),
            window: None,
            state: None,
            mouse_captured: false,
            last_frame: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attrs = Window::default_attributes()
            .with_title("Trisplat")
            .with_inner_size(PhysicalSize::new(1280, 720));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );

        let scene = self.scene.take().expect("scene consumed twice");
        let state = pollster::block_on(State::new(Arc::clone(&window), &scene, &self.args))
            .expect("Failed to initialize renderer");

        self.window = Some(window);
        self.state = Some(state);
        self.last_frame = Instant::now();

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            state.controller.process_events(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    if self.mouse_captured {
                        self.mouse_captured = false;
                        if let Some(window) = &self.window {
                            let _ = window.set_cursor_grab(CursorGrabMode::None);
                            window.set_cursor_visible(true);
                        }
                    } else {
                        event_loop.exit();
                    }
                }
            }

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if !self.mouse_captured {
                    self.mouse_captured = true;
                    if let Some(window) = &self.window {
                        let _ = window
                            .set_cursor_grab(CursorGrabMode::Locked)
                            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                        window.set_cursor_visible(false);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f32();
                self.last_frame = now;

                if let Some(state) = &mut self.state {
                    state.update(dt);
                    if let Err(error) = state.render() {
                        tracing::error!(%error, "frame failed");
                        event_loop.exit();
                    }
                }

                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _: &ActiveEventLoop,
        _: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.mouse_captured {
                if let Some(state) = &mut self.state {
                    state.controller.process_mouse(dx, dy);
                }
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut scene = match &args.scene {
        Some(base) => loader::load_scene(base)?,
        None => {
            tracing::info!(splats = args.demo, "generating demo scene");
            demo::generate(args.demo, args.sh_degree, args.sigma.unwrap_or(1.0))
        }
    };
    if let Some(sigma) = args.sigma {
        scene.sigma = sigma;
    }
    tracing::info!(
        vertices = scene.num_vertices(),
        triangles = scene.num_triangles(),
        sh = scene.sh.is_some(),
        "scene ready"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args, scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
