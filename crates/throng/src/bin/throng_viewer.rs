//! # THRONG Viewer
//!
//! Draws one mesh N times with GPU frustum culling.
//!
//! ```bash
//! throng_viewer assets/cube.obj 100000 scatter
//! ```
//!
//! Controls: `C` toggles culling, `Space` pauses the orbit, `Escape` exits.
//! Exits with code 1 if the mesh cannot be loaded.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::WindowBuilder,
};

use throng::camera::scene_radius;
use throng::{
    load_mesh, parse_args, AppError, AppResult, CliArgs, InputAction, OrbitCamera, ViewerConfig,
    ViewerInput,
};
use throng_rendering::{CullingPipeline, Drawable, FrameMode, GpuContext, InstancedMesh};
use throng_shared::placement::generate;

// ============================================================================
// CONSTANTS
// ============================================================================
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const STATUS_INTERVAL_SECS: u64 = 2;
const CLEAR_COLOR: wgpu::Color = wgpu::Color { r: 0.05, g: 0.06, b: 0.09, a: 1.0 };

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// MAIN
// ============================================================================
fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&args) {
        eprintln!("[FATAL] {err}");
        std::process::exit(1);
    }
}

fn print_banner(args: &CliArgs, vertices: usize, triangles: usize) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           THRONG VIEWER - GPU FRUSTUM CULLING                    ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  Mesh:       {}", args.mesh_path.display());
    println!("║  Geometry:   {vertices} vertices, {triangles} triangles");
    println!("║  Instances:  {}", args.instance_count);
    println!("║  Layout:     {}", args.layout);
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  C       toggle culling                                          ║");
    println!("║  Space   pause orbit                                             ║");
    println!("║  Escape  exit                                                    ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
}

#[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
fn run(args: &CliArgs) -> AppResult<()> {
    let config = ViewerConfig::load_or_default();

    let mesh_data = load_mesh(&args.mesh_path)?;
    print_banner(args, mesh_data.vertices.len(), mesh_data.indices.len() / 3);

    let transforms = generate(&config.placement.params(args.instance_count, args.layout));

    // Create window
    let event_loop = EventLoop::new().map_err(|e| AppError::Window(e.to_string()))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(PhysicalSize::new(config.window.width, config.window.height))
            .build(&event_loop)
            .map_err(|e| AppError::Window(e.to_string()))?,
    );

    // Initialize wgpu
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let surface = instance
        .create_surface(window.clone())
        .map_err(|e| AppError::Window(e.to_string()))?;
    let ctx = pollster::block_on(GpuContext::request(&instance, Some(&surface)))?;
    println!("[GPU] Using: {}", ctx.adapter.get_info().name);

    let caps = surface.get_capabilities(&ctx.adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| AppError::Window("surface reports no formats".to_owned()))?;

    let size = window.inner_size();
    let mut surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: if config.window.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        },
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&ctx.device, &surface_config);
    let mut depth_view = create_depth_texture(&ctx.device, surface_config.width, surface_config.height);

    // Mesh, instances and the culling stage
    let mut mesh = InstancedMesh::new(&ctx.device, &mesh_data, format, Some(DEPTH_FORMAT));
    mesh.set_instance_transforms(&transforms)?;
    let mut pipeline = CullingPipeline::new(&ctx.device, &mesh, config.culling.culling_config());
    if let Some(reason) = pipeline.kernel_error() {
        println!("[CULLING] Kernel unavailable, drawing all instances: {reason}");
    }

    let mut camera = OrbitCamera::new(
        &config.camera,
        scene_radius(&transforms, &mesh_data.bounds),
        surface_config.width as f32 / surface_config.height as f32,
    );
    let mut input = ViewerInput::new(pipeline.culling_enabled());

    let total = transforms.len();
    let diagnostic_secs = config.culling.diagnostic_seconds;
    let readback_interval = u64::from(config.culling.readback_interval.max(1));
    let start_time = Instant::now();
    let mut last_frame = Instant::now();
    let mut last_status = Instant::now();
    let mut frame_count: u64 = 0;

    let GpuContext { device, queue, .. } = ctx;

    // Run
    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, window_id } if window_id == window.id() => match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::KeyboardInput {
                        event: KeyEvent { physical_key: PhysicalKey::Code(key), state, .. },
                        ..
                    } => match input.handle_key(key, state == ElementState::Pressed) {
                        Some(InputAction::SetCulling(on)) => {
                            pipeline.set_culling_enabled(on);
                            println!("[CULLING] {}", if on { "ON" } else { "OFF" });
                        }
                        Some(InputAction::SetPaused(paused)) => camera.set_paused(paused),
                        Some(InputAction::Exit) => elwt.exit(),
                        None => {}
                    },
                    WindowEvent::Resized(new_size) => {
                        if new_size.width > 0 && new_size.height > 0 {
                            surface_config.width = new_size.width;
                            surface_config.height = new_size.height;
                            surface.configure(&device, &surface_config);
                            depth_view = create_depth_texture(&device, new_size.width, new_size.height);
                            camera.set_viewport(new_size.width, new_size.height);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let dt = (now - last_frame).as_secs_f32().min(0.1);
                        last_frame = now;
                        frame_count += 1;

                        camera.update(dt);
                        mesh.bind_camera(&queue, &camera.uniform());

                        let output = match surface.get_current_texture() {
                            Ok(t) => t,
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                surface.configure(&device, &surface_config);
                                return;
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                eprintln!("[FATAL] Out of GPU memory!");
                                elwt.exit();
                                return;
                            }
                            Err(wgpu::SurfaceError::Timeout) => return,
                        };

                        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
                        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Frame Encoder"),
                        });

                        let outcome = pipeline.encode_frame(
                            &device,
                            &queue,
                            &mut encoder,
                            &mut mesh,
                            &camera.view_projection(),
                        );

                        {
                            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("Main Pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                    view: &view,
                                    resolve_target: None,
                                    ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                                        store: wgpu::StoreOp::Store,
                                    },
                                })],
                                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                                    view: &depth_view,
                                    depth_ops: Some(wgpu::Operations {
                                        load: wgpu::LoadOp::Clear(1.0),
                                        store: wgpu::StoreOp::Store,
                                    }),
                                    stencil_ops: None,
                                }),
                                timestamp_writes: None,
                                occlusion_query_set: None,
                            });
                            pipeline.render(&mut pass, &mesh, &outcome);
                        }

                        queue.submit(std::iter::once(encoder.finish()));
                        output.present();

                        let visible = pipeline.after_submit(&device);
                        let diagnosing = start_time.elapsed().as_secs_f32() < diagnostic_secs;
                        if diagnosing || outcome.frame % readback_interval == 0 {
                            let shown = pipeline
                                .stats()
                                .last_visible
                                .map_or_else(|| "?".to_owned(), |v| v.to_string());
                            log::debug!(
                                "frame {}: {} | visible {}/{} | work-groups {}",
                                outcome.frame,
                                outcome.plan.mode.label(),
                                shown,
                                total,
                                outcome.workgroups_dispatched
                            );
                        }
                        if let Some(count) = visible {
                            log::trace!("read back visible count {}", count);
                        }

                        if last_status.elapsed().as_secs() >= STATUS_INTERVAL_SECS {
                            let fps = frame_count as f64 / start_time.elapsed().as_secs_f64();
                            let mode = match outcome.plan.mode {
                                FrameMode::Culled => "CULLED".to_owned(),
                                FrameMode::Unculled(reason) => format!("ALL ({reason})"),
                                FrameMode::Skipped(_) => "SKIPPED".to_owned(),
                            };
                            let stats = pipeline.stats();
                            println!(
                                "[STATUS] FPS: {:.0} | {} | Visible: {} / {} | Fallback frames: {}",
                                fps,
                                mode,
                                stats.last_visible.map_or_else(|| "-".to_owned(), |v| v.to_string()),
                                total,
                                stats.user_disabled_frames + stats.kernel_unavailable_frames,
                            );
                            last_status = Instant::now();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => window.request_redraw(),
                _ => {}
            }
        })
        .map_err(|e| AppError::Window(e.to_string()))
}
