//! Demo entry point: opens a window and spins a textured cube through the
//! software rasterizer, presenting frames with softbuffer.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context as _};
use glam::Vec3;
use mimalloc::MiMalloc;
use winit::{
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use softraster::{Camera, Framebuffer, Material, Mesh, Model, Renderer, Texture, VertexArray};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const TITLE: &str = "softraster";
const ROTATION_SPEED: f32 = 30.0; // degrees per second

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)
            .context("failed to create window")?,
    );

    let context =
        softbuffer::Context::new(window.clone()).map_err(|e| anyhow!("softbuffer context: {e}"))?;
    let mut surface = softbuffer::Surface::new(&context, window.clone())
        .map_err(|e| anyhow!("softbuffer surface: {e}"))?;

    let size = window.inner_size();
    let (mut width, mut height) = (size.width.max(1) as usize, size.height.max(1) as usize);
    let mut framebuffer = Framebuffer::new(width, height)?;

    let mut camera = Camera::new(
        Vec3::new(0.0, 1.5, 3.0),
        Vec3::Y,
        -90.0,
        -20.0,
        90.0,
        width as f32 / height as f32,
        0.1,
        100.0,
    )?;

    let mut renderer = Renderer::new();
    let mut model = cube_model()?;

    println!("=== softraster demo ===");
    println!("  ESC - exit");

    // frame timing, same bookkeeping as the reference loop
    let mut last_frame = Instant::now();
    let mut last_fps_update = Instant::now();
    let mut frame_count = 0u32;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } => elwt.exit(),

                WindowEvent::Resized(new_size) => {
                    if new_size.width > 0 && new_size.height > 0 {
                        width = new_size.width as usize;
                        height = new_size.height as usize;
                        framebuffer = Framebuffer::new(width, height)
                            .expect("window dimensions are positive");
                        if let Err(err) = camera.set_projection_params(
                            width as f32 / height as f32,
                            0.1,
                            100.0,
                        ) {
                            log::warn!("ignoring resize: {err}");
                        }
                    }
                }

                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;

                    let mut rotation = model.rotation();
                    rotation.y += ROTATION_SPEED * dt;
                    model.set_rotation(rotation);

                    framebuffer.clear();
                    framebuffer.clear_depth();
                    renderer.render_model(&mut framebuffer, &camera, &model);

                    let (Some(buf_width), Some(buf_height)) = (
                        NonZeroU32::new(width as u32),
                        NonZeroU32::new(height as u32),
                    ) else {
                        return;
                    };
                    if surface.resize(buf_width, buf_height).is_err() {
                        return;
                    }
                    let Ok(mut buffer) = surface.buffer_mut() else {
                        return;
                    };

                    // present: interleaved RGB bytes to 0RGB u32 pixels
                    let color = framebuffer.color_buffer();
                    for (pixel, rgb) in buffer.iter_mut().zip(color.chunks_exact(3)) {
                        *pixel = ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32;
                    }
                    if let Err(err) = buffer.present() {
                        log::warn!("present failed: {err}");
                    }

                    frame_count += 1;
                    let elapsed = now.duration_since(last_fps_update).as_secs_f32();
                    if elapsed >= 1.0 {
                        let fps = frame_count as f32 / elapsed;
                        window.set_title(&format!(
                            "{TITLE} - FPS: {fps:.1} - Frame Time: {:.2} ms",
                            dt * 1000.0
                        ));
                        frame_count = 0;
                        last_fps_update = now;
                    }
                }

                _ => {}
            },

            Event::AboutToWait => {
                window.request_redraw();
            }

            _ => {}
        }
    })?;

    Ok(())
}

/// A unit cube with outward normals, per-face UVs and a checkerboard
/// diffuse texture.
fn cube_model() -> anyhow::Result<Model> {
    let mut material = Material::new();
    material.set_diffuse_texture(Arc::new(checkerboard_texture()))?;

    let mesh = Mesh::with_material(cube_vertex_array(), Arc::new(material))?;
    Ok(Model::new(vec![mesh])?)
}

fn cube_vertex_array() -> VertexArray {
    // each face: outward normal and four corners, counter-clockwise when
    // seen from outside
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0], [
            [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0],
        ]),
        ([0.0, 0.0, -1.0], [
            [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0],
        ]),
        ([1.0, 0.0, 0.0], [
            [1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
        ]),
        ([-1.0, 0.0, 0.0], [
            [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0],
        ]),
        ([0.0, 1.0, 0.0], [
            [-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0],
        ]),
        ([0.0, -1.0, 0.0], [
            [-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0],
        ]),
    ];

    // image V origin is top-left after the loader's flip, so corner 0
    // (lower-left of the face) maps to v = 1
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = VertexArray::with_capacity(36);
    for (normal, corners) in faces {
        for [a, b, c] in [[0usize, 1, 2], [0, 2, 3]] {
            vertices.push(corners[a], uvs[a], normal);
            vertices.push(corners[b], uvs[b], normal);
            vertices.push(corners[c], uvs[c], normal);
        }
    }
    vertices
}

fn checkerboard_texture() -> Texture {
    const SIZE: usize = 8;
    let mut data = Vec::with_capacity(SIZE * SIZE * 3);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let light = (x + y) % 2 == 0;
            if light {
                data.extend_from_slice(&[230, 90, 40]);
            } else {
                data.extend_from_slice(&[40, 40, 48]);
            }
        }
    }
    Texture::from_rgb_pixels(SIZE, SIZE, data).expect("checkerboard dimensions are consistent")
}
