//! End-to-end pipeline tests: build a scene, render it, inspect the
//! framebuffer. Covers the culling rules, depth testing, shading paths and
//! the determinism guarantees of the parallel tile phase.

use std::sync::Arc;

use glam::{Vec3, Vec4};
use softraster::{Camera, Framebuffer, Material, Mesh, Model, Renderer, Texture, VertexArray};

/// Camera at `position` looking straight down -Z.
fn camera_looking_neg_z(position: Vec3, fov: f32, aspect: f32) -> Camera {
    Camera::new(position, Vec3::Y, -90.0, 0.0, fov, aspect, 0.1, 100.0).unwrap()
}

fn triangle_vertices(
    positions: [[f32; 3]; 3],
    uvs: [[f32; 2]; 3],
    normal: [f32; 3],
) -> VertexArray {
    let mut vertices = VertexArray::new();
    for i in 0..3 {
        vertices.push(positions[i], uvs[i], normal);
    }
    vertices
}

/// A big CCW (front-facing) triangle in the z = `z` plane.
fn front_triangle(z: f32, normal: [f32; 3]) -> VertexArray {
    triangle_vertices(
        [[0.0, 1.0, z], [-1.0, -1.0, z], [1.0, -1.0, z]],
        [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        normal,
    )
}

fn solid_texture(r: u8, g: u8, b: u8) -> Arc<Texture> {
    Arc::new(Texture::from_rgb_pixels(1, 1, vec![r, g, b]).unwrap())
}

fn material_with(texture: Arc<Texture>) -> Arc<Material> {
    let mut material = Material::new();
    material.set_diffuse_texture(texture).unwrap();
    Arc::new(material)
}

/// Pixel indices whose depth was written.
fn written_pixels(fb: &Framebuffer) -> Vec<usize> {
    fb.depth_buffer()
        .iter()
        .enumerate()
        .filter(|(_, &d)| d < 1.0)
        .map(|(i, _)| i)
        .collect()
}

fn assert_untouched(fb: &Framebuffer) {
    assert!(fb.color_buffer().iter().all(|&b| b == 0), "color written");
    assert!(fb.depth_buffer().iter().all(|&d| d == 1.0), "depth written");
}

// S1: a thin framebuffer still receives the sentinel surface of a
// material-less mesh, including a pixel that sits exactly on two edges.
#[test]
fn sentinel_triangle_lands_in_single_row_framebuffer() {
    let mut fb = Framebuffer::new(4, 1).unwrap();
    // narrow fov pushes the base vertices below the one-pixel-high screen
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 30.0, 4.0);
    let model = Model::new(vec![Mesh::new(front_triangle(0.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();

    let mut renderer = Renderer::new();
    renderer.render_model(&mut fb, &camera, &model);

    // pixel (2, 0) is the apex; its edge values are 0 and 0 is inside
    assert_eq!(&fb.color_buffer()[6..9], &[0xFF, 0xFF, 0x00]);
    assert!(fb.depth_buffer()[2] < 1.0);
}

// S2: clockwise-in-NDC triangles are back-facing and rejected.
#[test]
fn backfacing_triangle_writes_nothing() {
    let mut fb = Framebuffer::new(16, 16).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);

    let vertices = triangle_vertices(
        [[0.0, 1.0, 0.0], [1.0, -1.0, 0.0], [-1.0, -1.0, 0.0]],
        [[0.0, 0.0]; 3],
        [0.0, 0.0, 1.0],
    );
    let model = Model::new(vec![Mesh::new(vertices).unwrap()]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);
    assert_untouched(&fb);
}

// S3: any vertex with clip w <= 0 rejects the whole triangle.
#[test]
fn triangle_behind_camera_writes_nothing() {
    let mut fb = Framebuffer::new(16, 16).unwrap();
    let camera = camera_looking_neg_z(Vec3::ZERO, 90.0, 1.0);
    let model = Model::new(vec![Mesh::new(front_triangle(10.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);
    assert_untouched(&fb);
}

// S4: with two coincident triangles the nearer one wins every covered
// pixel, and the stored depth is its interpolated z.
#[test]
fn depth_test_keeps_the_nearer_triangle() {
    let size = 32;
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);

    // camera sits at +3 looking down -Z, so z = 0.5 is the nearer plane
    let near = Mesh::with_material(
        front_triangle(0.5, [0.0, 0.0, 1.0]),
        material_with(solid_texture(255, 0, 0)),
    )
    .unwrap();
    let far = Mesh::with_material(
        front_triangle(0.0, [0.0, 0.0, 1.0]),
        material_with(solid_texture(0, 0, 255)),
    )
    .unwrap();

    let far_then_near = Model::new(vec![far.clone(), near.clone()]).unwrap();
    let near_then_far = Model::new(vec![near, far]).unwrap();

    let mut fb_a = Framebuffer::new(size, size).unwrap();
    let mut fb_b = Framebuffer::new(size, size).unwrap();
    let mut renderer = Renderer::new();
    renderer.render_model(&mut fb_a, &camera, &far_then_near);
    renderer.render_model(&mut fb_b, &camera, &near_then_far);

    // draw order does not matter under the depth test
    assert_eq!(fb_a.color_buffer(), fb_b.color_buffer());
    assert_eq!(fb_a.depth_buffer(), fb_b.depth_buffer());

    let written = written_pixels(&fb_a);
    assert!(!written.is_empty());

    // expected depth of the nearer plane: project any of its vertices
    let clip = *camera.view_projection_matrix() * Vec4::new(0.0, 1.0, 0.5, 1.0);
    let expected_depth = clip.z / clip.w;

    for &i in &written {
        let rgb = &fb_a.color_buffer()[i * 3..i * 3 + 3];
        assert!(rgb[0] > 100, "near triangle is red, got {rgb:?}");
        assert_eq!(rgb[1], 0);
        assert_eq!(rgb[2], 0);
        assert!((fb_a.depth_buffer()[i] - expected_depth).abs() < 1e-3);
    }
}

// S5: white texture, normal aligned with the light: lighting saturates and
// every covered pixel is pure white.
#[test]
fn saturated_lighting_yields_white_pixels() {
    let mut fb = Framebuffer::new(64, 64).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);

    let mesh = Mesh::with_material(
        front_triangle(0.0, [0.5, 0.5, 0.5]),
        material_with(solid_texture(255, 255, 255)),
    )
    .unwrap();
    let model = Model::new(vec![mesh]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);

    let written = written_pixels(&fb);
    assert!(written.len() > 100, "triangle should cover many pixels");
    for &i in &written {
        assert_eq!(&fb.color_buffer()[i * 3..i * 3 + 3], &[255, 255, 255]);
    }
}

// S6: like S5 but without any material: unshaded sentinel everywhere.
#[test]
fn missing_material_yields_sentinel_pixels() {
    let mut fb = Framebuffer::new(64, 64).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);
    let model = Model::new(vec![Mesh::new(front_triangle(0.0, [0.5, 0.5, 0.5])).unwrap()]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);

    let written = written_pixels(&fb);
    assert!(written.len() > 100);
    for &i in &written {
        assert_eq!(&fb.color_buffer()[i * 3..i * 3 + 3], &[0xFF, 0xFF, 0x00]);
    }
}

// material present but its texture never loaded: white fallback, shaded
#[test]
fn material_without_texture_shades_white_fallback() {
    let mut fb = Framebuffer::new(64, 64).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);

    let mesh = Mesh::with_material(
        front_triangle(0.0, [0.5, 0.5, 0.5]),
        Arc::new(Material::new()),
    )
    .unwrap();
    let model = Model::new(vec![mesh]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);

    let written = written_pixels(&fb);
    assert!(written.len() > 100);
    // normal parallel to the light saturates the shade to full white
    for &i in &written {
        assert_eq!(&fb.color_buffer()[i * 3..i * 3 + 3], &[255, 255, 255]);
    }
}

#[test]
fn rendering_twice_is_deterministic() {
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);
    let mesh = Mesh::with_material(
        front_triangle(0.0, [0.0, 0.0, 1.0]),
        material_with(solid_texture(200, 120, 40)),
    )
    .unwrap();
    let model = Model::new(vec![mesh]).unwrap();

    let mut renderer = Renderer::new();
    let mut fb_a = Framebuffer::new(120, 90).unwrap();
    let mut fb_b = Framebuffer::new(120, 90).unwrap();

    renderer.render_model(&mut fb_a, &camera, &model);
    renderer.render_model(&mut fb_b, &camera, &model);

    assert_eq!(fb_a.color_buffer(), fb_b.color_buffer());
    assert_eq!(fb_a.depth_buffer(), fb_b.depth_buffer());

    // clearing and re-rendering reproduces the frame too
    fb_a.clear();
    fb_a.clear_depth();
    renderer.render_model(&mut fb_a, &camera, &model);
    assert_eq!(fb_a.color_buffer(), fb_b.color_buffer());
    assert_eq!(fb_a.depth_buffer(), fb_b.depth_buffer());
}

#[test]
fn full_turn_rotation_matches_unrotated_render() {
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);

    let build_model = || {
        let mesh = Mesh::with_material(
            front_triangle(0.0, [0.5, 0.5, 0.5]),
            material_with(solid_texture(255, 255, 255)),
        )
        .unwrap();
        Model::new(vec![mesh]).unwrap()
    };

    let mut renderer = Renderer::new();

    let reference = build_model();
    let mut fb_ref = Framebuffer::new(64, 64).unwrap();
    renderer.render_model(&mut fb_ref, &camera, &reference);

    let mut turned = build_model();
    turned.set_rotation(Vec3::new(0.0, 360.0, 0.0));
    let mut fb_turned = Framebuffer::new(64, 64).unwrap();
    renderer.render_model(&mut fb_turned, &camera, &turned);

    assert_eq!(fb_ref.color_buffer(), fb_turned.color_buffer());
    for (a, b) in fb_ref.depth_buffer().iter().zip(fb_turned.depth_buffer()) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn fully_offscreen_model_writes_nothing() {
    let mut fb = Framebuffer::new(64, 64).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);

    let mut model =
        Model::new(vec![Mesh::new(front_triangle(0.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();
    model.set_position(Vec3::new(100.0, 0.0, 0.0));

    Renderer::new().render_model(&mut fb, &camera, &model);
    assert_untouched(&fb);
}

#[test]
fn one_by_one_framebuffer_renders_without_panic() {
    let mut fb = Framebuffer::new(1, 1).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);
    let model = Model::new(vec![Mesh::new(front_triangle(0.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);
}

// invariant 3: a triangle overlapping the framebuffer border only writes
// in-bounds pixels (debug asserts in the write path would catch the rest)
#[test]
fn partially_offscreen_triangle_clamps_to_framebuffer() {
    let mut fb = Framebuffer::new(48, 48).unwrap();
    // close enough that the triangle spills past every screen edge
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 0.8), 90.0, 1.0);

    let model = Model::new(vec![Mesh::new(front_triangle(0.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();
    Renderer::new().render_model(&mut fb, &camera, &model);

    assert!(!written_pixels(&fb).is_empty());
}

// scratch buffers are reused across draws; a second, smaller draw must not
// leak triangles from the first
#[test]
fn renderer_scratch_resets_between_draws() {
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 3.0), 90.0, 1.0);
    let mut renderer = Renderer::new();

    let big = Model::new(vec![Mesh::new(front_triangle(0.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();
    let mut fb = Framebuffer::new(64, 64).unwrap();
    renderer.render_model(&mut fb, &camera, &big);

    // an offscreen follow-up draw leaves the framebuffer untouched
    let mut offscreen =
        Model::new(vec![Mesh::new(front_triangle(0.0, [0.0, 0.0, 1.0])).unwrap()]).unwrap();
    offscreen.set_position(Vec3::new(100.0, 0.0, 0.0));

    let mut fb2 = Framebuffer::new(64, 64).unwrap();
    renderer.render_model(&mut fb2, &camera, &offscreen);
    assert_untouched(&fb2);
}

// a textured quad spanning many tiles exercises binning and the parallel
// phase with more than one quad per scanline
#[test]
fn textured_quad_renders_across_tiles() {
    let mut fb = Framebuffer::new(200, 150).unwrap();
    let camera = camera_looking_neg_z(Vec3::new(0.0, 0.0, 2.0), 90.0, 200.0 / 150.0);

    let mut vertices = VertexArray::new();
    let corners = [
        ([-1.0, -1.0, 0.0], [0.0, 1.0]),
        ([1.0, -1.0, 0.0], [1.0, 1.0]),
        ([1.0, 1.0, 0.0], [1.0, 0.0]),
        ([-1.0, 1.0, 0.0], [0.0, 0.0]),
    ];
    for [a, b, c] in [[0usize, 1, 2], [0, 2, 3]] {
        for &i in &[a, b, c] {
            let (pos, uv) = corners[i];
            vertices.push(pos, uv, [0.0, 0.0, 1.0]);
        }
    }

    let texture = {
        let mut data = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                let v = if (x + y) % 2 == 0 { 220u8 } else { 30u8 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Arc::new(Texture::from_rgb_pixels(4, 4, data).unwrap())
    };

    let mesh = Mesh::with_material(vertices, material_with(texture)).unwrap();
    let model = Model::new(vec![mesh]).unwrap();

    Renderer::new().render_model(&mut fb, &camera, &model);

    let written = written_pixels(&fb);
    // the quad covers a large part of the screen
    assert!(written.len() > 5000, "only {} pixels written", written.len());

    // both checker tones survived sampling and shading
    let mut bright = 0usize;
    let mut dark = 0usize;
    for &i in &written {
        let r = fb.color_buffer()[i * 3];
        if r > 100 {
            bright += 1;
        } else if r > 0 {
            dark += 1;
        }
    }
    assert!(bright > 0 && dark > 0);
}
