//! Tiled software rasterization pipeline.
//!
//! A draw runs in two phases. The single-threaded front end transforms each
//! vertex triple to clip space, culls triangles that are behind the camera or
//! back-facing, precomputes edge functions and broadcast vertex attributes,
//! and bins the survivors into 16x16 screen tiles. The back end then
//! rasterizes every tile in parallel; tiles cover disjoint pixel rectangles,
//! so the workers write color and depth without any synchronization.
//!
//! The inner loop walks each scanline four pixels at a time: edge functions
//! give a coverage mask, interpolated depth is tested against the depth
//! buffer, and surviving lanes get perspective-correct UVs and normals,
//! a Lambert + ambient shade, and a masked write.

use glam::{Mat3, Mat4, Vec3, Vec4};
use rayon::prelude::*;

use super::framebuffer::{Framebuffer, PixelTarget};
use super::shading::ShadingConfig;
use super::simd::{F32x4, I32x4};
use super::texture::SENTINEL_COLOR;
use crate::camera::Camera;
use crate::scene::{Material, Mesh, Model, VertexArray};

const TILE_SIZE: usize = 16;
const TILE_SHIFT: i32 = 4;

/// Signed areas at or below this are treated as degenerate.
const DEGENERATE_AREA_EPS: f32 = 1e-6;

/// Per-triangle setup, rebuilt for every draw.
///
/// Vertex attributes are stored pre-broadcast to all four lanes; the scanline
/// loop turns them into per-pixel values by weighting with the per-lane
/// barycentrics.
struct TriangleData {
    // screen-space bounds, clamped to the framebuffer
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,

    inv_area: F32x4,
    edge_a: [F32x4; 3],
    edge_b: [F32x4; 3],
    edge_c: [F32x4; 3],
    /// Edge function step across one 4-pixel quad: `4 * A`.
    edge_dx: [F32x4; 3],

    depth: [F32x4; 3],
    inv_w: [F32x4; 3],
    u: [F32x4; 3],
    v: [F32x4; 3],
    normal_x: [F32x4; 3],
    normal_y: [F32x4; 3],
    normal_z: [F32x4; 3],
}

pub struct Renderer {
    pub shading: ShadingConfig,

    tile_count_x: i32,
    tile_count_y: i32,

    // scratch reused across draws; capacity is retained, length reset
    triangles: Vec<TriangleData>,
    tile_ranges: Vec<[i32; 4]>,
    bin_counts: Vec<u32>,
    bin_offsets: Vec<u32>,
    bin_cursor: Vec<u32>,
    binned: Vec<u32>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            shading: ShadingConfig::default(),
            tile_count_x: 0,
            tile_count_y: 0,
            triangles: Vec::new(),
            tile_ranges: Vec::new(),
            bin_counts: Vec::new(),
            bin_offsets: Vec::new(),
            bin_cursor: Vec::new(),
            binned: Vec::new(),
        }
    }

    /// Render every mesh of `model` in order.
    pub fn render_model(&mut self, framebuffer: &mut Framebuffer, camera: &Camera, model: &Model) {
        let model_matrix = *model.model_matrix();
        for mesh in model.meshes() {
            self.render_mesh(framebuffer, camera, mesh, &model_matrix);
        }
    }

    pub fn render_mesh(
        &mut self,
        framebuffer: &mut Framebuffer,
        camera: &Camera,
        mesh: &Mesh,
        model_matrix: &Mat4,
    ) {
        let world = *model_matrix * *mesh.local_matrix();
        let mvp = *camera.view_projection_matrix() * world;
        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();

        self.triangles.clear();
        self.triangles.reserve(mesh.vertex_array().len() / 3);

        self.assemble_triangles(
            mesh.vertex_array(),
            &mvp,
            &normal_matrix,
            framebuffer.width() as i32,
            framebuffer.height() as i32,
        );

        if self.triangles.is_empty() {
            return;
        }

        self.rasterize_tiles(framebuffer, mesh.material());
    }

    /// Transform each vertex triple, cull, and set up the survivors.
    fn assemble_triangles(
        &mut self,
        vertices: &VertexArray,
        mvp: &Mat4,
        normal_matrix: &Mat3,
        width: i32,
        height: i32,
    ) {
        let count = vertices.len();

        let mut base = 0;
        while base + 2 < count {
            let first = base;
            base += 3;

            let mut inv_w = [0.0f32; 3];
            let mut ndc_z = [0.0f32; 3];
            let mut sx = [0i32; 3];
            let mut sy = [0i32; 3];
            let mut culled = false;

            for i in 0..3 {
                let vi = first + i;
                let clip = *mvp
                    * Vec4::new(
                        vertices.positions_x[vi],
                        vertices.positions_y[vi],
                        vertices.positions_z[vi],
                        1.0,
                    );

                // no near-plane clipping: any vertex behind the camera
                // rejects the whole triangle
                if clip.w <= 0.0 {
                    culled = true;
                    break;
                }

                let w_recip = 1.0 / clip.w;
                inv_w[i] = w_recip;
                ndc_z[i] = clip.z * w_recip;
                let ndc_x = clip.x * w_recip;
                let ndc_y = clip.y * w_recip;

                // NDC [-1,1] to screen, y flipped
                sx[i] = ((ndc_x + 1.0) * 0.5 * width as f32) as i32;
                sy[i] = ((1.0 - ndc_y) * 0.5 * height as f32) as i32;
            }

            if culled {
                continue;
            }

            // backface cull: screen-space CCW (negative signed area) is front
            let signed_area = ((sx[1] - sx[0]) as f32) * ((sy[2] - sy[0]) as f32)
                - ((sx[2] - sx[0]) as f32) * ((sy[1] - sy[0]) as f32);
            if signed_area >= 0.0 {
                continue;
            }

            let abs_area = signed_area.abs();
            let inv_area = if abs_area > DEGENERATE_AREA_EPS {
                1.0 / abs_area
            } else {
                0.0
            };

            let mut triangle =
                setup_triangle(&sx, &sy, &ndc_z, &inv_w, vertices, first, normal_matrix, inv_area);

            triangle.min_x = triangle.min_x.max(0);
            triangle.max_x = triangle.max_x.min(width - 1);
            triangle.min_y = triangle.min_y.max(0);
            triangle.max_y = triangle.max_y.min(height - 1);

            self.triangles.push(triangle);
        }
    }

    /// Two-pass bucket build: count triangles per tile, exclusive prefix sum,
    /// then scatter indices. Bin `b` holds `binned[offsets[b]..offsets[b+1]]`
    /// in triangle-assembly order.
    fn bin_triangles(&mut self) {
        let tile_count = (self.tile_count_x * self.tile_count_y) as usize;

        self.tile_ranges.clear();
        self.tile_ranges.reserve(self.triangles.len());

        self.bin_counts.clear();
        self.bin_counts.resize(tile_count, 0);
        self.bin_offsets.clear();
        self.bin_offsets.resize(tile_count + 1, 0);

        for triangle in &self.triangles {
            let min_tx = (triangle.min_x >> TILE_SHIFT).clamp(0, self.tile_count_x - 1);
            let max_tx = (triangle.max_x >> TILE_SHIFT).clamp(0, self.tile_count_x - 1);
            let min_ty = (triangle.min_y >> TILE_SHIFT).clamp(0, self.tile_count_y - 1);
            let max_ty = (triangle.max_y >> TILE_SHIFT).clamp(0, self.tile_count_y - 1);
            self.tile_ranges.push([min_tx, max_tx, min_ty, max_ty]);

            for ty in min_ty..=max_ty {
                let row = (ty * self.tile_count_x) as usize;
                for tx in min_tx..=max_tx {
                    self.bin_counts[row + tx as usize] += 1;
                }
            }
        }

        for t in 0..tile_count {
            self.bin_offsets[t + 1] = self.bin_offsets[t] + self.bin_counts[t];
        }

        let total = self.bin_offsets[tile_count] as usize;
        self.binned.clear();
        self.binned.resize(total, 0);

        self.bin_cursor.clear();
        self.bin_cursor.extend_from_slice(&self.bin_offsets[..tile_count]);

        for (index, range) in self.tile_ranges.iter().enumerate() {
            let [min_tx, max_tx, min_ty, max_ty] = *range;
            for ty in min_ty..=max_ty {
                let row = (ty * self.tile_count_x) as usize;
                for tx in min_tx..=max_tx {
                    let bin = row + tx as usize;
                    let pos = self.bin_cursor[bin] as usize;
                    self.bin_cursor[bin] += 1;
                    self.binned[pos] = index as u32;
                }
            }
        }
    }

    fn rasterize_tiles(&mut self, framebuffer: &mut Framebuffer, material: Option<&Material>) {
        let fb_width = framebuffer.width() as i32;
        let fb_height = framebuffer.height() as i32;

        self.tile_count_x = (fb_width + TILE_SIZE as i32 - 1) >> TILE_SHIFT;
        self.tile_count_y = (fb_height + TILE_SIZE as i32 - 1) >> TILE_SHIFT;

        self.bin_triangles();

        let mut tiles = framebuffer.split_into_tiles(TILE_SIZE);
        debug_assert_eq!(tiles.len(), (self.tile_count_x * self.tile_count_y) as usize);

        // triangle data and bins are read-only from here on
        let this: &Renderer = self;
        tiles.par_iter_mut().enumerate().for_each(|(tile_index, tile)| {
            let start = this.bin_offsets[tile_index] as usize;
            let end = this.bin_offsets[tile_index + 1] as usize;
            if start == end {
                return;
            }
            this.rasterize_tile(tile, material, &this.binned[start..end]);
        });
    }

    fn rasterize_tile<T: PixelTarget>(
        &self,
        target: &mut T,
        material: Option<&Material>,
        triangle_indices: &[u32],
    ) {
        let (x0, y0, tile_width, tile_height) = target.rect();
        let tile_min_x = x0 as i32;
        let tile_min_y = y0 as i32;
        let tile_max_x = (x0 + tile_width) as i32;
        let tile_max_y = (y0 + tile_height) as i32;

        for &index in triangle_indices {
            let triangle = &self.triangles[index as usize];

            let min_x = tile_min_x.max(triangle.min_x);
            let max_x = (tile_max_x - 1).min(triangle.max_x);
            let min_y = tile_min_y.max(triangle.min_y);
            let max_y = (tile_max_y - 1).min(triangle.max_y);

            if min_x > max_x || min_y > max_y {
                continue;
            }

            for y in min_y..=max_y {
                self.rasterize_scanline(target, material, triangle, y, min_x, max_x + 1);
            }
        }
    }

    /// Rasterize `[start_x, end_x)` of scanline `y`, four pixels per step.
    fn rasterize_scanline<T: PixelTarget>(
        &self,
        target: &mut T,
        material: Option<&Material>,
        triangle: &TriangleData,
        y: i32,
        start_x: i32,
        end_x: i32,
    ) {
        let zero = F32x4::zero();
        let one = F32x4::splat(1.0);

        let y_float = F32x4::splat(y as f32);
        let y_int = I32x4::splat(y);

        let span = end_x - start_x;
        let quad_count = (span + 3) >> 2;

        let x_base = F32x4::new(
            start_x as f32,
            (start_x + 1) as f32,
            (start_x + 2) as f32,
            (start_x + 3) as f32,
        );
        let mut x_int = I32x4::new(start_x, start_x + 1, start_x + 2, start_x + 3);
        let x_step = I32x4::splat(4);

        // evaluate the edge functions at (start_x.., y)
        let bc0 = triangle.edge_b[0].mul_add(y_float, triangle.edge_c[0]);
        let bc1 = triangle.edge_b[1].mul_add(y_float, triangle.edge_c[1]);
        let bc2 = triangle.edge_b[2].mul_add(y_float, triangle.edge_c[2]);

        let mut edge0 = triangle.edge_a[0].mul_add(x_base, bc0);
        let mut edge1 = triangle.edge_a[1].mul_add(x_base, bc1);
        let mut edge2 = triangle.edge_a[2].mul_add(x_base, bc2);

        for quad in 0..quad_count {
            // lanes past end_x are masked off so the write stays inside this
            // target's rectangle (adjacent tiles own the next pixels)
            let lane_mask: u32 = if quad == quad_count - 1 {
                let live = span - (quad_count - 1) * 4;
                (1u32 << live) - 1
            } else {
                0xF
            };

            // a pixel is inside when all three edge values are <= 0
            let inside = edge0.cmp_le(zero) & edge1.cmp_le(zero) & edge2.cmp_le(zero);
            let mut mask = inside.movemask() & lane_mask;

            if mask != 0 {
                let neg_inv_area = F32x4::splat(-1.0) * triangle.inv_area;
                let w0 = edge0 * neg_inv_area;
                let w1 = edge1 * neg_inv_area;
                let w2 = one - w0 - w1;

                let depth = w2.mul_add(
                    triangle.depth[2],
                    w1.mul_add(triangle.depth[1], w0 * triangle.depth[0]),
                );

                mask &= target.depth_test(x_int, y_int, depth);

                if mask != 0 {
                    // perspective correction
                    let mut p0 = w0 * triangle.inv_w[0];
                    let mut p1 = w1 * triangle.inv_w[1];
                    let mut p2 = w2 * triangle.inv_w[2];
                    let rcp = one / (p0 + p1 + p2);
                    p0 = p0 * rcp;
                    p1 = p1 * rcp;
                    p2 = p2 * rcp;

                    let tex_u = p2.mul_add(
                        triangle.u[2],
                        p1.mul_add(triangle.u[1], p0 * triangle.u[0]),
                    );
                    let tex_v = p2.mul_add(
                        triangle.v[2],
                        p1.mul_add(triangle.v[1], p0 * triangle.v[0]),
                    );
                    let normal_x = p2.mul_add(
                        triangle.normal_x[2],
                        p1.mul_add(triangle.normal_x[1], p0 * triangle.normal_x[0]),
                    );
                    let normal_y = p2.mul_add(
                        triangle.normal_y[2],
                        p1.mul_add(triangle.normal_y[1], p0 * triangle.normal_y[0]),
                    );
                    let normal_z = p2.mul_add(
                        triangle.normal_z[2],
                        p1.mul_add(triangle.normal_z[1], p0 * triangle.normal_z[0]),
                    );

                    let colors =
                        self.fragment_shader(tex_u, tex_v, normal_x, normal_y, normal_z, material);

                    target.set_depth(x_int, y_int, depth, mask);
                    target.set_pixel(x_int, y_int, colors, mask);
                }
            }

            edge0 = edge0 + triangle.edge_dx[0];
            edge1 = edge1 + triangle.edge_dx[1];
            edge2 = edge2 + triangle.edge_dx[2];
            x_int = x_int + x_step;
        }
    }

    /// Lambert + ambient shade of four fragments.
    fn fragment_shader(
        &self,
        u: F32x4,
        v: F32x4,
        normal_x: F32x4,
        normal_y: F32x4,
        normal_z: F32x4,
        material: Option<&Material>,
    ) -> I32x4 {
        let Some(material) = material else {
            // no material at all: unshaded sentinel
            return I32x4::splat(SENTINEL_COLOR);
        };

        let zero = F32x4::zero();
        let one = F32x4::splat(1.0);
        let light = self.shading.light_dir;

        let dot = normal_z.mul_add(
            F32x4::splat(light.z),
            normal_y.mul_add(F32x4::splat(light.y), normal_x * F32x4::splat(light.x)),
        );
        let lambert = dot.max(zero).min(one);
        let lighting = (F32x4::splat(self.shading.ambient) + lambert).min(one);

        let tex_color = match material.diffuse_texture() {
            Some(texture) if texture.is_loaded() => texture.sample(u, v),
            _ => I32x4::splat(0xFFFFFF),
        };

        let mask_ff = I32x4::splat(0xFF);
        let r = tex_color & mask_ff;
        let g = tex_color.shr::<8>() & mask_ff;
        let b = tex_color.shr::<16>() & mask_ff;

        let inv_255 = F32x4::splat(1.0 / 255.0);
        let mul_255 = F32x4::splat(255.0);

        let r_lit = r.to_f32() * inv_255 * lighting * mul_255;
        let g_lit = g.to_f32() * inv_255 * lighting * mul_255;
        let b_lit = b.to_f32() * inv_255 * lighting * mul_255;

        let r_out = r_lit.round_i32() & mask_ff;
        let g_out = (g_lit.round_i32() & mask_ff).shl::<8>();
        let b_out = (b_lit.round_i32() & mask_ff).shl::<16>();

        r_out | g_out | b_out
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the per-triangle data: bounds, edge functions over the edges
/// `(1,2), (2,0), (0,1)`, and broadcast vertex attributes.
#[allow(clippy::too_many_arguments)]
fn setup_triangle(
    sx: &[i32; 3],
    sy: &[i32; 3],
    ndc_z: &[f32; 3],
    inv_w: &[f32; 3],
    vertices: &VertexArray,
    first: usize,
    normal_matrix: &Mat3,
    inv_area: f32,
) -> TriangleData {
    let xf = [sx[0] as f32, sx[1] as f32, sx[2] as f32];
    let yf = [sy[0] as f32, sy[1] as f32, sy[2] as f32];

    const EDGES: [(usize, usize); 3] = [(1, 2), (2, 0), (0, 1)];

    let mut edge_a = [F32x4::zero(); 3];
    let mut edge_b = [F32x4::zero(); 3];
    let mut edge_c = [F32x4::zero(); 3];
    let mut edge_dx = [F32x4::zero(); 3];

    for (k, (i, j)) in EDGES.into_iter().enumerate() {
        let a = yf[i] - yf[j];
        let b = xf[j] - xf[i];
        let c = xf[i] * yf[j] - xf[j] * yf[i];
        edge_a[k] = F32x4::splat(a);
        edge_b[k] = F32x4::splat(b);
        edge_c[k] = F32x4::splat(c);
        edge_dx[k] = F32x4::splat(a * 4.0);
    }

    let mut depth = [F32x4::zero(); 3];
    let mut inv_w_b = [F32x4::zero(); 3];
    let mut u = [F32x4::zero(); 3];
    let mut v = [F32x4::zero(); 3];
    let mut normal_x = [F32x4::zero(); 3];
    let mut normal_y = [F32x4::zero(); 3];
    let mut normal_z = [F32x4::zero(); 3];

    for k in 0..3 {
        let vi = first + k;

        depth[k] = F32x4::splat(ndc_z[k]);
        inv_w_b[k] = F32x4::splat(inv_w[k]);
        u[k] = F32x4::splat(vertices.uvs_u[vi]);
        v[k] = F32x4::splat(vertices.uvs_v[vi]);

        // world space for lighting
        let normal = Vec3::new(
            vertices.normals_x[vi],
            vertices.normals_y[vi],
            vertices.normals_z[vi],
        );
        let world_normal = (*normal_matrix * normal).normalize_or_zero();
        normal_x[k] = F32x4::splat(world_normal.x);
        normal_y[k] = F32x4::splat(world_normal.y);
        normal_z[k] = F32x4::splat(world_normal.z);
    }

    TriangleData {
        min_x: sx[0].min(sx[1]).min(sx[2]),
        max_x: sx[0].max(sx[1]).max(sx[2]),
        min_y: sy[0].min(sy[1]).min(sy[2]),
        max_y: sy[0].max(sy[1]).max(sy[2]),
        inv_area: F32x4::splat(inv_area),
        edge_a,
        edge_b,
        edge_c,
        edge_dx,
        depth,
        inv_w: inv_w_b,
        u,
        v,
        normal_x,
        normal_y,
        normal_z,
    }
}
