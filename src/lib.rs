//! Tiled, SIMD-vectorized, parallel CPU software rasterizer.
//!
//! Models are flat triangle streams in structure-of-arrays layout; a draw
//! transforms them through a camera's view-projection, culls, bins the
//! surviving triangles into 16x16 screen tiles and rasterizes the tiles in
//! parallel with 4-wide SIMD coverage, depth testing, perspective-correct
//! interpolation and a Lambert + ambient texture shade.

pub mod camera;
pub mod error;
pub mod rendering;
pub mod scene;

pub use camera::Camera;
pub use error::RenderError;
pub use rendering::{Framebuffer, PixelTarget, Renderer, ShadingConfig, Texture, SENTINEL_COLOR};
pub use scene::{Material, Mesh, Model, VertexArray};
