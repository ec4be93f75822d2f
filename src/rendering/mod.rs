//! Software rasterization pipeline: SIMD facade, framebuffer, textures,
//! shading and the tiled renderer itself.

pub mod framebuffer;
pub mod renderer;
pub mod shading;
pub mod simd;
pub mod texture;

pub use framebuffer::{FrameTile, Framebuffer, PixelTarget};
pub use renderer::Renderer;
pub use shading::ShadingConfig;
pub use texture::{Texture, SENTINEL_COLOR};
