//! Diffuse texture storage and 4-lane sampling.
//!
//! Textures are decoded once (forced to RGB8), shared between materials via
//! `Arc`, and immutable afterwards. Sampling is nearest-neighbour with UVs
//! clamped to `[0, 1]`; a texture that failed to load answers every sample
//! with the sentinel color so missing assets are visually obvious.

use std::path::Path;

use super::simd::{F32x4, I32x4};
use crate::error::RenderError;

/// Packed sentinel returned for unloaded textures: R=FF, G=FF, B=00.
pub const SENTINEL_COLOR: i32 = 0x00FFFF;

pub struct Texture {
    width: usize,
    height: usize,
    /// RGB bytes, `3 * width * height`, row-major.
    data: Vec<u8>,
    loaded: bool,
}

impl Texture {
    /// A texture with no backing image; `sample` yields the sentinel.
    pub fn unloaded() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
            loaded: false,
        }
    }

    /// Build a texture from raw RGB bytes. `data` must hold exactly
    /// `3 * width * height` bytes.
    pub fn from_rgb_pixels(width: usize, height: usize, data: Vec<u8>) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::invalid(format!(
                "texture dimensions must be positive, got {width}x{height}"
            )));
        }
        if data.len() != width * height * 3 {
            return Err(RenderError::invalid(format!(
                "texture data length {} does not match {width}x{height} RGB",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
            loaded: true,
        })
    }

    /// Decode an image file, forcing RGB8. A missing or undecodable file
    /// logs a warning and yields an unloaded texture; the renderer will
    /// substitute the sentinel color for it.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("failed to load texture {}: {err}", path.display());
                Self::unloaded()
            }
        }
    }

    /// Fallible variant of [`Texture::from_file`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        Self::from_rgb_pixels(width as usize, height as usize, img.into_raw())
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample four texels at once. UVs are clamped to `[0, 1]` and mapped to
    /// the nearest texel; each lane packs the fetched color as
    /// `(B << 16) | (G << 8) | R`.
    pub fn sample(&self, u: F32x4, v: F32x4) -> I32x4 {
        if !self.loaded {
            return I32x4::splat(SENTINEL_COLOR);
        }

        let zero = F32x4::zero();
        let one = F32x4::splat(1.0);
        let u = u.max(zero).min(one);
        let v = v.max(zero).min(one);

        let u_scaled = u * F32x4::splat((self.width - 1) as f32);
        let v_scaled = v * F32x4::splat((self.height - 1) as f32);
        let xi = u_scaled.trunc_i32().to_array();
        let yi = v_scaled.trunc_i32().to_array();

        let mut colors = [0i32; 4];
        for i in 0..4 {
            let idx = (yi[i] as usize * self.width + xi[i] as usize) * 3;
            let r = self.data[idx] as i32;
            let g = self.data[idx + 1] as i32;
            let b = self.data[idx + 2] as i32;
            colors[i] = (b << 16) | (g << 8) | r;
        }

        I32x4::new(colors[0], colors[1], colors[2], colors[3])
    }
}
