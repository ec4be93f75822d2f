use std::sync::Arc;

use crate::error::RenderError;
use crate::rendering::Texture;

/// Associates an optional diffuse texture with a draw. Textures are shared
/// between materials; a mesh drawn with no material at all renders in the
/// sentinel color.
#[derive(Clone, Default)]
pub struct Material {
    diffuse_texture: Option<Arc<Texture>>,
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a diffuse texture. Rejects textures that failed to load.
    pub fn set_diffuse_texture(&mut self, texture: Arc<Texture>) -> Result<(), RenderError> {
        if !texture.is_loaded() {
            return Err(RenderError::invalid(
                "cannot set an unloaded texture as diffuse",
            ));
        }
        self.diffuse_texture = Some(texture);
        Ok(())
    }

    pub fn diffuse_texture(&self) -> Option<&Texture> {
        self.diffuse_texture.as_deref()
    }
}
