//! Error kinds surfaced by fallible constructors and loaders.

use std::fmt;

#[derive(Debug)]
pub enum RenderError {
    /// A constructor or setter was handed a value outside its domain
    /// (zero framebuffer dimensions, non-positive scale, mismatched
    /// vertex streams, out-of-range camera parameters, ...).
    InvalidArgument(String),
    /// A texture file could not be opened or decoded.
    TextureLoad(image::ImageError),
}

impl RenderError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::TextureLoad(err) => write!(f, "texture load failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TextureLoad(err) => Some(err),
            _ => None,
        }
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        Self::TextureLoad(err)
    }
}
