//! Lighting parameters for the fragment stage.

use glam::Vec3;

/// Directional + ambient lighting applied per fragment.
///
/// The default reproduces the reference look: the light direction is left
/// non-unit on purpose, and the `min(ambient + lambert, 1)` saturation in
/// the fragment stage turns that into a bright surface with a soft dark side.
#[derive(Copy, Clone, Debug)]
pub struct ShadingConfig {
    /// Direction toward the light, dotted with the interpolated world normal.
    pub light_dir: Vec3,
    /// Constant term added to the Lambert factor before saturation.
    pub ambient: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            light_dir: Vec3::new(0.5, 0.5, 0.5),
            ambient: 0.2,
        }
    }
}
