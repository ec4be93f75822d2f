use glam::{Mat4, Vec3};

use super::Mesh;
use crate::error::RenderError;

/// An ordered list of meshes with a world TRS transform.
///
/// Rotation is Euler angles in degrees applied Z then Y then X, so the world
/// matrix is `T * Rz * Ry * Rx * S`. It is recomputed on every setter call;
/// `set_model_matrix` overrides it directly.
pub struct Model {
    meshes: Vec<Mesh>,
    model_matrix: Mat4,

    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
}

impl Model {
    /// Create a model. Fails when `meshes` is empty.
    pub fn new(meshes: Vec<Mesh>) -> Result<Self, RenderError> {
        if meshes.is_empty() {
            return Err(RenderError::invalid("model requires at least one mesh"));
        }

        let mut model = Self {
            meshes,
            model_matrix: Mat4::IDENTITY,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        };
        model.update_model_matrix();
        Ok(model)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_model_matrix();
    }

    /// Set the Euler rotation in degrees.
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.update_model_matrix();
    }

    /// Set the scale. Every component must be strictly positive.
    pub fn set_scale(&mut self, scale: Vec3) -> Result<(), RenderError> {
        if scale.x <= 0.0 || scale.y <= 0.0 || scale.z <= 0.0 {
            return Err(RenderError::invalid(format!(
                "scale components must be positive, got {scale}"
            )));
        }
        self.scale = scale;
        self.update_model_matrix();
        Ok(())
    }

    /// Replace the world matrix wholesale, bypassing the TRS state.
    pub fn set_model_matrix(&mut self, matrix: Mat4) {
        self.model_matrix = matrix;
    }

    fn update_model_matrix(&mut self) {
        let translation = Mat4::from_translation(self.position);

        let rotation_x = Mat4::from_rotation_x(self.rotation.x.to_radians());
        let rotation_y = Mat4::from_rotation_y(self.rotation.y.to_radians());
        let rotation_z = Mat4::from_rotation_z(self.rotation.z.to_radians());
        let rotation = rotation_z * rotation_y * rotation_x;

        let scale = Mat4::from_scale(self.scale);

        self.model_matrix = translation * rotation * scale;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}
