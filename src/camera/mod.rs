//! Perspective camera supplying the view-projection matrix.
//!
//! Orientation is yaw/pitch in degrees; the projection uses GL clip
//! conventions (depth in [-1, 1]), which is what the depth buffer's 1.0
//! clear value and strict less-than test assume.

use glam::{Mat4, Vec3};

use crate::error::RenderError;

const MAX_PITCH: f32 = 89.0;

pub struct Camera {
    position: Vec3,
    world_up: Vec3,

    front: Vec3,
    right: Vec3,
    up: Vec3,

    // euler angles in degrees
    yaw: f32,
    pitch: f32,
    fov: f32,

    aspect_ratio: f32,
    near_plane: f32,
    far_plane: f32,

    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
}

impl Camera {
    /// Create a camera. `yaw`/`pitch`/`fov` are in degrees; yaw of -90 looks
    /// down -Z. Fails when the position is non-finite, `fov` is outside
    /// (0, 180), `aspect_ratio <= 0`, `near <= 0` or `far <= near`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Vec3,
        up: Vec3,
        yaw: f32,
        pitch: f32,
        fov: f32,
        aspect_ratio: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Result<Self, RenderError> {
        if !position.is_finite() {
            return Err(RenderError::invalid("camera position must be finite"));
        }
        Self::validate_projection(fov, aspect_ratio, near_plane, far_plane)?;

        let mut camera = Self {
            position,
            world_up: Vec3::new(0.0, 1.0, 0.0),
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up,
            yaw,
            pitch,
            fov,
            aspect_ratio,
            near_plane,
            far_plane,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera.update_view_matrix();
        Ok(camera)
    }

    fn validate_projection(
        fov: f32,
        aspect_ratio: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Result<(), RenderError> {
        if !(fov > 0.0 && fov < 180.0) {
            return Err(RenderError::invalid(format!(
                "fov must be in (0, 180) degrees, got {fov}"
            )));
        }
        if !(aspect_ratio > 0.0) {
            return Err(RenderError::invalid(format!(
                "aspect ratio must be positive, got {aspect_ratio}"
            )));
        }
        if !(near_plane > 0.0) {
            return Err(RenderError::invalid(format!(
                "near plane must be positive, got {near_plane}"
            )));
        }
        if !(far_plane > near_plane) {
            return Err(RenderError::invalid(format!(
                "far plane ({far_plane}) must be greater than near plane ({near_plane})"
            )));
        }
        Ok(())
    }

    fn update_view_matrix(&mut self) {
        // clamp to avoid gimbal lock; yaw wraps naturally through the trig
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);

        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();

        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();

        self.view = Mat4::look_at_rh(self.position, self.position + self.front, self.up);
        self.view_projection = self.projection * self.view;
    }

    fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh_gl(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );
        self.view_projection = self.projection * self.view;
    }

    pub fn set_position(&mut self, position: Vec3) -> Result<(), RenderError> {
        if !position.is_finite() {
            return Err(RenderError::invalid("camera position must be finite"));
        }
        self.position = position;
        self.update_view_matrix();
        Ok(())
    }

    /// Set yaw and pitch in degrees. Pitch is clamped to +/-89.
    pub fn set_direction(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.update_view_matrix();
    }

    pub fn set_fov(&mut self, fov: f32) -> Result<(), RenderError> {
        Self::validate_projection(fov, self.aspect_ratio, self.near_plane, self.far_plane)?;
        self.fov = fov;
        self.update_projection_matrix();
        Ok(())
    }

    pub fn set_projection_params(
        &mut self,
        aspect_ratio: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Result<(), RenderError> {
        Self::validate_projection(self.fov, aspect_ratio, near_plane, far_plane)?;
        self.aspect_ratio = aspect_ratio;
        self.near_plane = near_plane;
        self.far_plane = far_plane;
        self.update_projection_matrix();
        Ok(())
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }
}

impl Default for Camera {
    /// Camera at the origin looking down -Z with a 90 degree fov.
    fn default() -> Self {
        Self::new(
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            -90.0,
            0.0,
            90.0,
            16.0 / 9.0,
            0.1,
            100.0,
        )
        .expect("default camera parameters are valid")
    }
}
