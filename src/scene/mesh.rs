use std::sync::Arc;

use glam::Mat4;

use super::{Material, VertexArray};
use crate::error::RenderError;

/// A vertex stream plus a local transform and an optional shared material.
#[derive(Clone)]
pub struct Mesh {
    vertex_array: VertexArray,
    local_matrix: Mat4,
    material: Option<Arc<Material>>,
}

impl Mesh {
    /// Create a mesh without a material; it will render in the sentinel
    /// color. Fails when the vertex stream is empty or its attribute
    /// streams have mismatched lengths.
    pub fn new(vertex_array: VertexArray) -> Result<Self, RenderError> {
        Self::validate(&vertex_array)?;
        Ok(Self {
            vertex_array,
            local_matrix: Mat4::IDENTITY,
            material: None,
        })
    }

    pub fn with_material(
        vertex_array: VertexArray,
        material: Arc<Material>,
    ) -> Result<Self, RenderError> {
        let mut mesh = Self::new(vertex_array)?;
        mesh.material = Some(material);
        Ok(mesh)
    }

    fn validate(vertex_array: &VertexArray) -> Result<(), RenderError> {
        if vertex_array.is_empty() {
            return Err(RenderError::invalid("vertex array cannot be empty"));
        }
        if !vertex_array.is_consistent() {
            return Err(RenderError::invalid(
                "vertex attribute streams must all have the same length",
            ));
        }
        Ok(())
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    pub fn set_local_matrix(&mut self, matrix: Mat4) {
        self.local_matrix = matrix;
    }

    pub fn material(&self) -> Option<&Material> {
        self.material.as_deref()
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = Some(material);
    }
}
