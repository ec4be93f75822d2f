//! Structure-of-arrays vertex stream.
//!
//! Eight parallel f32 sequences, one per attribute component, kept separate
//! for SIMD-friendly access in the rasterizer. Every three consecutive
//! vertices form one triangle; there is no index buffer.

#[derive(Clone, Default)]
pub struct VertexArray {
    pub positions_x: Vec<f32>,
    pub positions_y: Vec<f32>,
    pub positions_z: Vec<f32>,

    pub uvs_u: Vec<f32>,
    pub uvs_v: Vec<f32>,

    pub normals_x: Vec<f32>,
    pub normals_y: Vec<f32>,
    pub normals_z: Vec<f32>,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut array = Self::new();
        array.reserve(capacity);
        array
    }

    /// Append one vertex to all eight streams.
    pub fn push(&mut self, position: [f32; 3], uv: [f32; 2], normal: [f32; 3]) {
        self.positions_x.push(position[0]);
        self.positions_y.push(position[1]);
        self.positions_z.push(position[2]);

        self.uvs_u.push(uv[0]);
        self.uvs_v.push(uv[1]);

        self.normals_x.push(normal[0]);
        self.normals_y.push(normal[1]);
        self.normals_z.push(normal[2]);
    }

    pub fn reserve(&mut self, additional: usize) {
        self.positions_x.reserve(additional);
        self.positions_y.reserve(additional);
        self.positions_z.reserve(additional);

        self.uvs_u.reserve(additional);
        self.uvs_v.reserve(additional);

        self.normals_x.reserve(additional);
        self.normals_y.reserve(additional);
        self.normals_z.reserve(additional);
    }

    pub fn clear(&mut self) {
        self.positions_x.clear();
        self.positions_y.clear();
        self.positions_z.clear();

        self.uvs_u.clear();
        self.uvs_v.clear();

        self.normals_x.clear();
        self.normals_y.clear();
        self.normals_z.clear();
    }

    pub fn len(&self) -> usize {
        self.positions_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions_x.is_empty()
    }

    /// True when all eight streams have the same length.
    pub fn is_consistent(&self) -> bool {
        let len = self.positions_x.len();
        self.positions_y.len() == len
            && self.positions_z.len() == len
            && self.uvs_u.len() == len
            && self.uvs_v.len() == len
            && self.normals_x.len() == len
            && self.normals_y.len() == len
            && self.normals_z.len() == len
    }
}
