//! Scene graph: models own meshes, meshes own vertex streams and share
//! materials, materials share textures. Strictly a tree with
//! reference-counted leaves.

mod material;
mod mesh;
mod model;
mod vertex_array;

pub use material::Material;
pub use mesh::Mesh;
pub use model::Model;
pub use vertex_array::VertexArray;
