mod geometry;
mod scene;
mod vertex_index;

pub use geometry::*;
pub use scene::*;
pub use vertex_index::*;

/// A mesh that can be walked as triangles.
pub trait TriangleMesh {
    /// Iterates the triangles of the mesh in face order, resolving any
    /// indices to positions.
    ///
    /// Winding is preserved, so edges derived from the returned triangles
    /// keep their direction.
    fn triangles(&self) -> impl Iterator<Item = Triangle> + '_;
}
