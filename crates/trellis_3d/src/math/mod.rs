//! Math utilities: bounding volumes and ray tests.

mod bounds;
mod ray;

pub use bounds::BoundingBox;
pub use ray::{intersect_aabb, intersect_triangle, Ray};

/// Epsilon used for crease-angle and axis degeneracy comparisons.
pub const EPS: f32 = 1.0e-6;
