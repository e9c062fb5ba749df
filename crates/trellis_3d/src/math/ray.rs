//! Rays and intersection tests.

use glam::{Mat4, Vec3};

use super::bounds::BoundingBox;

/// A ray with origin and (not necessarily normalized) direction.
///
/// Hit distances are reported as the ray parameter `t` with
/// `point = origin + t * dir`. The parameter is preserved by affine maps of
/// both origin and direction, so picking through transform nodes never has
/// to rescale recorded distances.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Map this ray through `matrix` (point for origin, vector for dir).
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            dir: matrix.transform_vector3(self.dir),
        }
    }
}

/// Slab test against an axis-aligned box. Returns false for empty boxes.
pub fn intersect_aabb(ray: &Ray, bb: &BoundingBox) -> bool {
    if bb.is_empty() {
        return false;
    }
    let inv = ray.dir.recip();
    let t0 = (bb.min - ray.origin) * inv;
    let t1 = (bb.max - ray.origin) * inv;
    let tmin = t0.min(t1);
    let tmax = t0.max(t1);
    let enter = tmin.max_element().max(0.0);
    let exit = tmax.min_element();
    enter <= exit
}

/// Möller-Trumbore triangle test. Returns the ray parameter of the hit, if
/// any, for `t >= 0`. Backfaces hit too.
pub fn intersect_triangle(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPS: f32 = 1.0e-8;
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_hit_and_miss() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::Z);
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let t = intersect_triangle(&ray, a, b, c).unwrap();
        assert!((t - 1.0).abs() < 1.0e-6);

        let miss = Ray::new(Vec3::new(2.0, 2.0, -1.0), Vec3::Z);
        assert!(intersect_triangle(&miss, a, b, c).is_none());
    }

    #[test]
    fn test_triangle_behind_origin() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_aabb_hit() {
        let bb = BoundingBox::from_points(&[-Vec3::ONE, Vec3::ONE]);
        assert!(intersect_aabb(&Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z), &bb));
        assert!(!intersect_aabb(&Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z), &bb));
        assert!(!intersect_aabb(&Ray::new(Vec3::ZERO, Vec3::Z), &BoundingBox::EMPTY));
    }

    #[test]
    fn test_parameter_is_scale_free() {
        // Same t whether dir is unit or scaled.
        let bbv = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let r1 = Ray::new(Vec3::new(0.2, 0.2, -2.0), Vec3::Z);
        let r2 = Ray::new(Vec3::new(0.2, 0.2, -2.0), Vec3::Z * 4.0);
        let t1 = intersect_triangle(&r1, bbv[0], bbv[1], bbv[2]).unwrap();
        let t2 = intersect_triangle(&r2, bbv[0], bbv[1], bbv[2]).unwrap();
        assert!((t1 - 2.0).abs() < 1.0e-6);
        assert!((t2 - 0.5).abs() < 1.0e-6);
    }
}
