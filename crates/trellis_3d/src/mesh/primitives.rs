//! Procedural primitive tessellators.
//!
//! Each generator produces a single-part triangle mesh with positions,
//! normals and (where the parameterization gives them naturally) texture
//! coordinates. Tessellation densities are fixed per primitive so equal
//! parameters always produce identical meshes, which is what makes the
//! geometry cache effective.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::{Mesh, MeshPart, Primitive};

/// Axis-aligned box centered at the origin.
pub struct BoxGeometry;

impl BoxGeometry {
    /// `size` is the full extent along each axis.
    pub fn new(size: Vec3) -> Mesh {
        let h = size * 0.5;
        let (x, y, z) = (h.x, h.y, h.z);

        let mut part = MeshPart::new();
        // Six faces, four corners each, shared nothing.
        part.positions = vec![
            Vec3::new(-x, -y, -z), Vec3::new(-x,  y, -z), Vec3::new( x,  y, -z), Vec3::new( x, -y, -z),
            Vec3::new(-x, -y,  z), Vec3::new(-x,  y,  z), Vec3::new( x,  y,  z), Vec3::new( x, -y,  z),
            Vec3::new(-x, -y, -z), Vec3::new(-x, -y,  z), Vec3::new(-x,  y,  z), Vec3::new(-x,  y, -z),
            Vec3::new( x, -y, -z), Vec3::new( x, -y,  z), Vec3::new( x,  y,  z), Vec3::new( x,  y, -z),
            Vec3::new(-x,  y, -z), Vec3::new(-x,  y,  z), Vec3::new( x,  y,  z), Vec3::new( x,  y, -z),
            Vec3::new(-x, -y, -z), Vec3::new(-x, -y,  z), Vec3::new( x, -y,  z), Vec3::new( x, -y, -z),
        ];
        let face_normals = [
            Vec3::NEG_Z,
            Vec3::Z,
            Vec3::NEG_X,
            Vec3::X,
            Vec3::Y,
            Vec3::NEG_Y,
        ];
        for n in face_normals {
            part.normals.extend([n; 4]);
        }
        for face in 0..6u32 {
            let uv = [
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
            ];
            part.tex_coords.extend(uv);
            let b = face * 4;
            // Winding flips per face so all triangles face outward.
            if matches!(face, 0 | 2 | 5) {
                part.indices.extend([b, b + 1, b + 2, b + 2, b + 3, b]);
            } else {
                part.indices.extend([b, b + 2, b + 1, b + 2, b, b + 3]);
            }
        }

        let mut mesh = Mesh::empty(Primitive::Triangles);
        mesh.parts.push(part);
        mesh.finished()
    }
}

/// Latitude/longitude sphere centered at the origin.
pub struct SphereGeometry;

impl SphereGeometry {
    /// 24 latitude and longitude bands.
    pub fn new(radius: f32) -> Mesh {
        Self::with_bands(radius, 24)
    }

    pub fn with_bands(radius: f32, bands: u32) -> Mesh {
        let lat_bands = bands.max(2);
        let long_bands = bands.max(3);

        let mut part = MeshPart::new();
        for lat in 0..=lat_bands {
            let theta = lat as f32 * PI / lat_bands as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for long in 0..=long_bands {
                let phi = long as f32 * 2.0 * PI / long_bands as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                let n = Vec3::new(-cos_p * sin_t, -cos_t, -sin_p * sin_t);
                part.positions.push(n * radius);
                part.normals.push(n);
                part.tex_coords.push(Vec2::new(
                    0.25 - long as f32 / long_bands as f32,
                    lat as f32 / lat_bands as f32,
                ));
            }
        }
        for lat in 0..lat_bands {
            for long in 0..long_bands {
                let first = lat * (long_bands + 1) + long;
                let second = first + long_bands + 1;
                part.indices.extend([first, second, first + 1]);
                part.indices.extend([second, second + 1, first + 1]);
            }
        }

        let mut mesh = Mesh::empty(Primitive::Triangles);
        mesh.parts.push(part);
        mesh.finished()
    }
}

/// Cone with its apex up the +y axis, 32 radial segments.
pub struct ConeGeometry;

impl ConeGeometry {
    pub fn new(bottom_radius: f32, height: f32, side: bool, bottom: bool) -> Mesh {
        const SIDES: u32 = 32;
        let delta = 2.0 * PI / SIDES as f32;
        let half = height / 2.0;

        let mut part = MeshPart::new();
        if side {
            let incl = bottom_radius / height;
            let nlen = 1.0 / (1.0 + incl * incl).sqrt();
            for j in 0..=SIDES {
                let beta = j as f32 * delta;
                let x = beta.sin();
                let z = -beta.cos();
                let n = Vec3::new(x * nlen, incl * nlen, z * nlen);
                let u = 1.0 - j as f32 / SIDES as f32;

                part.positions.push(Vec3::new(0.0, half, 0.0));
                part.normals.push(n);
                part.tex_coords.push(Vec2::new(u, 1.0));

                part.positions
                    .push(Vec3::new(x * bottom_radius, -half, z * bottom_radius));
                part.normals.push(n);
                part.tex_coords.push(Vec2::new(u, 0.0));

                if j > 0 {
                    let k = 2 * (j - 1);
                    part.indices.extend([k, k + 1, k + 2]);
                    part.indices.extend([k + 2, k + 1, k + 3]);
                }
            }
        }
        if bottom && bottom_radius > 0.0 {
            let base = part.positions.len() as u32;
            for j in 0..SIDES {
                let beta = j as f32 * delta;
                let x = bottom_radius * beta.sin();
                let z = -bottom_radius * beta.cos();
                part.positions.push(Vec3::new(x, -half, z));
                part.normals.push(Vec3::NEG_Y);
                part.tex_coords.push(Vec2::new(
                    x / bottom_radius / 2.0 + 0.5,
                    z / bottom_radius / 2.0 + 0.5,
                ));
            }
            for j in 1..SIDES - 1 {
                part.indices.extend([base, base + j + 1, base + j]);
            }
        }

        let mut mesh = Mesh::empty(Primitive::Triangles);
        mesh.parts.push(part);
        mesh.finished()
    }
}

/// Cylinder around the y axis, 24 radial segments.
pub struct CylinderGeometry;

impl CylinderGeometry {
    pub fn new(radius: f32, height: f32, side: bool, top: bool, bottom: bool) -> Mesh {
        const SIDES: u32 = 24;
        let delta = 2.0 * PI / SIDES as f32;
        let half = height / 2.0;

        let mut part = MeshPart::new();
        if side {
            for j in 0..=SIDES {
                let beta = j as f32 * delta;
                let x = beta.sin();
                let z = -beta.cos();
                let u = 1.0 - j as f32 / SIDES as f32;

                part.positions.push(Vec3::new(x * radius, -half, z * radius));
                part.normals.push(Vec3::new(x, 0.0, z));
                part.tex_coords.push(Vec2::new(u, 0.0));

                part.positions.push(Vec3::new(x * radius, half, z * radius));
                part.normals.push(Vec3::new(x, 0.0, z));
                part.tex_coords.push(Vec2::new(u, 1.0));

                if j > 0 {
                    let k = 2 * (j - 1);
                    part.indices.extend([k, k + 1, k + 2]);
                    part.indices.extend([k + 2, k + 1, k + 3]);
                }
            }
        }
        if radius > 0.0 {
            for (cap_up, enabled) in [(true, top), (false, bottom)] {
                if !enabled {
                    continue;
                }
                let base = part.positions.len() as u32;
                let y = if cap_up { half } else { -half };
                let n = if cap_up { Vec3::Y } else { Vec3::NEG_Y };
                for j in 0..SIDES {
                    let beta = j as f32 * delta;
                    let x = radius * beta.sin();
                    let z = -radius * beta.cos();
                    part.positions.push(Vec3::new(x, y, z));
                    part.normals.push(n);
                    part.tex_coords
                        .push(Vec2::new(x / radius / 2.0 + 0.5, z / radius / 2.0 + 0.5));
                }
                for j in 1..SIDES - 1 {
                    if cap_up {
                        part.indices.extend([base, base + j, base + j + 1]);
                    } else {
                        part.indices.extend([base, base + j + 1, base + j]);
                    }
                }
            }
        }

        let mut mesh = Mesh::empty(Primitive::Triangles);
        mesh.parts.push(part);
        mesh.finished()
    }
}

/// Torus in the xy plane, 24 rings of 24 sides.
pub struct TorusGeometry;

impl TorusGeometry {
    /// `inner_radius` is the tube radius, `outer_radius` the ring radius.
    pub fn new(inner_radius: f32, outer_radius: f32) -> Mesh {
        const RINGS: u32 = 24;
        const SIDES: u32 = 24;
        let ring_delta = 2.0 * PI / RINGS as f32;
        let side_delta = 2.0 * PI / SIDES as f32;

        let mut part = MeshPart::new();
        for a in 0..=RINGS {
            let theta = a as f32 * ring_delta;
            let (sin_t, cos_t) = theta.sin_cos();
            for b in 0..=SIDES {
                let phi = b as f32 * side_delta;
                let (sin_p, cos_p) = phi.sin_cos();
                let dist = outer_radius + inner_radius * cos_p;
                part.positions
                    .push(Vec3::new(cos_t * dist, -sin_t * dist, inner_radius * sin_p));
                part.normals
                    .push(Vec3::new(cos_t * cos_p, -sin_t * cos_p, sin_p));
                part.tex_coords.push(Vec2::new(
                    -(a as f32) / RINGS as f32,
                    b as f32 / SIDES as f32,
                ));
            }
        }
        for a in 0..RINGS {
            for b in 0..SIDES {
                let first = a * (SIDES + 1) + b;
                let second = first + SIDES + 1;
                part.indices.extend([first, second, first + 1]);
                part.indices.extend([second, second + 1, first + 1]);
            }
        }

        let mut mesh = Mesh::empty(Primitive::Triangles);
        mesh.parts.push(part);
        mesh.finished()
    }
}
