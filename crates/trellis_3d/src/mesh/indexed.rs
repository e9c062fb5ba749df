//! Indexed geometry assembly.
//!
//! Polygon soup with per-attribute index streams is flattened into renderable
//! parts. When every attribute can share the coordinate index stream and the
//! coordinate count fits a 16-bit index buffer, vertices are shared
//! (single-index path). Otherwise each face corner becomes a unique vertex
//! (multi-index path) and the result is split into parts small enough for
//! 16-bit indices.

use glam::{Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use super::{Mesh, MeshPart, Primitive};
use crate::math::{BoundingBox, EPS};

/// Maximum vertices per part, so indices fit in 16 bits.
pub const MAX_PART_VERTICES: usize = 65535;

/// Texture coordinate synthesis mode, for geometry without explicit ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TexGenMode {
    /// Planar projection over the two largest bounding-box extents.
    #[default]
    Plane,
    /// Spherical projection of the normalized position.
    Sphere,
}

impl TexGenMode {
    /// Map a generator mode string; `"SPHERE"` and variants like
    /// `"SPHERE-LOCAL"` are spherical, anything else is planar.
    pub fn from_name(name: &str) -> Self {
        let mode = name.trim().as_bytes();
        if mode.get(..6).is_some_and(|p| p.eq_ignore_ascii_case(b"sphere")) {
            TexGenMode::Sphere
        } else {
            TexGenMode::Plane
        }
    }
}

/// Inputs for face-set assembly.
#[derive(Clone, Copy, Debug)]
pub struct IndexedFaceInput<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub tex_coords: &'a [Vec2],
    pub colors: &'a [Vec4],
    /// Face corners, faces separated by -1.
    pub coord_index: &'a [i32],
    pub normal_index: &'a [i32],
    pub tex_coord_index: &'a [i32],
    pub color_index: &'a [i32],
    pub normal_per_vertex: bool,
    pub color_per_vertex: bool,
    pub crease_angle: f32,
    pub tex_mode: TexGenMode,
}

impl Default for IndexedFaceInput<'_> {
    fn default() -> Self {
        Self {
            positions: &[],
            normals: &[],
            tex_coords: &[],
            colors: &[],
            coord_index: &[],
            normal_index: &[],
            tex_coord_index: &[],
            color_index: &[],
            normal_per_vertex: true,
            color_per_vertex: true,
            crease_angle: 0.0,
            tex_mode: TexGenMode::Plane,
        }
    }
}

impl IndexedFaceInput<'_> {
    /// Whether the corner-unique (multi-index) path is required.
    pub fn needs_multi_index(&self) -> bool {
        let has_normals = !self.normals.is_empty();
        let has_tex = !self.tex_coords.is_empty();
        let has_colors = !self.colors.is_empty();
        self.crease_angle <= EPS
            || self.positions.len() > MAX_PART_VERTICES
            || (has_normals && !self.normal_index.is_empty())
            || (has_tex && !self.tex_coord_index.is_empty())
            || (has_colors && !self.color_index.is_empty())
            || (has_normals && !self.normal_per_vertex)
            || (has_colors && !self.color_per_vertex)
    }
}

/// Assemble a triangle mesh from indexed faces.
pub fn build_indexed_faces(input: &IndexedFaceInput) -> Mesh {
    if input.positions.is_empty() || input.coord_index.is_empty() {
        return Mesh::empty(Primitive::Triangles);
    }
    if input.needs_multi_index() {
        build_multi_index(input)
    } else {
        build_single_index(input)
    }
}

fn build_single_index(input: &IndexedFaceInput) -> Mesh {
    let mut indices: Vec<u32> = Vec::new();
    let mut face: Vec<u32> = Vec::new();
    for &idx in input.coord_index.iter().chain(std::iter::once(&-1)) {
        if idx < 0 {
            for k in 1..face.len().saturating_sub(1) {
                indices.extend([face[0], face[k], face[k + 1]]);
            }
            face.clear();
        } else if (idx as usize) < input.positions.len() {
            face.push(idx as u32);
        }
    }

    let mut part = MeshPart::new();
    part.positions = input.positions.to_vec();
    part.normals = if input.normals.is_empty() {
        calc_normals(&part.positions, &indices, None, input.crease_angle)
    } else {
        input.normals.to_vec()
    };
    part.tex_coords = if input.tex_coords.is_empty() {
        calc_tex_coords(&part.positions, input.tex_mode)
    } else {
        input.tex_coords.to_vec()
    };
    if !input.colors.is_empty() {
        part.colors = input.colors.to_vec();
    }
    part.indices = indices;

    let mut mesh = Mesh::empty(Primitive::Triangles);
    mesh.parts.push(part);
    mesh.finished()
}

#[derive(Clone, Copy, Default)]
struct Corner {
    p: usize,
    n: usize,
    t: usize,
    c: usize,
}

fn build_multi_index(input: &IndexedFaceInput) -> Mesh {
    let has_normals = !input.normals.is_empty();
    let has_tex = !input.tex_coords.is_empty();
    let has_colors = !input.colors.is_empty();

    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut colors: Vec<Vec4> = Vec::new();
    // Original coordinate index per emitted corner, for normal smoothing.
    let mut groups: Vec<u32> = Vec::new();

    let mut face_cnt = 0usize;
    let mut fan = 0u8;
    let mut corners = [Corner::default(); 3];

    let mut emit = |c: &[Corner; 3],
                    positions: &mut Vec<Vec3>,
                    normals: &mut Vec<Vec3>,
                    tex_coords: &mut Vec<Vec2>,
                    colors: &mut Vec<Vec4>,
                    groups: &mut Vec<u32>| {
        for corner in c {
            positions.push(input.positions.get(corner.p).copied().unwrap_or(Vec3::ZERO));
            groups.push(corner.p as u32);
            if has_normals {
                normals.push(input.normals.get(corner.n).copied().unwrap_or(Vec3::Z));
            }
            if has_tex {
                tex_coords.push(input.tex_coords.get(corner.t).copied().unwrap_or(Vec2::ZERO));
            }
            if has_colors {
                colors.push(
                    input
                        .colors
                        .get(corner.c)
                        .copied()
                        .unwrap_or(Vec4::new(1.0, 1.0, 1.0, 1.0)),
                );
            }
        }
    };

    for (i, &idx) in input.coord_index.iter().enumerate() {
        if idx < 0 {
            fan = 0;
            face_cnt += 1;
            continue;
        }
        let p = idx as usize;
        let corner = Corner {
            p,
            n: attr_index(input.normal_index, input.normal_per_vertex, i, p, face_cnt),
            t: attr_index(input.tex_coord_index, true, i, p, face_cnt),
            c: attr_index(input.color_index, input.color_per_vertex, i, p, face_cnt),
        };
        match fan {
            0 => {
                corners[0] = corner;
                fan = 1;
            }
            1 => {
                corners[1] = corner;
                fan = 2;
            }
            _ => {
                if fan > 2 {
                    corners[1] = corners[2];
                }
                corners[2] = corner;
                emit(
                    &corners,
                    &mut positions,
                    &mut normals,
                    &mut tex_coords,
                    &mut colors,
                    &mut groups,
                );
                fan = 3;
            }
        }
    }

    if normals.is_empty() && !positions.is_empty() {
        let indices: Vec<u32> = (0..positions.len() as u32).collect();
        normals = calc_normals(&positions, &indices, Some(&groups), input.crease_angle);
    }
    if tex_coords.is_empty() && !positions.is_empty() {
        tex_coords = calc_tex_coords(&positions, input.tex_mode);
    }

    let mut mesh = Mesh::empty(Primitive::Triangles);
    // Corners are emitted three at a time, so chunks of 65535 (divisible by
    // three) split cleanly at triangle boundaries.
    let chunk = MAX_PART_VERTICES;
    let total = positions.len();
    let mut start = 0;
    while start < total {
        let end = (start + chunk).min(total);
        let mut part = MeshPart::new();
        part.positions = positions[start..end].to_vec();
        part.normals = normals[start..end].to_vec();
        part.tex_coords = tex_coords[start..end].to_vec();
        if !colors.is_empty() {
            part.colors = colors[start..end].to_vec();
        }
        part.indices = (0..(end - start) as u32).collect();
        mesh.parts.push(part);
        start = end;
    }
    mesh.finished()
}

/// Which entry of a secondary attribute array a corner uses.
///
/// Per-vertex attributes follow their own index stream when present, the
/// coordinate index otherwise; per-face attributes are selected by face
/// counter, through the index stream when present.
fn attr_index(
    index: &[i32],
    per_vertex: bool,
    corner_pos: usize,
    coord_idx: usize,
    face_cnt: usize,
) -> usize {
    if per_vertex {
        if index.is_empty() {
            coord_idx
        } else {
            index.get(corner_pos).copied().filter(|&v| v >= 0).unwrap_or(0) as usize
        }
    } else if index.is_empty() {
        face_cnt
    } else {
        index.get(face_cnt).copied().filter(|&v| v >= 0).unwrap_or(0) as usize
    }
}

/// Synthesize vertex normals.
///
/// Above the crease threshold, face normals are area-weight accumulated over
/// shared vertices (`groups` maps each vertex back to the coordinate it was
/// flattened from; without it the vertex index itself is the sharing key).
/// At or below the threshold every corner takes its face normal.
pub fn calc_normals(
    positions: &[Vec3],
    indices: &[u32],
    groups: Option<&[u32]>,
    crease_angle: f32,
) -> Vec<Vec3> {
    let group_of = |v: usize| -> u32 {
        groups.map(|g| g[v]).unwrap_or(v as u32)
    };
    let mut out = vec![Vec3::Z; positions.len()];
    if crease_angle > EPS {
        let mut acc: FxHashMap<u32, Vec3> = FxHashMap::default();
        for tri in indices.chunks_exact(3) {
            let (a, b, c) = (
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            );
            let fnormal = (b - a).cross(c - a);
            for &v in tri {
                *acc.entry(group_of(v as usize)).or_insert(Vec3::ZERO) += fnormal;
            }
        }
        for (v, n) in out.iter_mut().enumerate() {
            if let Some(sum) = acc.get(&group_of(v)) {
                *n = sum.normalize_or(Vec3::Z);
            }
        }
    } else {
        for tri in indices.chunks_exact(3) {
            let (a, b, c) = (
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            );
            let fnormal = (b - a).cross(c - a).normalize_or(Vec3::Z);
            for &v in tri {
                out[v as usize] = fnormal;
            }
        }
    }
    out
}

/// Synthesize texture coordinates from positions.
pub fn calc_tex_coords(positions: &[Vec3], mode: TexGenMode) -> Vec<Vec2> {
    match mode {
        TexGenMode::Sphere => positions
            .iter()
            .map(|p| {
                let n = p.normalize_or(Vec3::Z);
                Vec2::new(
                    0.5 + n.z.atan2(n.x) / (2.0 * std::f32::consts::PI),
                    0.5 - n.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI,
                )
            })
            .collect(),
        TexGenMode::Plane => {
            let bb = BoundingBox::from_points(positions);
            let ext = bb.size();
            // Project onto the two largest extents.
            let mut axes = [0usize, 1, 2];
            axes.sort_by(|&a, &b| ext[b].partial_cmp(&ext[a]).unwrap_or(std::cmp::Ordering::Equal));
            let (u_axis, v_axis) = (axes[0], axes[1]);
            positions
                .iter()
                .map(|p| {
                    let u = if ext[u_axis] > 0.0 {
                        (p[u_axis] - bb.min[u_axis]) / ext[u_axis]
                    } else {
                        0.0
                    };
                    let v = if ext[v_axis] > 0.0 {
                        (p[v_axis] - bb.min[v_axis]) / ext[v_axis]
                    } else {
                        0.0
                    };
                    Vec2::new(u, v)
                })
                .collect()
        }
    }
}

/// Inputs for line-set assembly.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexedLineInput<'a> {
    pub positions: &'a [Vec3],
    pub colors: &'a [Vec4],
    /// Polyline corners, polylines separated by -1.
    pub coord_index: &'a [i32],
    pub color_index: &'a [i32],
    pub color_per_vertex: bool,
}

/// Assemble a line mesh from indexed polylines. Vertices are corner-unique
/// so per-line colors need no special casing downstream.
pub fn build_indexed_lines(input: &IndexedLineInput) -> Mesh {
    let has_colors = !input.colors.is_empty();
    let mut part = MeshPart::new();
    let mut parts: Vec<MeshPart> = Vec::new();
    let mut line_cnt = 0usize;
    let mut prev: Option<(usize, usize)> = None; // (coord idx, position in index list)

    let chunk = MAX_PART_VERTICES - (MAX_PART_VERTICES % 2);
    for (i, &idx) in input.coord_index.iter().enumerate() {
        if idx < 0 {
            prev = None;
            line_cnt += 1;
            continue;
        }
        let cur = (idx as usize, i);
        if let Some(p) = prev {
            if part.positions.len() + 2 > chunk {
                parts.push(std::mem::take(&mut part));
            }
            for (ci, pos_in_list) in [p, cur] {
                part.positions
                    .push(input.positions.get(ci).copied().unwrap_or(Vec3::ZERO));
                if has_colors {
                    let color_idx = if input.color_per_vertex {
                        if input.color_index.is_empty() {
                            ci
                        } else {
                            input
                                .color_index
                                .get(pos_in_list)
                                .copied()
                                .filter(|&v| v >= 0)
                                .unwrap_or(0) as usize
                        }
                    } else if input.color_index.is_empty() {
                        line_cnt
                    } else {
                        input
                            .color_index
                            .get(line_cnt)
                            .copied()
                            .filter(|&v| v >= 0)
                            .unwrap_or(0) as usize
                    };
                    part.colors.push(
                        input
                            .colors
                            .get(color_idx)
                            .copied()
                            .unwrap_or(Vec4::new(1.0, 1.0, 1.0, 1.0)),
                    );
                }
                part.indices.push(part.positions.len() as u32 - 1);
            }
        }
        prev = Some(cur);
    }
    if !part.positions.is_empty() {
        parts.push(part);
    }

    let mut mesh = Mesh::empty(Primitive::Lines);
    mesh.lit = false;
    mesh.parts = parts;
    mesh.finished()
}

/// Assemble a point cloud. Colors beyond the position count are dropped.
pub fn build_point_cloud(positions: &[Vec3], colors: &[Vec4]) -> Mesh {
    let mut mesh = Mesh::empty(Primitive::Points);
    mesh.lit = false;
    let chunk = MAX_PART_VERTICES;
    let mut start = 0;
    while start < positions.len() {
        let end = (start + chunk).min(positions.len());
        let mut part = MeshPart::new();
        part.positions = positions[start..end].to_vec();
        if !colors.is_empty() {
            part.colors = colors
                .iter()
                .skip(start)
                .take(end - start)
                .copied()
                .collect();
        }
        mesh.parts.push(part);
        start = end;
    }
    mesh.finished()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_single_index_shares_vertices() {
        let positions = quad();
        let input = IndexedFaceInput {
            positions: &positions,
            coord_index: &[0, 1, 2, 3, -1],
            crease_angle: 1.0,
            ..Default::default()
        };
        assert!(!input.needs_multi_index());
        let mesh = build_indexed_faces(&input);
        assert_eq!(mesh.parts.len(), 1);
        assert_eq!(mesh.parts[0].positions.len(), 4);
        // Quad fans into two triangles
        assert_eq!(mesh.parts[0].indices, vec![0, 1, 2, 0, 2, 3]);
        // Synthesized smooth normals all face +z (ccw winding)
        for n in &mesh.parts[0].normals {
            assert!((*n - Vec3::Z).length() < 1.0e-5);
        }
    }

    #[test]
    fn test_zero_crease_forces_corner_unique() {
        let positions = quad();
        let input = IndexedFaceInput {
            positions: &positions,
            coord_index: &[0, 1, 2, 3, -1],
            crease_angle: 0.0,
            ..Default::default()
        };
        assert!(input.needs_multi_index());
        let mesh = build_indexed_faces(&input);
        // Two triangles, three unique corners each
        assert_eq!(mesh.parts[0].positions.len(), 6);
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn test_tex_index_forces_corner_unique() {
        let positions = quad();
        let tex = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        let input = IndexedFaceInput {
            positions: &positions,
            tex_coords: &tex,
            coord_index: &[0, 1, 2, -1, 0, 2, 3, -1],
            tex_coord_index: &[3, 2, 1, -1, 3, 1, 0, -1],
            crease_angle: 1.0,
            ..Default::default()
        };
        assert!(input.needs_multi_index());
        let mesh = build_indexed_faces(&input);
        assert_eq!(mesh.parts[0].positions.len(), 3 * mesh.face_count());
        assert_eq!(mesh.parts[0].tex_coords[0], Vec2::Y);
    }

    #[test]
    fn test_per_face_colors() {
        let positions = quad();
        let colors = vec![Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 1.0)];
        let input = IndexedFaceInput {
            positions: &positions,
            colors: &colors,
            coord_index: &[0, 1, 2, -1, 0, 2, 3, -1],
            color_per_vertex: false,
            crease_angle: 1.0,
            ..Default::default()
        };
        let mesh = build_indexed_faces(&input);
        let part = &mesh.parts[0];
        // First face red, second green
        assert_eq!(part.colors[0], colors[0]);
        assert_eq!(part.colors[3], colors[1]);
    }

    #[test]
    fn test_multi_index_smoothing_uses_original_coords() {
        // Two faces sharing an edge, flattened corner-unique but smoothed
        // across the shared coordinates.
        let positions = quad();
        let input = IndexedFaceInput {
            positions: &positions,
            coord_index: &[0, 1, 2, -1, 0, 2, 3, -1],
            crease_angle: 1.0,
            color_per_vertex: false,
            colors: &[Vec4::ONE, Vec4::ONE],
            ..Default::default()
        };
        let mesh = build_indexed_faces(&input);
        // Coplanar faces: all normals +z even after smoothing by group
        for n in &mesh.parts[0].normals {
            assert!((*n - Vec3::Z).length() < 1.0e-5);
        }
    }

    #[test]
    fn test_split_over_part_limit() {
        // 21846 faceted triangles flatten to 65538 corners -> two parts.
        let positions = quad();
        let mut coord_index = Vec::new();
        for _ in 0..21846 {
            coord_index.extend([0, 1, 2, -1]);
        }
        let input = IndexedFaceInput {
            positions: &positions,
            coord_index: &coord_index,
            crease_angle: 0.0,
            ..Default::default()
        };
        let mesh = build_indexed_faces(&input);
        assert_eq!(mesh.parts.len(), 2);
        assert_eq!(mesh.parts[0].positions.len(), MAX_PART_VERTICES);
        assert_eq!(mesh.parts[1].positions.len(), 3);
        assert_eq!(mesh.vertex_count(), 65538);
        for part in &mesh.parts {
            assert_eq!(part.indices.len(), part.positions.len());
        }
    }

    #[test]
    fn test_line_set_per_line_colors() {
        let positions = quad();
        let colors = vec![Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 0.0, 1.0, 1.0)];
        let input = IndexedLineInput {
            positions: &positions,
            colors: &colors,
            coord_index: &[0, 1, 2, -1, 2, 3, -1],
            color_per_vertex: false,
            ..Default::default()
        };
        let mesh = build_indexed_lines(&input);
        let part = &mesh.parts[0];
        // Three segments: two from the first polyline, one from the second
        assert_eq!(part.positions.len(), 6);
        assert_eq!(part.colors[0], colors[0]);
        assert_eq!(part.colors[4], colors[1]);
        assert!(!mesh.lit);
    }

    #[test]
    fn test_point_cloud() {
        let positions = quad();
        let mesh = build_point_cloud(&positions, &[]);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.primitive, Primitive::Points);
        assert!(!mesh.lit);
    }

    #[test]
    fn test_calc_tex_coords_plane() {
        let positions = vec![Vec3::ZERO, Vec3::new(4.0, 2.0, 0.0)];
        let tc = calc_tex_coords(&positions, TexGenMode::Plane);
        assert_eq!(tc[0], Vec2::ZERO);
        assert_eq!(tc[1], Vec2::ONE);
    }

    #[test]
    fn test_tex_gen_mode_from_name() {
        assert_eq!(TexGenMode::from_name("SPHERE"), TexGenMode::Sphere);
        assert_eq!(TexGenMode::from_name(" sphere-local "), TexGenMode::Sphere);
        assert_eq!(TexGenMode::from_name("COORD"), TexGenMode::Plane);
        assert_eq!(TexGenMode::from_name(""), TexGenMode::Plane);
    }
}
