//! Procedural meshes: the lathed phalanx and the extruded palm.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use handgrid_kernel::outline::signed_area2;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Samples per arc of the phalanx profile.
pub const ARC_DIVISIONS: usize = 10;
/// Radial segments of a lathe.
pub const LATHE_SEGMENTS: usize = 12;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
        });
        index
    }

    /// Recompute normals of `vertices[range]` as area-weighted face normal sums.
    fn smooth_normals(&mut self, range: std::ops::Range<u32>) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            if !tri.iter().all(|i| range.contains(i)) {
                continue;
            }
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(self.vertices[i as usize].position));
            let n = (b - a).cross(c - a);
            for &i in tri {
                acc[i as usize] += n;
            }
        }
        for i in range {
            let n = acc[i as usize].normalize_or_zero();
            self.vertices[i as usize].normal = n.to_array();
        }
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = Vec3::from(self.vertices.first()?.position);
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            let p = Vec3::from(v.position);
            (lo.min(p), hi.max(p))
        }))
    }
}

fn arc(center: Vec2, radius: f32, from: f32, to: f32, out: &mut Vec<Vec2>) {
    let mut sweep = to - from;
    while sweep < 0.0 {
        sweep += TAU;
    }
    for i in 0..=ARC_DIVISIONS {
        let a = from + sweep * i as f32 / ARC_DIVISIONS as f32;
        out.push(center + radius * Vec2::new(a.cos(), a.sin()));
    }
}

/// Side profile of a phalanx: a base cap of radius `radius` at the origin,
/// a tangent line, and a tip cap of `0.85 * radius` at height `length`.
/// Runs bottom to top with x >= 0.
pub fn phalanx_profile(radius: f32, length: f32) -> Vec<Vec2> {
    let tip = radius * 0.85;
    let a = ((radius - tip) / length).asin();
    let mut pts = Vec::with_capacity(2 * (ARC_DIVISIONS + 1));
    arc(Vec2::ZERO, radius, PI * 1.5, a, &mut pts);
    arc(Vec2::new(0.0, length), tip, a, FRAC_PI_2, &mut pts);
    pts
}

/// Revolve a profile (x = radius, y = height) around the Y axis.
pub fn lathe(profile: &[Vec2], segments: usize) -> Mesh {
    let mut mesh = Mesh::default();
    let n = profile.len();
    if n < 2 || segments == 0 {
        return mesh;
    }
    let profile_normals: Vec<Vec2> = (0..n)
        .map(|j| {
            let prev = profile[j.saturating_sub(1)];
            let next = profile[(j + 1).min(n - 1)];
            let t = next - prev;
            Vec2::new(t.y, -t.x).normalize_or_zero()
        })
        .collect();
    for i in 0..=segments {
        let phi = i as f32 / segments as f32 * TAU;
        let (s, c) = phi.sin_cos();
        for (p, pn) in profile.iter().zip(&profile_normals) {
            mesh.push(
                Vec3::new(p.x * s, p.y, p.x * c),
                Vec3::new(pn.x * s, pn.y, pn.x * c),
            );
        }
    }
    let n = n as u32;
    for i in 0..segments as u32 {
        for j in 0..n - 1 {
            let a = j + i * n;
            let b = a + n;
            let c = b + 1;
            let d = a + 1;
            mesh.indices.extend_from_slice(&[a, b, d, c, d, b]);
        }
    }
    mesh
}

/// The shared phalanx mesh: a tapered capsule from y = -radius to
/// y = length + 0.85 * radius.
pub fn phalanx_mesh(radius: f32, length: f32) -> Mesh {
    lathe(&phalanx_profile(radius, length), LATHE_SEGMENTS)
}

/// Ear-clipping triangulation of a simple counter-clockwise polygon.
///
/// Returns index triples into `polygon`, each counter-clockwise. Stops early on
/// degenerate input instead of looping.
pub fn triangulate(polygon: &[Vec2]) -> Vec<[u32; 3]> {
    let mut remaining: Vec<usize> = (0..polygon.len()).collect();
    let mut tris = Vec::with_capacity(polygon.len().saturating_sub(2));
    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (a, b, c) = (
                polygon[remaining[(i + m - 1) % m]],
                polygon[remaining[i]],
                polygon[remaining[(i + 1) % m]],
            );
            if (b - a).perp_dot(c - b) <= 0.0 {
                return false;
            }
            !remaining.iter().any(|&k| {
                let p = polygon[k];
                p != a && p != b && p != c && inside_triangle(p, a, b, c)
            })
        });
        let Some(i) = ear else {
            tracing::warn!(left = m, "triangulation stopped on degenerate outline");
            break;
        };
        tris.push([
            remaining[(i + m - 1) % m] as u32,
            remaining[i] as u32,
            remaining[(i + 1) % m] as u32,
        ]);
        remaining.remove(i);
    }
    if remaining.len() == 3 {
        tris.push([remaining[0] as u32, remaining[1] as u32, remaining[2] as u32]);
    }
    tris
}

fn inside_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

/// Extrusion parameters for a bevelled slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrudeSettings {
    pub depth: f32,
    pub bevel_thickness: f32,
    pub bevel_size: f32,
    pub bevel_segments: usize,
}

impl Default for ExtrudeSettings {
    fn default() -> Self {
        Self {
            depth: 0.2,
            bevel_thickness: 0.8,
            bevel_size: 0.2,
            bevel_segments: 3,
        }
    }
}

/// Outward miter direction at each vertex of a counter-clockwise contour.
fn bevel_vectors(contour: &[Vec2]) -> Vec<Vec2> {
    let n = contour.len();
    (0..n)
        .map(|i| {
            let prev = contour[(i + n - 1) % n];
            let cur = contour[i];
            let next = contour[(i + 1) % n];
            let e1 = (cur - prev).normalize_or_zero();
            let e2 = (next - cur).normalize_or_zero();
            let n1 = Vec2::new(e1.y, -e1.x);
            let n2 = Vec2::new(e2.y, -e2.x);
            let bisector = (n1 + n2).normalize_or_zero();
            let cos = bisector.dot(n1).max(0.25);
            bisector / cos
        })
        .collect()
}

/// Extrude a closed outline along +Z with bevelled front and back edges.
///
/// The outline is made counter-clockwise first. Side walls get smooth
/// normals; the caps are flat, triangulated by ear clipping.
pub fn extrude(outline: &[Vec2], settings: &ExtrudeSettings) -> Mesh {
    let mut mesh = Mesh::default();
    if outline.len() < 3 {
        return mesh;
    }
    let mut contour = outline.to_vec();
    if signed_area2(&contour) < 0.0 {
        contour.reverse();
    }
    let bevels = bevel_vectors(&contour);

    // (z, offset) per ring, front to back.
    let segs = settings.bevel_segments.max(1);
    let mut rings: Vec<(f32, f32)> = Vec::new();
    for b in 0..segs {
        let t = b as f32 / segs as f32;
        rings.push((
            -settings.bevel_thickness * (t * FRAC_PI_2).cos(),
            settings.bevel_size * (t * FRAC_PI_2).sin(),
        ));
    }
    rings.push((0.0, settings.bevel_size));
    rings.push((settings.depth, settings.bevel_size));
    for b in (0..segs).rev() {
        let t = b as f32 / segs as f32;
        rings.push((
            settings.depth + settings.bevel_thickness * (t * FRAC_PI_2).cos(),
            settings.bevel_size * (t * FRAC_PI_2).sin(),
        ));
    }

    let n = contour.len() as u32;
    for &(z, offset) in &rings {
        for (p, bv) in contour.iter().zip(&bevels) {
            let q = *p + *bv * offset;
            mesh.push(Vec3::new(q.x, q.y, z), Vec3::ZERO);
        }
    }
    for r in 0..rings.len() as u32 - 1 {
        for i in 0..n {
            let a = r * n + i;
            let b = r * n + (i + 1) % n;
            let c = b + n;
            let d = a + n;
            mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
    let side_end = mesh.vertices.len() as u32;
    mesh.smooth_normals(0..side_end);

    let tris = triangulate(&contour);
    let (front_z, back_z) = (rings[0].0, rings[rings.len() - 1].0);
    let front = mesh.vertices.len() as u32;
    for p in &contour {
        mesh.push(Vec3::new(p.x, p.y, front_z), Vec3::NEG_Z);
    }
    let back = mesh.vertices.len() as u32;
    for p in &contour {
        mesh.push(Vec3::new(p.x, p.y, back_z), Vec3::Z);
    }
    for [a, b, c] in tris {
        mesh.indices.extend_from_slice(&[front + a, front + c, front + b]);
        mesh.indices.extend_from_slice(&[back + a, back + b, back + c]);
    }
    mesh
}
