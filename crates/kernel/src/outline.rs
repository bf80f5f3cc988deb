//! Closed Catmull-Rom outline for the palm.

use glam::Vec2;

/// Palm control points, in the hand base's XY plane.
pub const PALM_CONTROL_POINTS: [Vec2; 5] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(3.0, 0.0),
    Vec2::new(2.5, -7.0),
    Vec2::new(-4.0, -6.0),
    Vec2::new(-4.8, 0.0),
];
pub const PALM_TENSION: f32 = 0.1;
pub const PALM_DIVISIONS: usize = 50;

/// Interpolating cubic spline through its control points.
///
/// Uses the non-centripetal Catmull-Rom form with an explicit tension: tangents
/// at each point are `tension * (next - prev)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatmullRom {
    points: Vec<Vec2>,
    closed: bool,
    tension: f32,
}

impl CatmullRom {
    pub fn new(points: Vec<Vec2>, closed: bool, tension: f32) -> Self {
        Self {
            points,
            closed,
            tension,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Point at parameter `t` in [0, 1].
    pub fn point_at(&self, t: f32) -> Vec2 {
        let n = self.points.len();
        match n {
            0 => return Vec2::ZERO,
            1 => return self.points[0],
            _ => {}
        }
        let segments = if self.closed { n } else { n - 1 };
        let p = segments as f32 * t.clamp(0.0, 1.0);
        let mut seg = p.floor() as isize;
        let mut weight = p - seg as f32;
        if !self.closed && seg as usize >= segments {
            seg = segments as isize - 1;
            weight = 1.0;
        }
        let at = |i: isize| -> Vec2 {
            if self.closed {
                self.points[i.rem_euclid(n as isize) as usize]
            } else {
                let clamped = i.clamp(0, n as isize - 1) as usize;
                self.points[clamped]
            }
        };
        let (p0, p1, p2, p3) = (at(seg - 1), at(seg), at(seg + 1), at(seg + 2));
        let t0 = (p2 - p0) * self.tension;
        let t1 = (p3 - p1) * self.tension;
        hermite(p1, p2, t0, t1, weight)
    }

    /// `divisions + 1` evenly parameterised samples, both ends included.
    pub fn sample(&self, divisions: usize) -> Vec<Vec2> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point_at(i as f32 / divisions as f32))
            .collect()
    }
}

fn hermite(x0: Vec2, x1: Vec2, t0: Vec2, t1: Vec2, w: f32) -> Vec2 {
    let c0 = x0;
    let c1 = t0;
    let c2 = -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1;
    let c3 = 2.0 * x0 - 2.0 * x1 + t0 + t1;
    c0 + c1 * w + c2 * (w * w) + c3 * (w * w * w)
}

/// Sampled palm outline. The closing duplicate point is dropped.
pub fn palm_outline() -> Vec<Vec2> {
    let curve = CatmullRom::new(PALM_CONTROL_POINTS.to_vec(), true, PALM_TENSION);
    let mut pts = curve.sample(PALM_DIVISIONS);
    if pts.len() > 1 && pts[0].distance(pts[pts.len() - 1]) < 1e-6 {
        pts.pop();
    }
    pts
}

/// Twice the signed area; positive for counter-clockwise polygons.
pub fn signed_area2(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum()
}
