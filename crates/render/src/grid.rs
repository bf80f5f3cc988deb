use crate::error::RenderError;
use bytemuck::{Pod, Zeroable};

/// Moveable flag pattern per line pair: the X-parallel line's two endpoints
/// scroll, the Z-parallel line's two endpoints stay put.
pub const MOVEABLE_PATTERN: [f32; 4] = [1.0, 1.0, 0.0, 0.0];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Line-list grid in the XZ plane plus its per-vertex moveable flags.
#[derive(Debug, Clone)]
pub struct GridMesh {
    pub vertices: Vec<GridVertex>,
    pub moveable: Vec<f32>,
}

impl GridMesh {
    /// `divisions + 1` lines along each axis spanning `[-size/2, size/2]`.
    ///
    /// Vertices come in blocks of four per division step: two endpoints of the
    /// line parallel to X at `z = k`, then two of the line parallel to Z at
    /// `x = k`. The centre lines take `center_color`.
    pub fn lines(
        size: f32,
        divisions: u32,
        center_color: [f32; 4],
        color: [f32; 4],
    ) -> Result<Self, RenderError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(RenderError::InvalidGridSize(size));
        }
        if divisions == 0 {
            return Err(RenderError::NoGridDivisions);
        }
        let half = size / 2.0;
        let step = size / divisions as f32;
        let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
        for i in 0..=divisions {
            let k = -half + i as f32 * step;
            let c = if 2 * i == divisions { center_color } else { color };
            // Lines along X
            vertices.push(GridVertex {
                position: [-half, 0.0, k],
                color: c,
            });
            vertices.push(GridVertex {
                position: [half, 0.0, k],
                color: c,
            });
            // Lines along Z
            vertices.push(GridVertex {
                position: [k, 0.0, -half],
                color: c,
            });
            vertices.push(GridVertex {
                position: [k, 0.0, half],
                color: c,
            });
        }
        let moveable = vec![0.0; vertices.len()];
        Ok(Self { vertices, moveable })
    }

    /// Flag X-parallel lines as scrolling.
    pub fn scrolling(mut self) -> Self {
        self.moveable = MOVEABLE_PATTERN
            .iter()
            .copied()
            .cycle()
            .take(self.vertices.len())
            .collect();
        self
    }

    /// Raise every vertex by `y`.
    pub fn lifted(mut self, y: f32) -> Self {
        for v in &mut self.vertices {
            v.position[1] += y;
        }
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Scalars shared by the grid vertex stage and the frame loop.
///
/// `time` is written once per frame; `speed` and `size` are fixed at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridUniforms {
    pub time: f32,
    pub speed: f32,
    size: f32,
}

/// GPU layout of [`GridUniforms`], padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridUniformsRaw {
    pub time: f32,
    pub speed: f32,
    pub size: f32,
    pub _pad: f32,
}

impl GridUniforms {
    pub fn new(speed: f32, size: f32) -> Result<Self, RenderError> {
        if !(size.is_finite() && size > 0.0) {
            return Err(RenderError::InvalidGridSize(size));
        }
        Ok(Self {
            time: 0.0,
            speed,
            size,
        })
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn raw(&self) -> GridUniformsRaw {
        GridUniformsRaw {
            time: self.time,
            speed: self.speed,
            size: self.size,
            _pad: 0.0,
        }
    }

    /// CPU mirror of the patched vertex stage: wrap a moveable vertex's Z into
    /// `[-size/2, size/2)` after scrolling by `time * speed`. Other vertices
    /// pass through untouched.
    pub fn scroll_z(&self, z: f32, moveable: f32) -> f32 {
        if (moveable + 0.1).floor() <= 0.5 {
            return z;
        }
        let start = -self.size * 0.5;
        let shifted = (z - start) + self.time * self.speed;
        let mut wrapped = shifted - self.size * (shifted / self.size).floor();
        // Rounding at the seam can land on `size` or just below zero.
        if !(0.0..self.size).contains(&wrapped) {
            wrapped = 0.0;
        }
        wrapped + start
    }
}
