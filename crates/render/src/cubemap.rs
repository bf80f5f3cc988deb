//! Procedural noise faces for the reflective environment map.

use rand::Rng;

/// Edge length of each cube face, in pixels.
pub const CUBE_FACE_SIZE: u32 = 4;
pub const CUBE_FACES: usize = 6;

/// One square RGBA8 face, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeFace {
    pub size: u32,
    pub pixels: Vec<u8>,
}

impl CubeFace {
    fn filled(size: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((size * size * 4) as usize)
            .collect();
        Self { size, pixels }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.size + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Fill a `w` x `h` rectangle, clipped to the face.
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
        for py in y..(y + h).min(self.size) {
            for px in x..(x + w).min(self.size) {
                let i = ((py * self.size + px) * 4) as usize;
                self.pixels[i..i + 4].copy_from_slice(&color);
            }
        }
    }
}

/// Six faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeMapImages {
    pub faces: Vec<CubeFace>,
}

impl CubeMapImages {
    pub fn face_size(&self) -> u32 {
        self.faces.first().map_or(0, |f| f.size)
    }

    /// All faces back to back, as a six-layer texture upload expects.
    pub fn layer_bytes(&self) -> Vec<u8> {
        self.faces
            .iter()
            .flat_map(|f| f.pixels.iter().copied())
            .collect()
    }
}

/// Stippled two-accent noise on a solid base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeMapGenerator {
    pub size: u32,
    pub base: [u8; 4],
    pub accents: [[u8; 4]; 2],
}

impl Default for CubeMapGenerator {
    fn default() -> Self {
        Self {
            size: CUBE_FACE_SIZE,
            base: [0xff, 0xff, 0xff, 0xff],
            accents: [[0xff, 0x00, 0xff, 0xff], [0x44, 0x00, 0xff, 0xff]],
        }
    }
}

impl CubeMapGenerator {
    /// Generate from the thread-local RNG; every call differs.
    pub fn generate(&self) -> CubeMapImages {
        self.generate_with(&mut rand::rng())
    }

    /// Each face gets `size * size / 2` strokes of 2x1 pixels at uniform
    /// random positions, each in one of the two accents chosen uniformly.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> CubeMapImages {
        let size = self.size.max(1);
        let strokes = size * size / 2;
        let faces = (0..CUBE_FACES)
            .map(|_| {
                let mut face = CubeFace::filled(size, self.base);
                for _ in 0..strokes {
                    let color = if rng.random_bool(0.5) {
                        self.accents[0]
                    } else {
                        self.accents[1]
                    };
                    let x = rng.random_range(0..size);
                    let y = rng.random_range(0..size);
                    face.fill_rect(x, y, 2, 1, color);
                }
                face
            })
            .collect();
        tracing::debug!(size, strokes, "cube map faces generated");
        CubeMapImages { faces }
    }
}
