/// Global scene clock, advanced once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by `dt` seconds (negative deltas are ignored) and return the
    /// elapsed time.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt.max(0.0) as f64;
        self.frames += 1;
        self.elapsed()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
