//! Scalar tweening: easing curves, repeat and yoyo.
//!
//! A [`Tween`] owns its own clock. Values are a pure function of accumulated
//! time, so sampling at any time (including negative phase offsets) is stable.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    QuadraticIn,
    QuadraticOut,
    #[default]
    QuadraticInOut,
    CubicInOut,
}

impl Easing {
    /// Map progress `k` in [0, 1] to eased progress in [0, 1].
    pub fn apply(self, k: f32) -> f32 {
        let k = k.clamp(0.0, 1.0);
        match self {
            Easing::Linear => k,
            Easing::QuadraticIn => k * k,
            Easing::QuadraticOut => k * (2.0 - k),
            Easing::QuadraticInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k * k
                } else {
                    let k = k - 1.0;
                    -0.5 * (k * (k - 2.0) - 1.0)
                }
            }
            Easing::CubicInOut => {
                let k = k * 2.0;
                if k < 1.0 {
                    0.5 * k * k * k
                } else {
                    let k = k - 2.0;
                    0.5 * (k * k * k + 2.0)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// Play `n` extra passes after the first.
    Count(u32),
    Forever,
}

/// One eased interpolation between two scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    easing: Easing,
    repeat: Repeat,
    yoyo: bool,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::Linear,
            repeat: Repeat::Count(0),
            yoyo: false,
            elapsed: 0.0,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn from_value(&self) -> f32 {
        self.from
    }

    pub fn to_value(&self) -> f32 {
        self.to
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Seconds of tween time consumed so far. Endless tweens report the
    /// offset into their current period.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Full period in seconds (one pass, or there and back when yoyo-ing).
    pub fn period(&self) -> f32 {
        let pass = self.duration.as_secs_f32();
        if self.yoyo { pass * 2.0 } else { pass }
    }

    pub fn is_finished(&self) -> bool {
        match self.repeat {
            Repeat::Forever => false,
            Repeat::Count(n) => {
                self.elapsed >= self.duration.as_secs_f32() * (n as f32 + 1.0)
            }
        }
    }

    /// Advance the tween clock by `dt` seconds and return the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt.max(0.0);
        let period = self.period();
        if self.repeat == Repeat::Forever && period > 0.0 {
            // Keep the clock small so a frame's dt never rounds away.
            self.elapsed = self.elapsed.rem_euclid(period);
        }
        self.value()
    }

    pub fn value(&self) -> f32 {
        self.sample(self.elapsed)
    }

    /// Value at tween time `t` seconds.
    pub fn sample(&self, t: f32) -> f32 {
        let pass = self.duration.as_secs_f32();
        if pass <= 0.0 {
            return self.to;
        }
        let mut pass_index = (t / pass).floor();
        let mut progress = t / pass - pass_index;
        if let Repeat::Count(n) = self.repeat {
            let last = n as f32;
            if pass_index < 0.0 {
                pass_index = 0.0;
                progress = 0.0;
            } else if pass_index > last {
                pass_index = last;
                progress = 1.0;
            }
        }
        let reversed = self.yoyo && (pass_index as i64).rem_euclid(2) == 1;
        let eased = self.easing.apply(progress);
        if reversed {
            self.to + (self.from - self.to) * eased
        } else {
            self.from + (self.to - self.from) * eased
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curl() -> Tween {
        Tween::new(0.0, 1.0, Duration::from_millis(4000))
            .easing(Easing::QuadraticInOut)
            .repeat(Repeat::Forever)
            .yoyo(true)
    }

    #[test]
    fn easings_fix_endpoints() {
        for e in [
            Easing::Linear,
            Easing::QuadraticIn,
            Easing::QuadraticOut,
            Easing::QuadraticInOut,
            Easing::CubicInOut,
        ] {
            assert!(e.apply(0.0).abs() < 1e-6, "{e:?}");
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{e:?}");
        }
    }

    #[test]
    fn in_out_is_symmetric() {
        for i in 0..=20 {
            let k = i as f32 / 20.0;
            let e = Easing::QuadraticInOut;
            assert!((e.apply(k) + e.apply(1.0 - k) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn yoyo_visits_both_ends() {
        let t = curl();
        assert!(t.sample(0.0).abs() < 1e-6);
        assert!((t.sample(4.0) - 1.0).abs() < 1e-6);
        assert!(t.sample(8.0).abs() < 1e-6);
        assert!((t.sample(12.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn yoyo_period_is_there_and_back() {
        let t = curl();
        assert!((t.period() - 8.0).abs() < 1e-6);
        for i in 0..50 {
            let s = i as f32 * 0.31;
            assert!((t.sample(s) - t.sample(s + 8.0)).abs() < 1e-4);
        }
    }

    #[test]
    fn yoyo_is_continuous_at_turnaround() {
        let t = curl();
        let before = t.sample(4.0 - 1e-3);
        let after = t.sample(4.0 + 1e-3);
        assert!((before - after).abs() < 1e-3);
    }

    #[test]
    fn finite_repeat_holds_final_value() {
        let mut t = Tween::new(2.0, 4.0, Duration::from_secs(1)).repeat(Repeat::Count(1));
        t.advance(5.0);
        assert!(t.is_finished());
        assert!((t.value() - 4.0).abs() < 1e-6);
        assert!((t.sample(-1.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn advance_ignores_negative_dt() {
        let mut t = curl();
        t.advance(1.0);
        t.advance(-3.0);
        assert!((t.elapsed() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn endless_tween_keeps_moving_after_long_uptime() {
        let mut t = curl();
        t.advance(1_048_577.0);
        assert!(t.elapsed() < t.period());
        let start = t.value();
        let (mut lo, mut hi) = (start, start);
        for _ in 0..600 {
            let v = t.advance(1.0 / 60.0);
            lo = lo.min(v);
            hi = hi.max(v);
        }
        assert!(hi - lo > 0.1, "range {}", hi - lo);
    }

    #[test]
    fn endless_wrap_preserves_phase() {
        let mut wrapped = curl();
        wrapped.advance(8.0 * 1000.0 + 1.5);
        assert!((wrapped.value() - curl().sample(1.5)).abs() < 1e-3);
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let t = Tween::new(0.0, 3.0, Duration::ZERO);
        assert_eq!(t.sample(0.0), 3.0);
    }
}
