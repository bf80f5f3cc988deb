use crate::rig::{InstanceSink, Rig, RigError};
use crate::tween::{Easing, Repeat, Tween};
use glam::Quat;
use std::f32::consts::PI;
use std::time::Duration;

/// Curl angle at the open end of the cycle (radians).
pub const CURL_OPEN: f32 = PI * 0.075;
/// Curl angle at the closed end of the cycle (radians).
pub const CURL_CLOSED: f32 = PI * 0.45;
/// Duration of one direction of the curl cycle.
pub const CURL_HALF_PERIOD: Duration = Duration::from_millis(4000);

/// Drives every joint's X rotation from one oscillating tween.
///
/// Each tick writes the curl angle into the joints, recomputes world
/// transforms top-down and copies them into the instance sink. With a zero
/// phase step all joints share one angle; a positive step delays joint `i` by
/// `i * phase_step` seconds.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    tween: Tween,
    phase_step: f32,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::curl()
    }
}

impl AnimationDriver {
    pub fn new(tween: Tween) -> Self {
        Self {
            tween,
            phase_step: 0.0,
        }
    }

    /// The standard open/close cycle: quadratic in-out, yoyo, forever.
    pub fn curl() -> Self {
        Self::new(
            Tween::new(CURL_OPEN, CURL_CLOSED, CURL_HALF_PERIOD)
                .easing(Easing::QuadraticInOut)
                .repeat(Repeat::Forever)
                .yoyo(true),
        )
    }

    pub fn with_phase_step(mut self, seconds: f32) -> Self {
        self.phase_step = seconds;
        self
    }

    pub fn set_phase_step(&mut self, seconds: f32) {
        self.phase_step = seconds;
    }

    pub fn phase_step(&self) -> f32 {
        self.phase_step
    }

    pub fn tween(&self) -> &Tween {
        &self.tween
    }

    /// Current shared curl angle (the angle of joint 0).
    pub fn angle(&self) -> f32 {
        self.tween.value()
    }

    /// Angle for the joint in instance slot `slot`.
    pub fn angle_for(&self, slot: usize) -> f32 {
        self.tween
            .sample(self.tween.elapsed() - slot as f32 * self.phase_step)
    }

    /// Advance by `dt` seconds and push the new pose into `sink`.
    pub fn tick(
        &mut self,
        dt: f32,
        rig: &mut Rig,
        sink: &mut impl InstanceSink,
    ) -> Result<f32, RigError> {
        self.tween.advance(dt);
        self.apply(rig, sink)?;
        Ok(self.angle())
    }

    /// Write the current pose into `rig` and `sink` without advancing time.
    pub fn apply(&self, rig: &mut Rig, sink: &mut impl InstanceSink) -> Result<(), RigError> {
        rig.check_slots(sink.capacity())?;
        for slot in 0..rig.joint_count() {
            let id = rig.joints()[slot];
            rig.set_rotation(id, Quat::from_rotation_x(self.angle_for(slot)))?;
        }
        rig.update_world();
        rig.sync_instances(sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{Hand, HandLayout};
    use glam::{EulerRot, Mat4};

    #[derive(Default)]
    struct Slots {
        worlds: Vec<Mat4>,
        dirty: usize,
    }

    impl InstanceSink for Slots {
        fn capacity(&self) -> usize {
            self.worlds.len()
        }

        fn sync_instance(&mut self, index: usize, world: Mat4) -> Result<(), RigError> {
            let capacity = self.worlds.len();
            *self
                .worlds
                .get_mut(index)
                .ok_or(RigError::SlotOutOfRange { index, capacity })? = world;
            Ok(())
        }

        fn mark_dirty(&mut self) {
            self.dirty += 1;
        }
    }

    fn setup() -> (Hand, Slots) {
        let hand = Hand::build(&HandLayout::default()).unwrap();
        let slots = Slots {
            worlds: vec![Mat4::ZERO; hand.joint_count()],
            dirty: 0,
        };
        (hand, slots)
    }

    #[test]
    fn angle_stays_in_range() {
        let (mut hand, mut slots) = setup();
        let mut driver = AnimationDriver::curl();
        for _ in 0..1000 {
            let a = driver.tick(0.037, &mut hand.rig, &mut slots).unwrap();
            assert!(a >= CURL_OPEN - 1e-5 && a <= CURL_CLOSED + 1e-5);
        }
    }

    #[test]
    fn all_joints_share_one_angle_by_default() {
        let (mut hand, mut slots) = setup();
        let mut driver = AnimationDriver::curl();
        driver.tick(1.3, &mut hand.rig, &mut slots).unwrap();
        let expected = driver.angle();
        for id in hand.rig.joints() {
            let rot = hand.rig.node(*id).unwrap().local.rotation;
            let (x, _, _) = rot.to_euler(EulerRot::XYZ);
            assert!((x - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn phase_step_delays_later_joints() {
        let mut driver = AnimationDriver::curl().with_phase_step(0.25);
        let (mut hand, mut slots) = setup();
        driver.tick(1.0, &mut hand.rig, &mut slots).unwrap();
        assert!(driver.angle_for(0) > driver.angle_for(1));
        assert!((driver.angle_for(4) - driver.tween().sample(0.0)).abs() < 1e-6);
    }

    #[test]
    fn tick_syncs_every_slot_and_marks_dirty_once() {
        let (mut hand, mut slots) = setup();
        let mut driver = AnimationDriver::curl();
        driver.tick(0.5, &mut hand.rig, &mut slots).unwrap();
        assert_eq!(slots.dirty, 1);
        for (slot, id) in hand.rig.joints().iter().enumerate() {
            assert_eq!(slots.worlds[slot], hand.rig.world(*id).unwrap());
        }
    }

    #[test]
    fn repeated_ticks_keep_capacity() {
        let (mut hand, mut slots) = setup();
        let mut driver = AnimationDriver::curl();
        for _ in 0..10 {
            driver.tick(0.016, &mut hand.rig, &mut slots).unwrap();
        }
        assert_eq!(slots.worlds.len(), 9);
        assert_eq!(slots.dirty, 10);
    }

    #[test]
    fn mismatched_sink_is_reported() {
        let (mut hand, _) = setup();
        let mut short = Slots {
            worlds: vec![Mat4::ZERO; 4],
            dirty: 0,
        };
        let err = AnimationDriver::curl()
            .tick(0.1, &mut hand.rig, &mut short)
            .unwrap_err();
        assert_eq!(err, RigError::SlotMismatch { joints: 9, slots: 4 });
    }

    #[test]
    fn curl_keeps_moving_after_long_uptime() {
        let (mut hand, mut slots) = setup();
        let mut driver = AnimationDriver::curl().with_phase_step(0.1);
        driver.tick(1_048_577.0, &mut hand.rig, &mut slots).unwrap();
        let start = driver.angle();
        let (mut lo, mut hi) = (start, start);
        for _ in 0..600 {
            let a = driver.tick(1.0 / 60.0, &mut hand.rig, &mut slots).unwrap();
            lo = lo.min(a);
            hi = hi.max(a);
        }
        assert!(hi - lo > 0.1, "curl range {}", hi - lo);
        assert!(driver.angle_for(0) != driver.angle_for(8));
    }

    #[test]
    fn curl_period_is_eight_seconds() {
        let driver = AnimationDriver::curl();
        assert!((driver.tween().period() - 8.0).abs() < 1e-6);
        assert!((driver.tween().sample(0.0) - CURL_OPEN).abs() < 1e-6);
        assert!((driver.tween().sample(4.0) - CURL_CLOSED).abs() < 1e-6);
    }
}
