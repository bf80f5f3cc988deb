use crate::rig::{Rig, RigError};
use glam::{EulerRot, Quat, Vec3};
use handgrid_common::{NodeId, Transform};
use serde::{Deserialize, Serialize};

/// One finger of a [`HandLayout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerSpec {
    pub name: String,
    /// Uniform scale of the finger's root joint, in (0, 1].
    pub scale: f32,
    #[serde(default)]
    pub is_thumb: bool,
    /// Root joint position relative to its parent (the mount if any, else the base).
    #[serde(default)]
    pub knuckle: Vec3,
    /// Optional extra mounting node between the base and the finger.
    #[serde(default)]
    pub mount: Option<MountSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountSpec {
    pub position: Vec3,
    /// Rotation about Z in degrees.
    pub roll_degrees: f32,
}

impl MountSpec {
    pub fn transform(&self) -> Transform {
        Transform::from_position(self.position)
            .with_rotation(Quat::from_rotation_z(self.roll_degrees.to_radians()))
    }
}

/// Ordered finger list. Build order is instance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLayout {
    pub fingers: Vec<FingerSpec>,
}

impl Default for HandLayout {
    /// Pinky, ring, middle, index, then the thumb on a tilted mount.
    fn default() -> Self {
        let finger = |name: &str, scale: f32, x: f32| FingerSpec {
            name: name.to_string(),
            scale,
            is_thumb: false,
            knuckle: Vec3::new(x, 0.2, 0.0),
            mount: None,
        };
        Self {
            fingers: vec![
                finger("pinky", 0.8, -4.0),
                finger("ring", 0.95, -2.0),
                finger("middle", 1.0, 0.0),
                finger("index", 0.95, 2.0),
                FingerSpec {
                    name: "thumb".to_string(),
                    scale: 0.75,
                    is_thumb: true,
                    knuckle: Vec3::ZERO,
                    mount: Some(MountSpec {
                        position: Vec3::new(3.0, -3.0, 0.0),
                        roll_degrees: -60.0,
                    }),
                },
            ],
        }
    }
}

/// A built hand: the rig plus handles to its base and finger roots.
#[derive(Debug, Clone)]
pub struct Hand {
    pub rig: Rig,
    pub base: NodeId,
    pub fingers: Vec<NodeId>,
}

impl Hand {
    /// Build the joint hierarchy for `layout` and compute initial world transforms.
    pub fn build(layout: &HandLayout) -> Result<Self, RigError> {
        let mut rig = Rig::new("base");
        let base = rig.root();
        let mut fingers = Vec::with_capacity(layout.fingers.len());
        for spec in &layout.fingers {
            let parent = match &spec.mount {
                Some(mount) => {
                    rig.add_mount(base, &format!("{}.mount", spec.name), mount.transform())?
                }
                None => base,
            };
            let root = rig.build_finger(parent, &spec.name, spec.scale, spec.is_thumb)?;
            rig.set_position(root, spec.knuckle)?;
            fingers.push(root);
        }
        rig.update_world();
        tracing::info!(
            fingers = fingers.len(),
            joints = rig.joint_count(),
            "hand rig built"
        );
        Ok(Self { rig, base, fingers })
    }

    pub fn joint_count(&self) -> usize {
        self.rig.joint_count()
    }
}

/// Slow idle rotation of the whole hand assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdleSpin {
    /// Angular rate in radians per second.
    pub rate: f32,
}

impl Default for IdleSpin {
    fn default() -> Self {
        Self { rate: 0.125 }
    }
}

impl IdleSpin {
    /// Base rotation at elapsed time `t` (seconds): a slow pitch between 0 and
    /// -π/2 combined with a steady yaw, in XYZ order.
    pub fn rotation_at(&self, t: f32) -> Quat {
        let pitch = ((t * self.rate).sin() * 0.5 + 0.5) * -std::f32::consts::FRAC_PI_2;
        let yaw = -t * self.rate;
        Quat::from_euler(EulerRot::XYZ, pitch, yaw, 0.0)
    }

    pub fn apply(&self, t: f32, hand: &mut Hand) -> Result<(), RigError> {
        hand.rig.set_rotation(hand.base, self.rotation_at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hand_has_nine_joints() {
        let hand = Hand::build(&HandLayout::default()).unwrap();
        assert_eq!(hand.fingers.len(), 5);
        assert_eq!(hand.joint_count(), 2 + 2 + 2 + 2 + 1);
    }

    #[test]
    fn fingers_enumerate_pinky_to_thumb() {
        let hand = Hand::build(&HandLayout::default()).unwrap();
        let names: Vec<&str> = hand
            .rig
            .joints()
            .iter()
            .map(|id| hand.rig.node(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "pinky.0", "pinky.1", "ring.0", "ring.1", "middle.0", "middle.1", "index.0",
                "index.1", "thumb.0"
            ]
        );
    }

    #[test]
    fn thumb_sits_under_rotated_mount() {
        let hand = Hand::build(&HandLayout::default()).unwrap();
        let thumb = hand.fingers[4];
        let mount = hand.rig.node(thumb).unwrap().parent.unwrap();
        assert_ne!(mount, hand.base);
        let (_, _, t) = hand
            .rig
            .world(thumb)
            .unwrap()
            .to_scale_rotation_translation();
        assert!((t - Vec3::new(3.0, -3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn knuckles_are_placed() {
        let hand = Hand::build(&HandLayout::default()).unwrap();
        let (_, _, t) = hand
            .rig
            .world(hand.fingers[0])
            .unwrap()
            .to_scale_rotation_translation();
        assert!((t - Vec3::new(-4.0, 0.2, 0.0)).length() < 1e-5);
    }

    #[test]
    fn empty_layout_builds_empty_rig() {
        let hand = Hand::build(&HandLayout { fingers: vec![] }).unwrap();
        assert_eq!(hand.joint_count(), 0);
    }

    #[test]
    fn idle_spin_starts_half_pitched() {
        let q = IdleSpin::default().rotation_at(0.0);
        let (x, y, _) = q.to_euler(EulerRot::XYZ);
        assert!((x + std::f32::consts::FRAC_PI_4).abs() < 1e-5);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn idle_spin_pitch_stays_in_quarter_turn() {
        let spin = IdleSpin::default();
        for i in 0..200 {
            let t = i as f32 * 0.7;
            let pitch = ((t * spin.rate).sin() * 0.5 + 0.5) * -std::f32::consts::FRAC_PI_2;
            assert!(pitch <= 0.0 && pitch >= -std::f32::consts::FRAC_PI_2);
        }
    }
}
