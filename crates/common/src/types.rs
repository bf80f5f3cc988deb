use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Index of a node inside a rig arena.
///
/// Handles are only meaningful for the rig that issued them. A parent always
/// carries a smaller index than any of its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Same transform with a uniform scale factor.
    pub fn with_uniform_scale(self, scale: f32) -> Self {
        Self {
            scale: Vec3::splat(scale),
            ..self
        }
    }

    pub fn with_rotation(self, rotation: Quat) -> Self {
        Self { rotation, ..self }
    }

    /// Local-to-parent matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn uniform_scale_applies_to_all_axes() {
        let t = Transform::from_position(Vec3::new(0.0, 3.0, 0.0)).with_uniform_scale(0.85);
        assert_eq!(t.scale, Vec3::splat(0.85));
        let p = t.matrix().transform_point3(Vec3::Y);
        assert!((p.y - 3.85).abs() < 1e-6);
    }

    #[test]
    fn node_ids_order_by_index() {
        assert!(NodeId(1) < NodeId(4));
        assert_eq!(NodeId(7).index(), 7);
    }
}
