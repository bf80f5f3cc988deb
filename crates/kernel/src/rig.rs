use glam::{Mat4, Quat, Vec3};
use handgrid_common::{NodeId, Transform};

/// Offset of each child joint from its parent, along the chain axis (+Y).
pub const JOINT_SPACING: f32 = 3.0;
/// Scale of each child joint relative to its parent.
pub const JOINT_SCALE_DECAY: f32 = 0.85;
/// Joints in a regular finger chain (root included).
pub const FINGER_JOINTS: usize = 2;
/// Joints in a thumb chain (root included).
pub const THUMB_JOINTS: usize = 1;

/// Errors from rig construction and instance wiring.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RigError {
    #[error("unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("finger scale must lie in (0, 1], got {0}")]
    InvalidScale(f32),
    #[error("instance slots ({slots}) do not match joint count ({joints})")]
    SlotMismatch { joints: usize, slots: usize },
    #[error("instance slot {index} out of range (capacity {capacity})")]
    SlotOutOfRange { index: usize, capacity: usize },
}

/// What a node contributes to rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Pure transform node (hand base, thumb mount). Not instanced.
    Mount,
    /// Rotating joint. `slot` is its instance index, equal to its creation order
    /// among joints.
    Joint { slot: usize },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub local: Transform,
    pub kind: NodeKind,
    world: Mat4,
}

impl Node {
    pub fn world(&self) -> Mat4 {
        self.world
    }
}

/// Receives joint world transforms, one slot per joint.
///
/// Writes may be batched; `mark_dirty` is called once after a batch.
pub trait InstanceSink {
    fn capacity(&self) -> usize;
    fn sync_instance(&mut self, index: usize, world: Mat4) -> Result<(), RigError>;
    fn mark_dirty(&mut self);
}

/// Arena of transform nodes with integer parent links.
///
/// Nodes are appended parent-first, so a single forward pass over the arena
/// visits every parent before its children. Joints are additionally recorded
/// in a flat list whose order is the instance slot mapping.
#[derive(Debug, Clone)]
pub struct Rig {
    nodes: Vec<Node>,
    joints: Vec<NodeId>,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new("base")
    }
}

impl Rig {
    /// Create a rig holding a single root mount.
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name.to_string(),
                parent: None,
                children: Vec::new(),
                local: Transform::default(),
                kind: NodeKind::Mount,
                world: Mat4::IDENTITY,
            }],
            joints: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Joints in creation order; position in this slice is the instance slot.
    pub fn joints(&self) -> &[NodeId] {
        &self.joints
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, RigError> {
        self.nodes.get(id.0).ok_or(RigError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, RigError> {
        self.nodes.get_mut(id.0).ok_or(RigError::UnknownNode(id))
    }

    /// Add a non-instanced transform node under `parent`.
    pub fn add_mount(
        &mut self,
        parent: NodeId,
        name: &str,
        local: Transform,
    ) -> Result<NodeId, RigError> {
        self.push(parent, name, local, NodeKind::Mount)
    }

    /// Add a joint under `parent`; it takes the next instance slot.
    pub fn add_joint(
        &mut self,
        parent: NodeId,
        name: &str,
        local: Transform,
    ) -> Result<NodeId, RigError> {
        let slot = self.joints.len();
        let id = self.push(parent, name, local, NodeKind::Joint { slot })?;
        self.joints.push(id);
        Ok(id)
    }

    fn push(
        &mut self,
        parent: NodeId,
        name: &str,
        local: Transform,
        kind: NodeKind,
    ) -> Result<NodeId, RigError> {
        let parent_world = self.node(parent)?.world;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            local,
            kind,
            world: parent_world * local.matrix(),
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Build one finger chain under `parent` and return its root joint.
    ///
    /// The root carries `scale`; every further joint sits [`JOINT_SPACING`]
    /// along +Y from its parent at [`JOINT_SCALE_DECAY`] relative scale. A thumb
    /// chain has [`THUMB_JOINTS`] joints, any other finger [`FINGER_JOINTS`].
    pub fn build_finger(
        &mut self,
        parent: NodeId,
        name: &str,
        scale: f32,
        is_thumb: bool,
    ) -> Result<NodeId, RigError> {
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(RigError::InvalidScale(scale));
        }
        let root = self.add_joint(
            parent,
            &format!("{name}.0"),
            Transform::default().with_uniform_scale(scale),
        )?;
        let len = if is_thumb { THUMB_JOINTS } else { FINGER_JOINTS };
        let mut current = root;
        for i in 1..len {
            current = self.add_joint(
                current,
                &format!("{name}.{i}"),
                Transform::from_position(Vec3::new(0.0, JOINT_SPACING, 0.0))
                    .with_uniform_scale(JOINT_SCALE_DECAY),
            )?;
        }
        Ok(root)
    }

    /// Follow first children from `root` until a node without children.
    pub fn chain(&self, root: NodeId) -> Result<Vec<NodeId>, RigError> {
        let mut out = vec![root];
        let mut current = self.node(root)?;
        while let Some(&next) = current.children.first() {
            out.push(next);
            current = self.node(next)?;
        }
        Ok(out)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), RigError> {
        self.node_mut(id)?.local.position = position;
        Ok(())
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), RigError> {
        self.node_mut(id)?.local.rotation = rotation;
        Ok(())
    }

    pub fn world(&self, id: NodeId) -> Result<Mat4, RigError> {
        Ok(self.node(id)?.world)
    }

    /// Uniform world scale of a node, read back from its world matrix.
    pub fn world_scale(&self, id: NodeId) -> Result<f32, RigError> {
        let (scale, _, _) = self.node(id)?.world.to_scale_rotation_translation();
        Ok(scale.x)
    }

    /// Recompute every world transform from the root down.
    pub fn update_world(&mut self) {
        for i in 0..self.nodes.len() {
            let parent_world = match self.nodes[i].parent {
                Some(p) => self.nodes[p.0].world,
                None => Mat4::IDENTITY,
            };
            let node = &mut self.nodes[i];
            node.world = parent_world * node.local.matrix();
        }
    }

    /// Copy every joint's world transform into its slot, then mark the sink
    /// dirty once.
    pub fn sync_instances(&self, sink: &mut impl InstanceSink) -> Result<(), RigError> {
        self.check_slots(sink.capacity())?;
        for (slot, id) in self.joints.iter().enumerate() {
            sink.sync_instance(slot, self.nodes[id.0].world)?;
        }
        sink.mark_dirty();
        Ok(())
    }

    /// Verify that a sink with `slots` capacity lines up one-to-one with the joints.
    pub fn check_slots(&self, slots: usize) -> Result<(), RigError> {
        if slots != self.joints.len() {
            return Err(RigError::SlotMismatch {
                joints: self.joints.len(),
                slots,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        slots: Vec<Mat4>,
        dirty_marks: usize,
    }

    impl Recorder {
        fn new(n: usize) -> Self {
            Self {
                slots: vec![Mat4::ZERO; n],
                dirty_marks: 0,
            }
        }
    }

    impl InstanceSink for Recorder {
        fn capacity(&self) -> usize {
            self.slots.len()
        }

        fn sync_instance(&mut self, index: usize, world: Mat4) -> Result<(), RigError> {
            let capacity = self.slots.len();
            let slot = self
                .slots
                .get_mut(index)
                .ok_or(RigError::SlotOutOfRange { index, capacity })?;
            *slot = world;
            Ok(())
        }

        fn mark_dirty(&mut self) {
            self.dirty_marks += 1;
        }
    }

    #[test]
    fn thumb_chain_has_one_joint() {
        let mut rig = Rig::default();
        let root = rig.build_finger(rig.root(), "thumb", 0.75, true).unwrap();
        assert_eq!(rig.chain(root).unwrap().len(), 1);
        assert_eq!(rig.joint_count(), 1);
    }

    #[test]
    fn finger_chain_has_two_joints() {
        let mut rig = Rig::default();
        let root = rig.build_finger(rig.root(), "index", 0.95, false).unwrap();
        assert_eq!(rig.chain(root).unwrap().len(), 2);
        assert_eq!(rig.joint_count(), 2);
    }

    #[test]
    fn scale_compounds_down_the_chain() {
        let mut rig = Rig::default();
        let root = rig.build_finger(rig.root(), "middle", 0.9, false).unwrap();
        rig.update_world();
        let chain = rig.chain(root).unwrap();
        let parent = rig.world_scale(chain[0]).unwrap();
        let child = rig.world_scale(chain[1]).unwrap();
        assert!((parent - 0.9).abs() < 1e-5);
        assert!((child - parent * JOINT_SCALE_DECAY).abs() < 1e-5);
    }

    #[test]
    fn child_offset_is_scaled_by_parent() {
        let mut rig = Rig::default();
        let root = rig.build_finger(rig.root(), "ring", 0.5, false).unwrap();
        rig.update_world();
        let child = rig.chain(root).unwrap()[1];
        let (_, _, t) = rig.world(child).unwrap().to_scale_rotation_translation();
        assert!((t.y - JOINT_SPACING * 0.5).abs() < 1e-5);
    }

    #[test]
    fn invalid_scale_rejected() {
        let mut rig = Rig::default();
        let root = rig.root();
        assert_eq!(
            rig.build_finger(root, "x", 0.0, false),
            Err(RigError::InvalidScale(0.0))
        );
        assert_eq!(
            rig.build_finger(root, "x", 1.5, false),
            Err(RigError::InvalidScale(1.5))
        );
        assert_eq!(rig.joint_count(), 0);
    }

    #[test]
    fn unknown_parent_rejected() {
        let mut rig = Rig::default();
        let err = rig.add_joint(NodeId(42), "lost", Transform::default());
        assert_eq!(err, Err(RigError::UnknownNode(NodeId(42))));
    }

    #[test]
    fn joints_enumerate_parent_before_child() {
        let mut rig = Rig::default();
        let root = rig.root();
        rig.build_finger(root, "a", 1.0, false).unwrap();
        rig.build_finger(root, "b", 1.0, true).unwrap();
        let joints = rig.joints().to_vec();
        for (slot, id) in joints.iter().enumerate() {
            let node = rig.node(*id).unwrap();
            assert_eq!(node.kind, NodeKind::Joint { slot });
            if let Some(parent) = node.parent {
                assert!(parent < *id);
            }
        }
    }

    #[test]
    fn parent_rotation_moves_children() {
        let mut rig = Rig::default();
        let root = rig.root();
        let finger = rig.build_finger(root, "a", 1.0, false).unwrap();
        let tip = rig.chain(finger).unwrap()[1];
        rig.set_rotation(finger, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2))
            .unwrap();
        rig.update_world();
        let (_, _, t) = rig.world(tip).unwrap().to_scale_rotation_translation();
        // +Y rotated a quarter turn about X lands on +Z.
        assert!(t.y.abs() < 1e-5);
        assert!((t.z - JOINT_SPACING).abs() < 1e-5);
    }

    #[test]
    fn sync_marks_dirty_once_per_batch() {
        let mut rig = Rig::default();
        let root = rig.root();
        rig.build_finger(root, "a", 1.0, false).unwrap();
        rig.update_world();
        let mut sink = Recorder::new(2);
        rig.sync_instances(&mut sink).unwrap();
        assert_eq!(sink.dirty_marks, 1);
        assert_eq!(sink.slots[0], rig.world(rig.joints()[0]).unwrap());
        assert_eq!(sink.slots[1], rig.world(rig.joints()[1]).unwrap());
    }

    #[test]
    fn sync_rejects_mismatched_sink() {
        let mut rig = Rig::default();
        let root = rig.root();
        rig.build_finger(root, "a", 1.0, false).unwrap();
        let mut sink = Recorder::new(3);
        assert_eq!(
            rig.sync_instances(&mut sink),
            Err(RigError::SlotMismatch {
                joints: 2,
                slots: 3
            })
        );
        assert_eq!(sink.dirty_marks, 0);
    }
}
