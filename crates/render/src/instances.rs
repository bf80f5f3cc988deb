use glam::Mat4;
use handgrid_kernel::{InstanceSink, RigError};

/// Fixed-size array of per-instance world transforms sharing one material.
///
/// Capacity is set at construction and never changes. Writes land in CPU
/// memory; `mark_dirty` bumps a generation counter that backends compare
/// against the generation they last uploaded.
#[derive(Debug, Clone)]
pub struct InstanceBuffer {
    label: String,
    transforms: Vec<Mat4>,
    color: [f32; 4],
    generation: u64,
}

impl InstanceBuffer {
    /// Allocate `count` identity slots. `count == 0` is a valid, empty buffer.
    pub fn new(label: &str, count: usize, color: [f32; 4]) -> Self {
        Self {
            label: label.to_string(),
            transforms: vec![Mat4::IDENTITY; count],
            color,
            generation: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn get(&self, index: usize) -> Option<Mat4> {
        self.transforms.get(index).copied()
    }

    /// Incremented by every `mark_dirty`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Column-major matrices, one per slot, ready for upload.
    pub fn columns(&self) -> impl Iterator<Item = [[f32; 4]; 4]> + '_ {
        self.transforms.iter().map(|m| m.to_cols_array_2d())
    }
}

impl InstanceSink for InstanceBuffer {
    fn capacity(&self) -> usize {
        self.transforms.len()
    }

    fn sync_instance(&mut self, index: usize, world: Mat4) -> Result<(), RigError> {
        let capacity = self.transforms.len();
        let slot = self
            .transforms
            .get_mut(index)
            .ok_or(RigError::SlotOutOfRange { index, capacity })?;
        *slot = world;
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use handgrid_kernel::{AnimationDriver, Hand, HandLayout};

    #[test]
    fn empty_buffer_is_valid() {
        let mut buf = InstanceBuffer::new("empty", 0, [1.0; 4]);
        assert!(buf.is_empty());
        assert_eq!(buf.columns().count(), 0);
        buf.mark_dirty();
        assert_eq!(buf.generation(), 1);
    }

    #[test]
    fn out_of_range_write_is_rejected() {
        let mut buf = InstanceBuffer::new("two", 2, [1.0; 4]);
        let err = buf.sync_instance(2, Mat4::IDENTITY).unwrap_err();
        assert_eq!(err, RigError::SlotOutOfRange { index: 2, capacity: 2 });
    }

    #[test]
    fn writes_do_not_bump_generation_until_marked() {
        let mut buf = InstanceBuffer::new("one", 1, [1.0; 4]);
        let m = Mat4::from_translation(Vec3::X);
        buf.sync_instance(0, m).unwrap();
        assert_eq!(buf.generation(), 0);
        assert_eq!(buf.get(0), Some(m));
        buf.mark_dirty();
        assert_eq!(buf.generation(), 1);
    }

    #[test]
    fn hand_allocates_nine_slots() {
        let mut hand = Hand::build(&HandLayout::default()).unwrap();
        let mut buf = InstanceBuffer::new("phalanxes", hand.joint_count(), [0.0, 1.0, 1.0, 1.0]);
        assert_eq!(buf.len(), 9);
        let mut driver = AnimationDriver::curl();
        for _ in 0..5 {
            driver.tick(0.1, &mut hand.rig, &mut buf).unwrap();
        }
        assert_eq!(buf.len(), 9);
        assert_eq!(buf.generation(), 5);
    }

    #[test]
    fn repeated_sync_is_idempotent() {
        let hand = Hand::build(&HandLayout::default()).unwrap();
        let mut buf = InstanceBuffer::new("phalanxes", hand.joint_count(), [1.0; 4]);
        hand.rig.sync_instances(&mut buf).unwrap();
        let first = buf.transforms().to_vec();
        hand.rig.sync_instances(&mut buf).unwrap();
        assert_eq!(buf.transforms(), first.as_slice());
        assert_eq!(buf.len(), 9);
    }
}
