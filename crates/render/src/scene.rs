use crate::error::RenderError;
use crate::grid::{GridMesh, GridUniforms};
use crate::instances::InstanceBuffer;
use crate::mesh::{ExtrudeSettings, Mesh, extrude, phalanx_mesh};
use handgrid_kernel::{
    AnimationDriver, FrameClock, Hand, HandLayout, IdleSpin, InstanceSink, palm_outline,
};

pub const PHALANX_COLOR: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
pub const PALM_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
pub const GRID_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
pub const SQUARE_COLOR: [f32; 4] = [10.0 / 255.0, 170.0 / 255.0, 1.0, 1.0];
/// Height of the static square outline above the scrolling grid.
pub const SQUARE_LIFT: f32 = 0.01;
pub const PHALANX_RADIUS: f32 = 1.0;
pub const PHALANX_LENGTH: f32 = 3.0;

/// Construction parameters for a [`HandScene`].
#[derive(Debug, Clone)]
pub struct SceneSettings {
    pub layout: HandLayout,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub grid_speed: f32,
    pub driver: AnimationDriver,
    pub spin: IdleSpin,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            layout: HandLayout::default(),
            grid_size: 20.0,
            grid_divisions: 10,
            grid_speed: 1.0,
            driver: AnimationDriver::curl(),
            spin: IdleSpin::default(),
        }
    }
}

/// Per-frame summary, for logging and the HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub time: f32,
    pub curl_angle: f32,
}

/// All CPU-side scene state: the hand, its animation, the grid and the
/// instance slots a backend uploads.
#[derive(Debug, Clone)]
pub struct HandScene {
    pub hand: Hand,
    pub driver: AnimationDriver,
    pub spin: IdleSpin,
    pub clock: FrameClock,
    pub uniforms: GridUniforms,
    pub phalanxes: InstanceBuffer,
    pub palm: InstanceBuffer,
    pub phalanx_mesh: Mesh,
    pub palm_mesh: Mesh,
    pub scroll_grid: GridMesh,
    pub square: GridMesh,
}

impl HandScene {
    pub fn new(settings: SceneSettings) -> Result<Self, RenderError> {
        let mut hand = Hand::build(&settings.layout)?;
        let uniforms = GridUniforms::new(settings.grid_speed, settings.grid_size)?;
        let scroll_grid = GridMesh::lines(
            settings.grid_size,
            settings.grid_divisions,
            GRID_COLOR,
            GRID_COLOR,
        )?
        .scrolling();
        let square = GridMesh::lines(settings.grid_size, 1, SQUARE_COLOR, SQUARE_COLOR)?
            .lifted(SQUARE_LIFT);

        let mut phalanxes = InstanceBuffer::new("phalanxes", hand.joint_count(), PHALANX_COLOR);
        hand.rig.check_slots(phalanxes.len())?;
        settings.driver.apply(&mut hand.rig, &mut phalanxes)?;

        let mut palm = InstanceBuffer::new("palm", 1, PALM_COLOR);
        palm.sync_instance(0, hand.rig.world(hand.base)?)?;
        palm.mark_dirty();

        let phalanx_mesh = phalanx_mesh(PHALANX_RADIUS, PHALANX_LENGTH);
        let palm_mesh = extrude(&palm_outline(), &ExtrudeSettings::default());
        tracing::info!(
            instances = phalanxes.len(),
            phalanx_triangles = phalanx_mesh.triangle_count(),
            palm_triangles = palm_mesh.triangle_count(),
            grid_vertices = scroll_grid.vertex_count(),
            "scene assembled"
        );

        Ok(Self {
            hand,
            driver: settings.driver,
            spin: settings.spin,
            clock: FrameClock::new(),
            uniforms,
            phalanxes,
            palm,
            phalanx_mesh,
            palm_mesh,
            scroll_grid,
            square,
        })
    }

    /// Advance one frame by `dt` seconds: animation tick, uniform update, then
    /// idle rotation of the assembly.
    ///
    /// The idle rotation set here reaches the instances on the next tick.
    pub fn frame(&mut self, dt: f32) -> Result<FrameStats, RenderError> {
        let time = self.clock.advance(dt);
        let curl_angle = self
            .driver
            .tick(dt, &mut self.hand.rig, &mut self.phalanxes)?;
        self.palm
            .sync_instance(0, self.hand.rig.world(self.hand.base)?)?;
        self.palm.mark_dirty();
        self.uniforms.time = time;
        self.spin.apply(time, &mut self.hand)?;
        Ok(FrameStats {
            frame: self.clock.frames(),
            time,
            curl_angle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handgrid_kernel::{CURL_CLOSED, CURL_OPEN};

    #[test]
    fn default_scene_wires_nine_instances() {
        let scene = HandScene::new(SceneSettings::default()).unwrap();
        assert_eq!(scene.hand.joint_count(), 9);
        assert_eq!(scene.phalanxes.len(), 9);
        assert_eq!(scene.palm.len(), 1);
        assert_eq!(scene.phalanxes.generation(), 1);
    }

    #[test]
    fn frames_update_time_and_instances() {
        let mut scene = HandScene::new(SceneSettings::default()).unwrap();
        let before = scene.phalanxes.transforms().to_vec();
        let stats = scene.frame(0.5).unwrap();
        assert!((stats.time - 0.5).abs() < 1e-6);
        assert!((scene.uniforms.time - 0.5).abs() < 1e-6);
        assert!(stats.curl_angle > CURL_OPEN && stats.curl_angle < CURL_CLOSED);
        assert_ne!(scene.phalanxes.transforms(), before.as_slice());
        assert_eq!(scene.phalanxes.len(), 9);
    }

    #[test]
    fn idle_spin_reaches_instances_next_frame() {
        let mut scene = HandScene::new(SceneSettings::default()).unwrap();
        scene.frame(1.0).unwrap();
        let base_rotation = scene.hand.rig.node(scene.hand.base).unwrap().local.rotation;
        assert_eq!(base_rotation, scene.spin.rotation_at(1.0));
        scene.frame(0.0).unwrap();
        let palm = scene.palm.get(0).unwrap();
        let (_, rotation, _) = palm.to_scale_rotation_translation();
        assert!(rotation.angle_between(scene.spin.rotation_at(1.0)) < 1e-4);
    }

    #[test]
    fn empty_hand_is_a_valid_scene() {
        let settings = SceneSettings {
            layout: HandLayout { fingers: vec![] },
            ..SceneSettings::default()
        };
        let mut scene = HandScene::new(settings).unwrap();
        assert!(scene.phalanxes.is_empty());
        scene.frame(0.016).unwrap();
    }

    #[test]
    fn invalid_grid_size_fails_construction() {
        let settings = SceneSettings {
            grid_size: 0.0,
            ..SceneSettings::default()
        };
        assert!(matches!(
            HandScene::new(settings),
            Err(RenderError::InvalidGridSize(_))
        ));
    }

    #[test]
    fn phase_step_spreads_joint_angles() {
        let settings = SceneSettings {
            driver: AnimationDriver::curl().with_phase_step(0.1),
            ..SceneSettings::default()
        };
        let mut scene = HandScene::new(settings).unwrap();
        scene.frame(1.0).unwrap();
        let joints = scene.hand.rig.joints().to_vec();
        let first = scene.hand.rig.node(joints[0]).unwrap().local.rotation;
        let last = scene.hand.rig.node(joints[8]).unwrap().local.rotation;
        assert!(first.angle_between(last) > 1e-3);
    }
}
