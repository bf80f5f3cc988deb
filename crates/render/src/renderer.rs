use crate::scene::HandScene;
use glam::Vec3;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-5.0, 10.0, 20.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

/// Renderer-agnostic interface.
///
/// A renderer reads scene state and a view and produces output. It never
/// mutates the scene; animation is advanced by [`HandScene::frame`].
pub trait Renderer {
    type Output;

    fn render(&self, scene: &HandScene, view: &RenderView) -> Self::Output;
}

/// Text dump of the scene: clock, curl angle, grid uniforms and one line per
/// instance slot. Used by `--dump-scene` and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &HandScene, view: &RenderView) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Hand Scene (frame={}, t={:.3}s) ===\n",
            scene.clock.frames(),
            scene.clock.elapsed()
        ));
        out.push_str(&format!(
            "Curl: {:.4} rad, phase step {:.3}s\n",
            scene.driver.angle(),
            scene.driver.phase_step()
        ));
        out.push_str(&format!(
            "Grid: size={:.1} speed={:.2} time={:.3}\n",
            scene.uniforms.size(),
            scene.uniforms.speed,
            scene.uniforms.time
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z,
            view.fov_degrees
        ));
        out.push_str(&format!("Instances: {}\n", scene.phalanxes.len()));

        let rig = &scene.hand.rig;
        for (slot, (id, world)) in rig
            .joints()
            .iter()
            .zip(scene.phalanxes.transforms())
            .enumerate()
        {
            let name = rig.node(*id).map(|n| n.name.as_str()).unwrap_or("?");
            let p = world.w_axis;
            out.push_str(&format!(
                "  [{slot}] {name:<10} pos=({:.2}, {:.2}, {:.2})\n",
                p.x, p.y, p.z
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSettings;
    use handgrid_kernel::HandLayout;

    #[test]
    fn dump_lists_every_slot() {
        let scene = HandScene::new(SceneSettings::default()).unwrap();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());

        assert!(output.contains("frame=0"));
        assert!(output.contains("Instances: 9"));
        assert!(output.contains("[0] pinky.0"));
        assert!(output.contains("[8] thumb.0"));
        assert_eq!(output.matches("pos=").count(), 9);
        assert_eq!(output.lines().count(), 5 + 9);
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn dump_tracks_frames() {
        let mut scene = HandScene::new(SceneSettings::default()).unwrap();
        scene.frame(0.25).unwrap();
        scene.frame(0.25).unwrap();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("frame=2"));
        assert!(output.contains("t=0.500s"));
    }

    #[test]
    fn empty_scene_dump() {
        let settings = SceneSettings {
            layout: HandLayout { fingers: vec![] },
            ..SceneSettings::default()
        };
        let scene = HandScene::new(settings).unwrap();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());
        assert!(output.contains("Instances: 0"));
        assert!(!output.contains("pos="));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.target, Vec3::ZERO);
        assert_eq!(view.eye, Vec3::new(-5.0, 10.0, 20.0));
    }
}
