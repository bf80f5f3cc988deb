//! wgpu backend for the hand scene.
//!
//! Draws the scrolling grid through the patched line shader, then the palm
//! and the instanced phalanxes with a reflective cube-map material. Camera is
//! an orbit controller.
//!
//! # Invariants
//! - The backend never mutates the scene.
//! - Instance buffers are re-uploaded only when their generation changes.
//! - Camera motion is independent of the scene clock.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::{EnvironmentMap, WgpuRenderer};
pub use shaders::{GRID_TEMPLATE, GRID_TEMPLATE_NAME, GRID_TEMPLATE_VERSION, MESH_SHADER};
