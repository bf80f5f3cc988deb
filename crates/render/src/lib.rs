//! Scene side of the hand demo, independent of any GPU backend.
//!
//! Owns the instance slots the rig writes into, the scrolling grid and its
//! shader patch, the procedural phalanx and palm meshes, and the noise
//! cubemap. [`HandScene`] ties them together and advances one frame at a
//! time; backends only read from it.
//!
//! # Invariants
//! - Instance slot count equals the rig's joint count for the scene's lifetime.
//! - Renderers never mutate the scene.

mod cubemap;
mod error;
mod grid;
mod instances;
mod mesh;
mod renderer;
mod scene;
mod shader;

pub use cubemap::{CUBE_FACE_SIZE, CUBE_FACES, CubeFace, CubeMapGenerator, CubeMapImages};
pub use error::RenderError;
pub use grid::{GridMesh, GridUniforms, GridUniformsRaw, GridVertex, MOVEABLE_PATTERN};
pub use instances::InstanceBuffer;
pub use mesh::{
    ARC_DIVISIONS, ExtrudeSettings, LATHE_SEGMENTS, Mesh, Vertex, extrude, lathe,
    phalanx_mesh, phalanx_profile, triangulate,
};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use scene::{
    FrameStats, GRID_COLOR, HandScene, PALM_COLOR, PHALANX_COLOR, SQUARE_COLOR, SceneSettings,
};
pub use shader::{GridShaderPatcher, HOOK_PREFIX, Hook, ShaderError, ShaderTemplate};

pub use handgrid_kernel::palm_outline;
