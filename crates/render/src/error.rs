use crate::shader::ShaderError;
use handgrid_kernel::RigError;

/// Errors from building or advancing the renderable scene.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("rig error: {0}")]
    Rig(#[from] RigError),
    #[error("shader error: {0}")]
    Shader(#[from] ShaderError),
    #[error("grid size must be positive and finite, got {0}")]
    InvalidGridSize(f32),
    #[error("grid needs at least one division")]
    NoGridDivisions,
}
