//! Shared value types for the handgrid scene.

mod types;

pub use types::{NodeId, Transform};
