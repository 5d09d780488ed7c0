use thiserror::Error;

use crate::types::{BodyHandle, ShapeHandle, WorldHandle};

/// Errors reported by the engine API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("world {0:?} does not exist or was destroyed")]
    WorldNotFound(WorldHandle),

    #[error("body {0:?} does not exist in its world")]
    BodyNotFound(BodyHandle),

    #[error("shape {0:?} is not registered with world {1:?}")]
    ShapeNotFound(ShapeHandle, WorldHandle),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported body configuration: {0}")]
    Unsupported(&'static str),

    #[error("mesh load failed: {0}")]
    MeshLoad(String),

    #[error("no mesh loader bound to the engine")]
    NoMeshLoader,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;

pub(crate) fn ensure_finite(what: &str, v: glam::Vec3) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!("{what} must be finite, got {v}")))
    }
}

pub(crate) fn ensure_non_negative(what: &str, v: f32) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!("{what} must be finite and >= 0, got {v}")))
    }
}

pub(crate) fn ensure_positive(what: &str, v: f32) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidParameter(format!("{what} must be finite and > 0, got {v}")))
    }
}
