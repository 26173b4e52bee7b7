//! Error types for the rasterizer core
//!
//! Only recoverable setup failures live here. Contract violations (releasing
//! an unused bounding volume, using a destroyed handle) panic instead.

use crate::config::ConfigError;

/// Errors raised while configuring scenes, cameras and offscreen targets
#[derive(thiserror::Error, Debug)]
pub enum RasterError {
    /// The scene reference does not resolve to a live scene
    #[error("Scene object is invalid")]
    SceneInvalid,

    /// The camera reference does not resolve to a camera of the scene
    #[error("Camera object is invalid")]
    CameraInvalid,

    /// The observer reference does not resolve to an object of the scene
    #[error("Observer object is invalid")]
    ObserverInvalid,

    /// The mirror reference does not resolve to an object with mesh data
    #[error("Mirror object is invalid")]
    MirrorInvalid,

    /// The mirror mesh has no vertices or no extent
    #[error("Mirror has no vertex or no size")]
    MirrorSizeInvalid,

    /// Face normals of the mirror mesh cancel out
    #[error("Cannot determine mirror plane")]
    MirrorNormalInvalid,

    /// The mirror plane faces local up, so no up axis can be derived
    #[error("Mirror is horizontal in local space")]
    MirrorHorizontal,

    /// The mirror half extents are below the usable minimum
    #[error("Mirror is too small")]
    MirrorTooSmall,

    /// Mirror clip distance is not a positive number
    #[error("Mirror clip distance must be positive, got {0}")]
    ClipInvalid(f32),

    /// Reading back the offscreen target failed
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for rasterizer setup operations
pub type RasterResult<T> = Result<T, RasterError>;
