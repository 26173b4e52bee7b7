//! # Unified Configuration System
//!
//! All tunables of the rasterizer core in one serializable tree:
//!
//! - **Engine Config**: logging and debug features
//! - **Offscreen Config**: render-to-texture capture size and mirror clip distance
//! - **Bucket Config**: draw ordering of alpha-blended buckets

use serde::{Serialize, Deserialize};

use crate::config::Config;

/// Default maximum distance rendered behind a mirror plane
pub const DEFAULT_MIRROR_CLIP: f32 = 100.0;

/// # Engine Configuration
///
/// Core behavior shared by every subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default log filter (overridden by `RUST_LOG`)
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Offscreen Configuration
///
/// Render-to-texture defaults. A capture size of zero means "use the canvas size".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffscreenConfig {
    /// Far distance of a mirror frustum, measured from the mirror plane
    pub clip_distance: f32,
    /// Capture width in pixels (0 = canvas width)
    pub capture_width: u32,
    /// Capture height in pixels (0 = canvas height)
    pub capture_height: u32,
    /// Keep the alpha channel of captured pixels
    pub capture_alpha: bool,
    /// Capture the whole canvas instead of the configured area
    pub whole_viewport: bool,
}

impl OffscreenConfig {
    /// Create a new offscreen configuration
    pub fn new() -> Self {
        Self {
            clip_distance: DEFAULT_MIRROR_CLIP,
            capture_width: 0,
            capture_height: 0,
            capture_alpha: false,
            whole_viewport: false,
        }
    }

    /// Set mirror clip distance
    pub fn with_clip_distance(mut self, clip: f32) -> Self {
        self.clip_distance = clip;
        self
    }

    /// Set capture size
    pub fn with_capture_size(mut self, width: u32, height: u32) -> Self {
        self.capture_width = width;
        self.capture_height = height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.clip_distance.is_nan() || self.clip_distance <= 0.0 {
            return Err(format!("Mirror clip distance must be positive, got {}", self.clip_distance));
        }
        Ok(())
    }
}

impl Default for OffscreenConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Bucket Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Sort alpha batches back-to-front across buckets before drawing
    pub sort_alpha_back_to_front: bool,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            sort_alpha_back_to_front: true,
        }
    }
}

/// # Complete Rasterizer Configuration
///
/// Top-level configuration applications load from TOML or RON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RasterConfig {
    /// Engine core configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Render-to-texture configuration
    #[serde(default)]
    pub offscreen: OffscreenConfig,
    /// Bucket ordering configuration
    #[serde(default)]
    pub buckets: BucketConfig,
}

impl RasterConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.offscreen.validate()?;
        Ok(())
    }
}

impl Config for RasterConfig {}
