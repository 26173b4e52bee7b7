//! # Core Module
//!
//! Shared configuration for every rasterizer subsystem.
//!
//! ## Organization
//!
//! - **Config**: Engine, offscreen capture and bucket ordering settings

pub mod config;

pub use config::{
    RasterConfig,
    EngineConfig,
    OffscreenConfig,
    BucketConfig,
};
pub use crate::config::{Config, ConfigError};
