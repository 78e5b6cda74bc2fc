//! Error types for the viewport layer.
//!
//! An entity that cannot be classified is not an error: draw calls return
//! `None` for it. Errors are reserved for failures the caller must surface.

use shared::KernelError;
use thiserror::Error;

/// Failure of a kernel-backed draw call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("failed to draw kernel entity: `{method}` call rejected: {source}")]
    Kernel {
        method: String,
        #[source]
        source: KernelError,
    },
}

/// Camera creation problems; there is no recovery from these
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("cannot create an orbit camera before the rendering surface is initialized")]
    SurfaceNotInitialized,

    #[error("rendering surface has invalid size {width}x{height}")]
    InvalidSurfaceSize { width: u32, height: u32 },
}

/// Loading or saving viewport settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}
