use navigation::TuningError;

use crate::capture::CaptureError;

/// Unrecoverable failures surfaced by a magnifier session.
///
/// None of these are retried; the caller is expected to tear down and exit.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("screen acquisition failed: {0}")]
    Acquisition(#[from] CaptureError),
    #[error("shader build failed: {0}")]
    ShaderBuild(String),
    #[error("GPU error: {0}")]
    Gpu(String),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("invalid tuning: {0}")]
    Tuning(#[from] TuningError),
    #[error("window error: {0}")]
    Window(String),
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}
