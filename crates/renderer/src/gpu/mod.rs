//! GPU side of the overlay.
//!
//! - `context` owns the wgpu instance, device and surface and picks the
//!   swapchain format and present mode.
//! - `pipeline` links the quad vertex shader with the selected post-process
//!   fragment shader under a validation error scope.
//! - `uniforms` mirrors the two-rect uniform block.
//! - `state` glues everything together behind [`GpuState::render`].

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use context::SurfaceColorSpace;
pub(crate) use state::{FrameOutcome, GpuState};
