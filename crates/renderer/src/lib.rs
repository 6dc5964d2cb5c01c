//! Renderer crate for the loupe magnifier.
//!
//! Owns everything between a captured screen and presented frames: the GPU
//! context, the snapshot texture, the dual-lag pipeline and the overlay
//! session loop. A session runs as:
//!
//! ```text
//!   DisplaySurface::read_pixels ─▶ Snapshot ─▶ overlay window ─▶ GpuState::new
//!                                                                  │ CaptureTexture
//!                                                                  ▼
//!   loop: pump winit events ─▶ InputSampler::drain ─▶ NavigationState::step
//!           ▲                                                │
//!           └──── Followers::advance ◀── GpuState::render ◀──┘
//! ```
//!
//! The loop ends once the navigation lifecycle terminates; GPU objects are
//! dropped first, then the window. Every failure is surfaced as an
//! [`EngineError`] and nothing is retried.

mod capture;
mod compile;
mod error;
mod gpu;
mod session;
mod types;
mod window;

pub use capture::{CaptureError, DisplaySurface, PixelLayout, Snapshot};
pub use error::EngineError;
pub use session::{Magnifier, SessionObserver};
pub use types::{
    AdapterProfile, GpuPowerPreference, MagnifierConfig, PostProcess, SessionSummary,
    SessionTrigger, DEFAULT_BLUR_SAMPLES,
};
pub use window::translate_event;
