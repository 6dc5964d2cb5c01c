//! Navigation core for the loupe magnifier.
//!
//! Everything in this crate is plain arithmetic over per-frame input, with no
//! windowing or GPU dependencies, so the whole interaction model is testable
//! headless. One frame flows through it as:
//!
//! ```text
//!   EventSource ──drain──▶ InputSampler ──FrameSignals──▶ NavigationState::step
//!                                                              │ target
//!                                                              ▼
//!                                      renderer draws ◀── Followers { sharp, blur }
//!                                                              │
//!                                                   Followers::advance(target)
//! ```
//!
//! - `rect` holds the normalised [`ViewRect`].
//! - `input` reduces queued events into [`FrameSignals`].
//! - `state` integrates zoom, key velocity and drag into the target rect and
//!   owns the [`Lifecycle`] (active, snap-back, terminated).
//! - `follow` implements the two exponential lag followers.
//! - `tuning` carries the build-time motion constants.

mod follow;
mod input;
mod rect;
mod state;
mod tuning;

pub use follow::Followers;
pub use input::{
    EventSource, FrameSignals, InputEvent, InputSampler, Key, KeyMask, PointerButton,
};
pub use rect::ViewRect;
pub use state::{Lifecycle, NavigationState, StepReport};
pub use tuning::{KeyBinding, Tuning, TuningError, DEFAULT_BINDINGS, DEFAULT_CANCEL_KEYS};
