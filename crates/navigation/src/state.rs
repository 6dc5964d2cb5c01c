use crate::input::{FrameSignals, KeyMask};
use crate::rect::ViewRect;
use crate::tuning::Tuning;

/// Session phase counter.
///
/// `0` is active, `1..=K` is snap-back, anything above `K` is terminated.
/// The counter only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    phase: u32,
    snap_frames: u32,
}

impl Lifecycle {
    pub fn new(snap_frames: u32) -> Self {
        Self {
            phase: 0,
            snap_frames,
        }
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == 0
    }

    pub fn is_snapping(&self) -> bool {
        self.phase >= 1 && self.phase <= self.snap_frames
    }

    /// Checked at the top of every frame; once true the loop must stop.
    pub fn is_terminated(&self) -> bool {
        self.phase > self.snap_frames
    }

    /// Advances by at most one step per frame no matter how many exit
    /// requests arrived.
    pub fn advance(&mut self, exit_raised: bool) {
        if self.phase == 0 {
            if exit_raised {
                tracing::debug!(snap_frames = self.snap_frames, "exit requested; snapping back");
                self.phase = 1;
            }
        } else {
            self.phase = self.phase.saturating_add(1);
        }
    }
}

/// What a single [`NavigationState::step`] did, for trace logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub phase: u32,
    pub target_moved: bool,
}

/// Mutable per-session navigation bundle.
#[derive(Debug, Clone)]
pub struct NavigationState {
    target: ViewRect,
    viewport: (f32, f32),
    cursor: [f32; 2],
    velocity: [f32; 2],
    held: KeyMask,
    lifecycle: Lifecycle,
}

impl NavigationState {
    pub fn new(viewport: (u32, u32), tuning: &Tuning) -> Self {
        Self {
            target: ViewRect::HOME,
            viewport: (viewport.0.max(1) as f32, viewport.1.max(1) as f32),
            cursor: [0.0, 0.0],
            velocity: [0.0, 0.0],
            held: KeyMask::default(),
            lifecycle: Lifecycle::new(tuning.snap_back_frames),
        }
    }

    pub fn target(&self) -> &ViewRect {
        &self.target
    }

    pub fn velocity(&self) -> [f32; 2] {
        self.velocity
    }

    pub fn cursor(&self) -> [f32; 2] {
        self.cursor
    }

    pub fn held(&self) -> KeyMask {
        self.held
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle.is_terminated()
    }

    /// Integrates one frame of sampled input into the target rect and
    /// advances the lifecycle.
    pub fn step(&mut self, signals: &FrameSignals, tuning: &Tuning) -> StepReport {
        let before = self.target;
        self.cursor = signals.cursor;
        self.held = signals.held;

        self.apply_zoom(signals.zoom_ticks, tuning);
        self.integrate_velocity(signals.direction, tuning);
        self.apply_displacement(signals.pan);

        self.lifecycle.advance(signals.exit_raised());
        if !self.lifecycle.is_active() {
            self.target = ViewRect::HOME;
        }

        StepReport {
            phase: self.lifecycle.phase(),
            target_moved: self.target != before,
        }
    }

    fn apply_zoom(&mut self, ticks: i32, tuning: &Tuning) {
        if ticks == 0 {
            return;
        }
        let (cx, cy) = self
            .target
            .focal_point(self.cursor[0], self.cursor[1], self.viewport);
        let factor = (1.0 - tuning.zoom_speed).powi(ticks);
        self.target.scale_about(cx, cy, factor);
    }

    fn integrate_velocity(&mut self, direction: [i8; 2], tuning: &Tuning) {
        for (velocity, input) in self.velocity.iter_mut().zip(direction) {
            if input != 0 {
                *velocity = (*velocity + f32::from(input) * tuning.acceleration) * tuning.friction;
            } else {
                *velocity *= tuning.brake;
            }
        }
    }

    fn apply_displacement(&mut self, pan: [f32; 2]) {
        let (width, height) = self.viewport;
        let nx = self.target.width() / width;
        let ny = self.target.height() / height;
        let dx = nx * (self.velocity[0] * height + pan[0]);
        let dy = ny * (self.velocity[1] * height + pan[1]);
        if dx != 0.0 || dy != 0.0 {
            self.target.translate(dx, dy);
        }
    }
}
