use crate::input::{Key, KeyMask, PointerButton};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TuningError {
    #[error("{name} must lie in (0, 1), got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("brake ({brake}) must be stronger than friction ({friction})")]
    BrakeNotSteeper { brake: f32, friction: f32 },
    #[error("at least one movement binding is required")]
    NoBindings,
    #[error("{0} movement bindings exceed the {max} supported", max = KeyMask::CAPACITY)]
    TooManyBindings(usize),
}

/// Maps one logical key to an axis contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: Key,
    pub axis: [i8; 2],
}

impl KeyBinding {
    pub const fn new(key: Key, x: i8, y: i8) -> Self {
        Self { key, axis: [x, y] }
    }
}

pub const DEFAULT_BINDINGS: &[KeyBinding] = &[
    KeyBinding::new(Key::Left, -1, 0),
    KeyBinding::new(Key::Right, 1, 0),
    KeyBinding::new(Key::Up, 0, -1),
    KeyBinding::new(Key::Down, 0, 1),
    KeyBinding::new(Key::Char('a'), -1, 0),
    KeyBinding::new(Key::Char('d'), 1, 0),
    KeyBinding::new(Key::Char('w'), 0, -1),
    KeyBinding::new(Key::Char('s'), 0, 1),
    KeyBinding::new(Key::Char('h'), -1, 0),
    KeyBinding::new(Key::Char('l'), 1, 0),
    KeyBinding::new(Key::Char('k'), 0, -1),
    KeyBinding::new(Key::Char('j'), 0, 1),
];

pub const DEFAULT_CANCEL_KEYS: &[Key] = &[Key::Escape, Key::Char('q')];

/// Motion constants, fixed at build time.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    /// Fraction of the span removed per zoom-in tick.
    pub zoom_speed: f32,
    /// Frames spent forcing the home rect before the session closes.
    pub snap_back_frames: u32,
    pub pan_button: PointerButton,
    /// Velocity gained per held frame, in viewport heights per frame.
    pub acceleration: f32,
    pub friction: f32,
    pub brake: f32,
    /// Per-frame convergence of the sharp follower.
    pub track_rate: f32,
    /// Blur follower rate relative to `track_rate`.
    pub blur_lag: f32,
    pub bindings: &'static [KeyBinding],
    pub cancel_keys: &'static [Key],
}

impl Tuning {
    pub const DEFAULT: Tuning = Tuning {
        zoom_speed: 0.03,
        snap_back_frames: 12,
        pan_button: PointerButton::Middle,
        acceleration: 0.004,
        friction: 0.9,
        brake: 0.7,
        track_rate: 0.7,
        blur_lag: 0.3 / 0.7,
        bindings: DEFAULT_BINDINGS,
        cancel_keys: DEFAULT_CANCEL_KEYS,
    };

    pub fn blur_rate(&self) -> f32 {
        self.track_rate * self.blur_lag
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let unit = [
            ("zoom_speed", self.zoom_speed),
            ("friction", self.friction),
            ("brake", self.brake),
            ("track_rate", self.track_rate),
            ("blur_lag", self.blur_lag),
        ];
        for (name, value) in unit {
            if !(value > 0.0 && value < 1.0) {
                return Err(TuningError::OutOfUnitRange { name, value });
            }
        }
        if self.brake >= self.friction {
            return Err(TuningError::BrakeNotSteeper {
                brake: self.brake,
                friction: self.friction,
            });
        }
        if self.bindings.is_empty() {
            return Err(TuningError::NoBindings);
        }
        if self.bindings.len() > KeyMask::CAPACITY {
            return Err(TuningError::TooManyBindings(self.bindings.len()));
        }
        Ok(())
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}
