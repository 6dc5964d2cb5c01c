use std::collections::VecDeque;

use crate::tuning::{KeyBinding, Tuning};

/// Pointer buttons as reported by the windowing layer. Scroll wheels are not
/// buttons here; they arrive as [`InputEvent::Scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

/// Logical key symbols the engine understands. Everything else collapses to
/// `Other` and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Left,
    Right,
    Up,
    Down,
    Char(char),
    Other,
}

/// One decoded input event, in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ButtonDown { button: PointerButton, x: f32, y: f32 },
    ButtonUp { button: PointerButton, x: f32, y: f32 },
    Motion { x: f32, y: f32 },
    /// Wheel movement in lines; positive scrolls up (zoom in).
    Scroll { lines: f32 },
    KeyDown { key: Key },
    KeyUp { key: Key },
}

/// A non-blocking queue of pending input.
pub trait EventSource {
    /// Returns the next queued event, or `None` when the queue is empty. Must
    /// never wait for new input.
    fn poll_event(&mut self) -> Option<InputEvent>;
}

impl EventSource for VecDeque<InputEvent> {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}

/// Held/released state per movement binding, indexed by binding position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMask(u32);

impl KeyMask {
    pub const CAPACITY: usize = 32;

    pub fn is_held(self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1 << index) != 0
    }

    pub fn set(&mut self, index: usize, held: bool) {
        if index >= Self::CAPACITY {
            return;
        }
        if held {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sum of the axis contributions of every held binding, folded to
    /// `-1/0/+1` per axis.
    pub fn direction(self, bindings: &[KeyBinding]) -> [i8; 2] {
        let mut sum = [0i32; 2];
        for (index, binding) in bindings.iter().enumerate() {
            if self.is_held(index) {
                sum[0] += i32::from(binding.axis[0]);
                sum[1] += i32::from(binding.axis[1]);
            }
        }
        [sum[0].signum() as i8, sum[1].signum() as i8]
    }
}

/// Per-frame reduction of everything the input queue held.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameSignals {
    /// Signed whole scroll ticks seen this frame.
    pub zoom_ticks: i32,
    /// Number of exit-triggering inputs seen this frame.
    pub exit_requests: u32,
    /// Drag displacement in pixels, already negated so content follows the
    /// pointer.
    pub pan: [f32; 2],
    pub direction: [i8; 2],
    pub cursor: [f32; 2],
    pub held: KeyMask,
}

impl FrameSignals {
    pub fn exit_raised(&self) -> bool {
        self.exit_requests > 0
    }
}

/// Reduces a queue of [`InputEvent`]s into [`FrameSignals`] once per frame.
///
/// Continuous state (held keys, pan button, pointer position, partial scroll)
/// persists between frames; one-shot counters start from zero on every drain.
#[derive(Debug, Clone)]
pub struct InputSampler {
    bindings: &'static [KeyBinding],
    cancel_keys: &'static [Key],
    pan_button: PointerButton,
    held: KeyMask,
    panning: bool,
    cursor: [f32; 2],
    scroll_remainder: f32,
    pending_ticks: i32,
}

impl InputSampler {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            bindings: tuning.bindings,
            cancel_keys: tuning.cancel_keys,
            pan_button: tuning.pan_button,
            held: KeyMask::default(),
            panning: false,
            cursor: [0.0, 0.0],
            scroll_remainder: 0.0,
            pending_ticks: 0,
        }
    }

    /// Primes the sampler with the gesture that opened the session so the
    /// first frame zooms around the trigger position.
    pub fn seed(&mut self, cursor: [f32; 2], ticks: i32) {
        self.cursor = cursor;
        self.pending_ticks += ticks;
    }

    pub fn cursor(&self) -> [f32; 2] {
        self.cursor
    }

    /// Drains every queued event without blocking.
    pub fn drain<S: EventSource + ?Sized>(&mut self, source: &mut S) -> FrameSignals {
        let mut signals = FrameSignals {
            zoom_ticks: std::mem::take(&mut self.pending_ticks),
            ..FrameSignals::default()
        };

        while let Some(event) = source.poll_event() {
            self.apply(event, &mut signals);
        }

        signals.cursor = self.cursor;
        signals.held = self.held;
        signals.direction = self.held.direction(self.bindings);
        signals
    }

    fn apply(&mut self, event: InputEvent, signals: &mut FrameSignals) {
        match event {
            InputEvent::ButtonDown { button, x, y } => {
                self.cursor = [x, y];
                if button == self.pan_button {
                    self.panning = true;
                } else {
                    signals.exit_requests += 1;
                }
            }
            InputEvent::ButtonUp { button, x, y } => {
                self.cursor = [x, y];
                if button == self.pan_button {
                    self.panning = false;
                }
            }
            InputEvent::Motion { x, y } => {
                if self.panning {
                    signals.pan[0] -= x - self.cursor[0];
                    signals.pan[1] -= y - self.cursor[1];
                }
                self.cursor = [x, y];
            }
            InputEvent::Scroll { lines } => {
                let total = self.scroll_remainder + lines;
                let whole = total.trunc();
                self.scroll_remainder = total - whole;
                signals.zoom_ticks += whole as i32;
            }
            InputEvent::KeyDown { key } => {
                if self.cancel_keys.contains(&key) {
                    signals.exit_requests += 1;
                }
                for index in binding_indices(self.bindings, key) {
                    self.held.set(index, true);
                }
            }
            InputEvent::KeyUp { key } => {
                for index in binding_indices(self.bindings, key) {
                    self.held.set(index, false);
                }
            }
        }
    }

}

/// Positions of every binding for `key`; one key may drive several bindings.
fn binding_indices(bindings: &[KeyBinding], key: Key) -> impl Iterator<Item = usize> + '_ {
    bindings
        .iter()
        .enumerate()
        .filter(move |(_, binding)| binding.key == key)
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> InputSampler {
        InputSampler::new(&Tuning::DEFAULT)
    }

    fn queue(events: &[InputEvent]) -> VecDeque<InputEvent> {
        events.iter().copied().collect()
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let mut sampler = sampler();
        let mut events = VecDeque::new();
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.zoom_ticks, 0);
        assert_eq!(signals.exit_requests, 0);
        assert_eq!(signals.pan, [0.0, 0.0]);
        assert_eq!(signals.direction, [0, 0]);
    }

    #[test]
    fn scroll_ticks_accumulate_then_reset() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::Scroll { lines: 1.0 },
            InputEvent::Scroll { lines: 1.0 },
            InputEvent::Scroll { lines: -1.0 },
            InputEvent::Scroll { lines: 1.0 },
        ]);
        assert_eq!(sampler.drain(&mut events).zoom_ticks, 2);
        assert_eq!(sampler.drain(&mut events).zoom_ticks, 0);
    }

    #[test]
    fn fractional_scroll_carries_over() {
        let mut sampler = sampler();
        let mut events = queue(&[InputEvent::Scroll { lines: 0.6 }]);
        assert_eq!(sampler.drain(&mut events).zoom_ticks, 0);
        let mut events = queue(&[InputEvent::Scroll { lines: 0.6 }]);
        assert_eq!(sampler.drain(&mut events).zoom_ticks, 1);
    }

    #[test]
    fn seed_applies_on_first_drain() {
        let mut sampler = sampler();
        sampler.seed([640.0, 360.0], 1);
        let signals = sampler.drain(&mut VecDeque::new());
        assert_eq!(signals.zoom_ticks, 1);
        assert_eq!(signals.cursor, [640.0, 360.0]);
    }

    #[test]
    fn non_pan_buttons_and_cancel_keys_request_exit() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::ButtonDown {
                button: PointerButton::Left,
                x: 1.0,
                y: 2.0,
            },
            InputEvent::ButtonDown {
                button: PointerButton::Right,
                x: 1.0,
                y: 2.0,
            },
            InputEvent::KeyDown { key: Key::Escape },
        ]);
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.exit_requests, 3);
        assert_eq!(signals.cursor, [1.0, 2.0]);
    }

    #[test]
    fn pan_drag_is_negated_pointer_motion() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::ButtonDown {
                button: PointerButton::Middle,
                x: 100.0,
                y: 100.0,
            },
            InputEvent::Motion { x: 110.0, y: 95.0 },
            InputEvent::Motion { x: 130.0, y: 90.0 },
        ]);
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.exit_requests, 0);
        assert_eq!(signals.pan, [-30.0, 10.0]);

        let mut events = queue(&[
            InputEvent::ButtonUp {
                button: PointerButton::Middle,
                x: 130.0,
                y: 90.0,
            },
            InputEvent::Motion { x: 200.0, y: 200.0 },
        ]);
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.pan, [0.0, 0.0]);
        assert_eq!(signals.cursor, [200.0, 200.0]);
    }

    #[test]
    fn repeated_key_press_is_idempotent() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::KeyDown { key: Key::Right },
            InputEvent::KeyDown { key: Key::Right },
            InputEvent::KeyDown { key: Key::Right },
        ]);
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.direction, [1, 0]);

        let mut events = queue(&[InputEvent::KeyUp { key: Key::Right }]);
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.direction, [0, 0]);
        assert!(signals.held.is_empty());
    }

    #[test]
    fn opposing_keys_cancel_and_held_keys_persist() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::KeyDown { key: Key::Left },
            InputEvent::KeyDown { key: Key::Right },
            InputEvent::KeyDown { key: Key::Char('s') },
        ]);
        assert_eq!(sampler.drain(&mut events).direction, [0, 1]);
        assert_eq!(sampler.drain(&mut VecDeque::new()).direction, [0, 1]);
    }

    #[test]
    fn same_direction_bindings_do_not_stack() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::KeyDown { key: Key::Up },
            InputEvent::KeyDown { key: Key::Char('w') },
            InputEvent::KeyDown { key: Key::Char('k') },
        ]);
        assert_eq!(sampler.drain(&mut events).direction, [0, -1]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut sampler = sampler();
        let mut events = queue(&[
            InputEvent::KeyDown { key: Key::Other },
            InputEvent::KeyDown { key: Key::Char('z') },
        ]);
        let signals = sampler.drain(&mut events);
        assert_eq!(signals.exit_requests, 0);
        assert!(signals.held.is_empty());
    }

    #[test]
    fn key_bound_twice_sets_and_clears_every_binding() {
        const DIAGONAL: &[KeyBinding] = &[
            KeyBinding::new(Key::Char('e'), 1, 0),
            KeyBinding::new(Key::Left, -1, 0),
            KeyBinding::new(Key::Char('e'), 0, -1),
        ];
        let tuning = Tuning {
            bindings: DIAGONAL,
            ..Tuning::DEFAULT
        };
        let mut sampler = InputSampler::new(&tuning);

        let signals = sampler.drain(&mut queue(&[InputEvent::KeyDown { key: Key::Char('e') }]));
        assert!(signals.held.is_held(0));
        assert!(!signals.held.is_held(1));
        assert!(signals.held.is_held(2));
        assert_eq!(signals.direction, [1, -1]);

        let signals = sampler.drain(&mut queue(&[InputEvent::KeyUp { key: Key::Char('e') }]));
        assert!(signals.held.is_empty());
        assert_eq!(signals.direction, [0, 0]);
    }
}
