use std::os::raw::c_uint;

use anyhow::{anyhow, bail, Result};
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use renderer::SessionObserver;
use x11::xlib;

use crate::cli::TriggerModifier;
use crate::xdisplay::XDisplay;

const SCROLL_UP: c_uint = 4;
const SCROLL_DOWN: c_uint = 5;

/// CapsLock and NumLock; their state must not stop the trigger from firing.
const LOCK_MASKS: c_uint = xlib::LockMask | xlib::Mod2Mask;
const LOCK_COMBINATIONS: [c_uint; 4] = [0, xlib::LockMask, xlib::Mod2Mask, LOCK_MASKS];

pub fn modifier_mask(modifier: TriggerModifier) -> c_uint {
    match modifier {
        TriggerModifier::Super => xlib::Mod4Mask,
        TriggerModifier::Alt => xlib::Mod1Mask,
        TriggerModifier::Ctrl => xlib::ControlMask,
        TriggerModifier::Shift => xlib::ShiftMask,
    }
}

/// Zoom ticks carried by a button press, if it is the trigger gesture.
pub fn trigger_ticks(modifier: c_uint, state: c_uint, button: c_uint) -> Option<i32> {
    if state & !LOCK_MASKS != modifier {
        return None;
    }
    match button {
        SCROLL_UP => Some(1),
        SCROLL_DOWN => Some(-1),
        _ => None,
    }
}

/// Passive modifier+wheel grab on every root window.
pub struct TriggerGrab<'a> {
    display: &'a XDisplay,
    modifier: c_uint,
}

impl<'a> TriggerGrab<'a> {
    pub fn new(display: &'a XDisplay, modifier: TriggerModifier) -> Self {
        Self {
            display,
            modifier: modifier_mask(modifier),
        }
    }

    pub fn modifier(&self) -> c_uint {
        self.modifier
    }

    pub fn arm(&self) {
        self.for_each_combination(|root, button, modifiers| {
            self.display.grab_button(root, button, modifiers)
        });
    }

    pub fn release(&self) {
        self.for_each_combination(|root, button, modifiers| {
            self.display.ungrab_button(root, button, modifiers)
        });
    }

    fn for_each_combination(&self, mut apply: impl FnMut(xlib::Window, c_uint, c_uint)) {
        for root in self.display.roots() {
            for button in [SCROLL_UP, SCROLL_DOWN] {
                for locks in LOCK_COMBINATIONS {
                    apply(root, button, self.modifier | locks);
                }
            }
        }
        self.display.flush();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStage {
    /// Waiting for the trigger; the passive grab is in place.
    Armed,
    /// A session owns the screen; the trigger is released and the overlay
    /// holds keyboard focus.
    Active,
}

/// Moves input ownership between the listener and the overlay.
pub struct OverlayFocus<'a> {
    display: &'a XDisplay,
    trigger: Option<TriggerGrab<'a>>,
    stage: GrabStage,
}

impl<'a> OverlayFocus<'a> {
    /// `trigger` is `None` for one-shot sessions that never armed a grab.
    pub fn new(display: &'a XDisplay, trigger: Option<TriggerGrab<'a>>) -> Self {
        Self {
            display,
            trigger,
            stage: GrabStage::Armed,
        }
    }

    pub fn stage(&self) -> GrabStage {
        self.stage
    }

    pub fn enter(&mut self, stage: GrabStage) {
        if stage == self.stage {
            return;
        }
        if let Some(trigger) = &self.trigger {
            match stage {
                GrabStage::Active => trigger.release(),
                GrabStage::Armed => trigger.arm(),
            }
        }
        tracing::debug!(from = ?self.stage, to = ?stage, "grab stage changed");
        self.stage = stage;
    }
}

impl SessionObserver for OverlayFocus<'_> {
    fn overlay_mapped(&mut self, window: &dyn HasWindowHandle) -> Result<()> {
        self.enter(GrabStage::Active);
        let xid = x11_window_id(window)?;
        self.display.focus(xid);
        Ok(())
    }

    fn overlay_closed(&mut self) -> Result<()> {
        let stale = self.display.discard_pending();
        if stale > 0 {
            tracing::debug!(stale, "dropped events queued during the session");
        }
        self.enter(GrabStage::Armed);
        Ok(())
    }
}

fn x11_window_id(window: &dyn HasWindowHandle) -> Result<xlib::Window> {
    let handle = window
        .window_handle()
        .map_err(|err| anyhow!("overlay has no window handle: {err}"))?;
    match handle.as_raw() {
        RawWindowHandle::Xlib(handle) => Ok(handle.window),
        RawWindowHandle::Xcb(handle) => Ok(xlib::Window::from(handle.window.get())),
        other => bail!("overlay is not an X11 window ({other:?})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_with_modifier_triggers() {
        let modifier = modifier_mask(TriggerModifier::Super);
        assert_eq!(trigger_ticks(modifier, modifier, 4), Some(1));
        assert_eq!(trigger_ticks(modifier, modifier, 5), Some(-1));
    }

    #[test]
    fn lock_keys_are_tolerated() {
        let modifier = modifier_mask(TriggerModifier::Alt);
        for locks in LOCK_COMBINATIONS {
            assert_eq!(trigger_ticks(modifier, modifier | locks, 4), Some(1));
        }
    }

    #[test]
    fn extra_modifiers_or_buttons_do_not_trigger() {
        let modifier = modifier_mask(TriggerModifier::Super);
        assert_eq!(trigger_ticks(modifier, modifier | xlib::ShiftMask, 4), None);
        assert_eq!(trigger_ticks(modifier, 0, 4), None);
        assert_eq!(trigger_ticks(modifier, modifier, 1), None);
    }

    struct Unmapped;

    impl HasWindowHandle for Unmapped {
        fn window_handle(
            &self,
        ) -> Result<raw_window_handle::WindowHandle<'_>, raw_window_handle::HandleError> {
            Err(raw_window_handle::HandleError::Unavailable)
        }
    }

    #[test]
    fn overlay_without_handle_has_no_window_id() {
        let err = x11_window_id(&Unmapped).unwrap_err();
        assert!(err.to_string().contains("no window handle"), "{err}");
    }

    #[test]
    fn modifiers_map_to_distinct_masks() {
        let masks = [
            TriggerModifier::Super,
            TriggerModifier::Alt,
            TriggerModifier::Ctrl,
            TriggerModifier::Shift,
        ]
        .map(modifier_mask);
        for (i, a) in masks.iter().enumerate() {
            assert_eq!(a & LOCK_MASKS, 0);
            for b in &masks[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
