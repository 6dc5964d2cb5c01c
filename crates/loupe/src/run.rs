//! Listener loop and one-shot mode.
//!
//! The listener arms the modifier+wheel grab, blocks on the X event queue and
//! turns every matching press into one magnifier session. A failed session is
//! fatal: the error propagates to `main` and the process exits non-zero.

use anyhow::{Context, Result};
use renderer::{Magnifier, SessionTrigger};
use tracing_subscriber::EnvFilter;
use x11::xlib;

use crate::cli::RunArgs;
use crate::grab::{trigger_ticks, GrabStage, OverlayFocus, TriggerGrab};
use crate::xdisplay::XDisplay;

pub fn initialise_tracing() {
    let default_filter = "warn,loupe=info,renderer=info,navigation=info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = args.magnifier_config();
    // X protocol errors on this connection go to the handler winit installs
    // with its event loop.
    let display = XDisplay::open()?;
    let mut magnifier =
        Magnifier::new(config).context("failed to initialise the magnifier engine")?;

    if args.once {
        return run_once(&display, &mut magnifier);
    }

    let trigger = TriggerGrab::new(&display, args.modifier);
    let modifier = trigger.modifier();
    trigger.arm();
    let mut focus = OverlayFocus::new(&display, Some(trigger));
    tracing::info!(
        modifier = %args.modifier,
        style = %magnifier.config().post_process,
        "listening for {}+scroll",
        args.modifier
    );

    loop {
        let event = display.next_event();
        if event.get_type() != xlib::ButtonPress {
            continue;
        }
        let press = unsafe { event.button };
        let Some(zoom_ticks) = trigger_ticks(modifier, press.state, press.button) else {
            continue;
        };
        debug_assert_eq!(focus.stage(), GrabStage::Armed);

        let trigger = SessionTrigger {
            cursor: [press.x_root as f32, press.y_root as f32],
            zoom_ticks,
        };
        let mut surface = display.root_surface(press.root)?;
        magnifier
            .run_session(&mut surface, trigger, &mut focus)
            .inspect_err(|err| tracing::error!(error = %err, "magnifier session failed"))
            .context("magnifier session failed")?;
    }
}

fn run_once(display: &XDisplay, magnifier: &mut Magnifier) -> Result<()> {
    let cursor = display.query_pointer().unwrap_or_else(|| {
        tracing::warn!("pointer is not on the default screen; zooming from the origin");
        [0.0, 0.0]
    });
    let trigger = SessionTrigger {
        cursor,
        zoom_ticks: 1,
    };
    let mut surface = display.root_surface(display.default_root())?;
    let mut focus = OverlayFocus::new(display, None);
    let summary = magnifier
        .run_session(&mut surface, trigger, &mut focus)
        .context("magnifier session failed")?;
    tracing::debug!(?summary, "one-shot session finished");
    Ok(())
}
