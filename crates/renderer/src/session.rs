use std::collections::VecDeque;
use std::time::{Duration, Instant};

use navigation::{FrameSignals, Followers, InputEvent, InputSampler, NavigationState};
use raw_window_handle::HasWindowHandle;
use tracing::{debug, info, trace};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::Window;

use crate::capture::{DisplaySurface, Snapshot};
use crate::error::EngineError;
use crate::gpu::{FrameOutcome, GpuState};
use crate::types::{MagnifierConfig, SessionSummary, SessionTrigger};
use crate::window::{create_overlay, translate_event, Overlay};

/// Hooks for the process-wide grab bookkeeping around a session.
pub trait SessionObserver {
    /// Called once the overlay is on screen with its GPU resources ready,
    /// before the first frame. The implementation typically moves keyboard
    /// and pointer ownership to it.
    fn overlay_mapped(&mut self, window: &dyn HasWindowHandle) -> anyhow::Result<()>;

    /// Called after every GPU resource and the overlay have been released.
    fn overlay_closed(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl SessionObserver for () {
    fn overlay_mapped(&mut self, _window: &dyn HasWindowHandle) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Runs magnifier sessions on a single event loop that lives as long as the
/// process.
pub struct Magnifier {
    event_loop: EventLoop<()>,
    config: MagnifierConfig,
}

impl Magnifier {
    pub fn new(config: MagnifierConfig) -> Result<Self, EngineError> {
        config.tuning.validate()?;
        let event_loop = EventLoopBuilder::new()
            .build()
            .map_err(|err| EngineError::Window(format!("failed to create event loop: {err}")))?;
        Ok(Self { event_loop, config })
    }

    pub fn config(&self) -> &MagnifierConfig {
        &self.config
    }

    /// Captures `surface` once, shows the overlay and drives frames until the
    /// lifecycle terminates.
    ///
    /// The overlay stays unmapped until the pipeline is built and the
    /// snapshot uploaded, so setup failures never leave it on screen.
    ///
    /// Every GPU object is released before the overlay window, and both before
    /// this returns.
    pub fn run_session<D, O>(
        &mut self,
        surface: &mut D,
        trigger: SessionTrigger,
        observer: &mut O,
    ) -> Result<SessionSummary, EngineError>
    where
        D: DisplaySurface + ?Sized,
        O: SessionObserver + ?Sized,
    {
        let started = Instant::now();
        let snapshot = surface.read_pixels()?;
        let size = (snapshot.width(), snapshot.height());
        debug!(?snapshot, "captured display surface");

        let window = create_overlay(&self.event_loop, size)?;
        let result = self.drive(&window, snapshot, trigger, observer, started);
        drop(window);
        self.flush_events();
        let closed = observer.overlay_closed();

        let summary = result?;
        closed?;
        info!(
            frames = summary.frames,
            duration_ms = summary.duration.as_millis() as u64,
            "magnifier session closed"
        );
        Ok(summary)
    }

    fn drive<O>(
        &mut self,
        window: &Window,
        snapshot: Snapshot,
        trigger: SessionTrigger,
        observer: &mut O,
        started: Instant,
    ) -> Result<SessionSummary, EngineError>
    where
        O: SessionObserver + ?Sized,
    {
        let size = (snapshot.width(), snapshot.height());
        let tuning = self.config.tuning;
        let config = &self.config;
        let mut gpu = reveal_when_ready(
            window,
            || GpuState::new(window, snapshot, config),
            observer,
        )?;
        info!(
            width = size.0,
            height = size.1,
            adapter = %gpu.adapter_profile().name,
            style = %self.config.post_process,
            "magnifier session started"
        );

        let mut sampler = InputSampler::new(&tuning);
        sampler.seed(trigger.cursor, trigger.zoom_ticks);
        let mut navigation = NavigationState::new(size, &tuning);
        let mut followers = Followers::new();
        let mut queue = VecDeque::new();
        let mut frames = 0_u64;
        let mut skipped = 0_u64;

        while !navigation.is_terminated() {
            let mut close_requested = false;
            let window_id = window.id();
            let mut cursor = sampler.cursor();
            let status = self
                .event_loop
                .pump_events(Some(Duration::ZERO), |event, _elwt| {
                    let Event::WindowEvent { window_id: id, event } = event else {
                        return;
                    };
                    if id != window_id {
                        return;
                    }
                    match &event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                            close_requested = true;
                        }
                        WindowEvent::Resized(new_size) if *new_size != gpu.size() => {
                            gpu.resize(*new_size);
                        }
                        _ => {}
                    }
                    if let Some(input) = translate_event(&event, &mut cursor) {
                        queue.push_back(input);
                    }
                });
            if let PumpStatus::Exit(code) = status {
                return Err(EngineError::Window(format!(
                    "event loop exited with code {code}"
                )));
            }

            let signals = sample_frame(&mut sampler, &mut queue, close_requested);
            let report = navigation.step(&signals, &tuning);

            if gpu.render(&followers)? == FrameOutcome::Skipped {
                skipped += 1;
            }
            followers.advance(navigation.target(), &tuning);
            frames += 1;

            trace!(
                frame = frames,
                phase = report.phase,
                moved = report.target_moved,
                divergence = followers.divergence(),
                "frame"
            );
        }

        debug!(
            presented = gpu.frame_count(),
            skipped,
            "releasing GPU resources"
        );
        drop(gpu);

        Ok(SessionSummary {
            frames,
            duration: started.elapsed(),
            size,
        })
    }

    /// Lets the event loop process the overlay teardown.
    fn flush_events(&mut self) {
        let _ = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |_event, _elwt| {});
    }
}

/// Prepares the GPU side of a hidden overlay, then shows it and notifies
/// `observer`. A failed `prepare` leaves the overlay unmapped and the observer
/// untouched.
fn reveal_when_ready<W, G, O>(
    overlay: &W,
    prepare: impl FnOnce() -> Result<G, EngineError>,
    observer: &mut O,
) -> Result<G, EngineError>
where
    W: Overlay,
    O: SessionObserver + ?Sized,
{
    let prepared = prepare()?;
    overlay.reveal();
    observer.overlay_mapped(overlay)?;
    Ok(prepared)
}

/// Drains this frame's input, counting a window-manager close as an exit.
fn sample_frame(
    sampler: &mut InputSampler,
    queue: &mut VecDeque<InputEvent>,
    close_requested: bool,
) -> FrameSignals {
    let mut signals = sampler.drain(queue);
    if close_requested {
        signals.exit_requests += 1;
    }
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigation::{Key, Tuning};
    use raw_window_handle::{HandleError, WindowHandle};
    use std::cell::RefCell;

    /// Records setup steps in order.
    #[derive(Default)]
    struct Steps(RefCell<Vec<&'static str>>);

    impl Steps {
        fn push(&self, step: &'static str) {
            self.0.borrow_mut().push(step);
        }

        fn take(&self) -> Vec<&'static str> {
            self.0.take()
        }
    }

    struct HeadlessOverlay<'a>(&'a Steps);

    impl HasWindowHandle for HeadlessOverlay<'_> {
        fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    impl Overlay for HeadlessOverlay<'_> {
        fn reveal(&self) {
            self.0.push("reveal");
        }
    }

    struct RecordingObserver<'a>(&'a Steps);

    impl SessionObserver for RecordingObserver<'_> {
        fn overlay_mapped(&mut self, _window: &dyn HasWindowHandle) -> anyhow::Result<()> {
            self.0.push("mapped");
            Ok(())
        }
    }

    #[test]
    fn failed_setup_keeps_overlay_hidden() {
        let steps = Steps::default();
        let overlay = HeadlessOverlay(&steps);
        let mut observer = RecordingObserver(&steps);

        let result: Result<(), _> = reveal_when_ready(
            &overlay,
            || {
                steps.push("prepare");
                Err(EngineError::ShaderBuild("bad fragment stage".to_string()))
            },
            &mut observer,
        );

        assert!(matches!(result, Err(EngineError::ShaderBuild(_))));
        assert_eq!(steps.take(), ["prepare"]);
    }

    #[test]
    fn oversized_upload_keeps_overlay_hidden() {
        let steps = Steps::default();
        let overlay = HeadlessOverlay(&steps);
        let mut observer = RecordingObserver(&steps);

        let result: Result<(), _> = reveal_when_ready(
            &overlay,
            || {
                Err(EngineError::Acquisition(crate::CaptureError::TooLarge {
                    width: 32768,
                    height: 1080,
                    limit: 16384,
                }))
            },
            &mut observer,
        );

        assert!(matches!(result, Err(EngineError::Acquisition(_))));
        assert!(steps.take().is_empty());
    }

    #[test]
    fn overlay_is_shown_before_observer_takes_input() {
        let steps = Steps::default();
        let overlay = HeadlessOverlay(&steps);
        let mut observer = RecordingObserver(&steps);

        let prepared = reveal_when_ready(
            &overlay,
            || {
                steps.push("prepare");
                Ok(7)
            },
            &mut observer,
        )
        .unwrap();

        assert_eq!(prepared, 7);
        assert_eq!(steps.take(), ["prepare", "reveal", "mapped"]);
    }

    #[test]
    fn close_request_counts_as_exit() {
        let mut sampler = InputSampler::new(&Tuning::DEFAULT);
        let mut queue = VecDeque::new();
        let signals = sample_frame(&mut sampler, &mut queue, true);
        assert_eq!(signals.exit_requests, 1);
    }

    #[test]
    fn queue_is_empty_after_each_frame() {
        let mut sampler = InputSampler::new(&Tuning::DEFAULT);
        let mut queue: VecDeque<InputEvent> = [
            InputEvent::Scroll { lines: 1.0 },
            InputEvent::KeyDown { key: Key::Escape },
        ]
        .into_iter()
        .collect();
        let signals = sample_frame(&mut sampler, &mut queue, false);
        assert!(queue.is_empty());
        assert_eq!(signals.zoom_ticks, 1);
        assert_eq!(signals.exit_requests, 1);
    }

    #[test]
    fn trigger_tick_lands_on_first_frame() {
        let mut sampler = InputSampler::new(&Tuning::DEFAULT);
        sampler.seed([640.0, 360.0], 1);
        let mut queue = VecDeque::new();
        let first = sample_frame(&mut sampler, &mut queue, false);
        assert_eq!(first.zoom_ticks, 1);
        assert_eq!(first.cursor, [640.0, 360.0]);
        let second = sample_frame(&mut sampler, &mut queue, false);
        assert_eq!(second.zoom_ticks, 0);
    }
}
