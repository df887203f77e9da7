//! Window-facing half of a frame publish: draw the frame, drain the event
//! queue, pace to the display rate.
//!
//! The guest runs synchronously inside `_start` and never yields to an event
//! loop, so events are pumped from inside the publish instead of the usual
//! winit run loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::RgbImage;
use wasidoom_core::{PresentOutcome, Presenter};
use wasidoom_render::FramePresenter;
use winit::{
    event::{ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    platform::pump_events::EventLoopExtPumpEvents,
    window::Window,
};

pub struct HostPresenter {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    renderer: FramePresenter,
    limiter: FrameLimiter,
}

impl HostPresenter {
    pub fn new(event_loop: EventLoop<()>, window: Arc<Window>, renderer: FramePresenter) -> Self {
        Self {
            event_loop,
            window,
            renderer,
            limiter: FrameLimiter::new(60),
        }
    }
}

impl Presenter for HostPresenter {
    fn present(&mut self, frame: &RgbImage) -> Result<PresentOutcome> {
        let mut quit = false;
        let renderer = &mut self.renderer;
        let window_id = self.window.id();

        let _status = self.event_loop.pump_events(Some(Duration::ZERO), |event, elwt| {
            let Event::WindowEvent { event, window_id: id } = event else {
                return;
            };
            if id != window_id {
                return;
            }
            match event {
                WindowEvent::CloseRequested => {
                    quit = true;
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed
                        && event.logical_key == Key::Named(NamedKey::Escape)
                    {
                        quit = true;
                    }
                }
                WindowEvent::Resized(size) => renderer.resize(size),
                _ => {}
            }
        });

        if quit {
            return Ok(PresentOutcome::Quit);
        }

        self.renderer.present(frame.as_raw())?;
        self.limiter.tick();
        Ok(PresentOutcome::Continue)
    }
}

/// Caps the publish rate so the guest's busy frame loop does not outrun the
/// display.
struct FrameLimiter {
    target: Duration,
    last: Instant,
}

impl FrameLimiter {
    fn new(fps: u32) -> Self {
        Self {
            target: Duration::from_secs(1) / fps.max(1),
            last: Instant::now(),
        }
    }

    fn tick(&mut self) {
        let elapsed = self.last.elapsed();
        if elapsed < self.target {
            std::thread::sleep(self.target - elapsed);
        }
        self.last = Instant::now();
    }
}
