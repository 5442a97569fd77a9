//! Application core - screen stack, redraw coordination and display power.
//!
//! Button events and the periodic render tick both end up here.  Neither
//! renders directly: they raise a [`RedrawSignal`] and the frame is pushed
//! from one place, so an immediate redraw and a periodic one never race
//! for the display.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use embedded_graphics::pixelcolor::BinaryColor;
use log::{info, warn};

use crate::config::DisplayTimeout;
use crate::power::{DisplayPower, PowerState};
use crate::ui::controller::ScreenStack;
use crate::ui::display::FrameSink;
use crate::ui::{ButtonEvent, Directives, Screen};

/// Thread-safe "a redraw is owed" flag.
#[derive(Clone, Debug, Default)]
pub struct RedrawSignal(Arc<AtomicBool>);

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

pub struct App {
    stack: ScreenStack,
    redraw: RedrawSignal,
    power: DisplayPower,
}

impl App {
    /// Start on `primary` with a redraw pending.
    pub fn new(primary: Box<dyn Screen>, timeout: DisplayTimeout, now: Instant) -> Self {
        let redraw = RedrawSignal::new();
        redraw.request();
        Self {
            stack: ScreenStack::install(primary),
            redraw,
            power: DisplayPower::new(timeout, now),
        }
    }

    pub fn redraw_signal(&self) -> RedrawSignal {
        self.redraw.clone()
    }

    pub fn stack(&self) -> &ScreenStack {
        &self.stack
    }

    pub fn power(&self) -> &DisplayPower {
        &self.power
    }

    /// Route a button event.
    ///
    /// An event that wakes the display is consumed and returns the empty
    /// set.  A `DRAW` answer renders before returning.
    pub fn handle_event<F>(&mut self, event: &ButtonEvent, now: Instant, sink: &mut F) -> Directives
    where
        F: FrameSink + ?Sized,
    {
        if self.power.activity(now) {
            if let Err(e) = sink.power_on() {
                warn!("Power: display power on failed: {}", e);
            }
            self.redraw.request();
            self.flush(now, sink);
            return Directives::empty();
        }

        let directives = self.stack.handle_event(event);
        if directives.redraw_now() {
            self.redraw.request();
            self.flush(now, sink);
        }
        directives
    }

    /// Periodic tick: owe a redraw, apply the power policy, render.
    pub fn tick<F>(&mut self, now: Instant, sink: &mut F)
    where
        F: FrameSink + ?Sized,
    {
        self.redraw.request();
        match self.power.tick(now) {
            Some(PowerState::Off) => {
                if let Err(e) = sink.power_off() {
                    warn!("Power: display power off failed: {}", e);
                }
            }
            Some(PowerState::On) => {
                if let Err(e) = sink.power_on() {
                    warn!("Power: display power on failed: {}", e);
                }
            }
            None => {}
        }
        self.flush(now, sink);
    }

    /// Blank and power off the display.  Failures are logged only.
    pub fn shutdown<F>(&mut self, sink: &mut F)
    where
        F: FrameSink + ?Sized,
    {
        info!("Screen: clearing display");
        if let Err(e) = sink.fill(BinaryColor::Off) {
            warn!("Screen: clearing display failed: {}", e);
        }
        if let Err(e) = sink.power_off() {
            warn!("Power: display power off failed: {}", e);
        }
    }

    fn flush<F>(&mut self, now: Instant, sink: &mut F)
    where
        F: FrameSink + ?Sized,
    {
        if !self.power.is_on() || !self.redraw.take() {
            return;
        }
        let frame = self.stack.current_screen_mut().render(now);
        if let Err(e) = sink.push_frame(&frame) {
            warn!("Screen: render failed: {}", e);
        }
    }
}
