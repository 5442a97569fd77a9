//! Display power - turns the OLED off after a period without input.
//!
//! OLED pixels age with use, so a panel that sits untouched for
//! [`DisplayTimeout::after`] goes dark.  The first button press after
//! that only wakes the display; it is not handed to the screen.

use std::time::Instant;

use log::info;

use crate::config::DisplayTimeout;
use crate::power_logic;

/// Power state of the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

/// Tracks input activity and decides when the display sleeps.
pub struct DisplayPower {
    state: PowerState,
    timeout: DisplayTimeout,
    last_activity: Instant,
}

impl DisplayPower {
    pub fn new(timeout: DisplayTimeout, now: Instant) -> Self {
        Self {
            state: PowerState::On,
            timeout,
            last_activity: now,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == PowerState::On
    }

    /// Record a button event.
    ///
    /// Returns `true` when the event woke the display, in which case the
    /// caller should consume it.
    pub fn activity(&mut self, now: Instant) -> bool {
        self.last_activity = now;
        if self.state == PowerState::Off {
            info!("Power: waking display");
            self.state = PowerState::On;
            return true;
        }
        false
    }

    /// Periodic tick.  Returns the new state if it changed.
    pub fn tick(&mut self, now: Instant) -> Option<PowerState> {
        let idle = now.saturating_duration_since(self.last_activity);
        let new_state = if power_logic::screen_should_be_on(self.timeout, idle) {
            PowerState::On
        } else {
            PowerState::Off
        };

        if new_state == self.state {
            return None;
        }
        info!("Power: {:?} -> {:?} after {}s idle", self.state, new_state, idle.as_secs());
        self.state = new_state;
        Some(new_state)
    }
}
