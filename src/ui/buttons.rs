//! Button input classifier - edges and level samples to button events.
//!
//! Four physical buttons (active-low with pull-up):
//!   - CANCEL - long press on the status screen shuts the host down
//!   - MODE, PAUSE, PLAY - routed to the active screen
//!
//! A falling edge opens a [`PressSession`].  The session is then advanced
//! by [`ButtonClassifier::tick`]: every tick takes at most one level
//! sample, and every [`SAMPLE_WINDOW`] samples the window is judged.  The
//! button counts as released once a window reads released for more than
//! [`RELEASE_CONFIDENCE_PCT`](crate::config::RELEASE_CONFIDENCE_PCT)
//! percent of its samples.  Nothing blocks; the
//! caller decides how often to tick.
//!
//! Only one session is in flight per classifier.  Edges on other buttons
//! that arrive meanwhile are dropped, as are edges less than
//! [`PRESS_GATE`] after the previous session was resolved.

use std::time::Instant;

use heapless::LinearMap;
use log::{debug, info, warn};

use crate::config::{PinAssignment, PRESS_GATE, SAMPLE_INTERVAL, SAMPLE_WINDOW};
use crate::error::Error;
use crate::signal::SignalSource;
use crate::ui::input_logic::{classify_hold, Hold, ReleaseWindow};
use crate::ui::{Button, ButtonEvent, Channel};

/// What happened to an edge handed to [`ButtonClassifier::on_edge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// A press session was opened.
    Accepted,
    /// The channel is not part of the configured channel set.
    Unmapped,
    /// The previous session was resolved less than [`PRESS_GATE`] ago.
    TooSoon,
    /// Another session is still waiting for its release.
    Busy,
}

/// One physical press-and-release cycle being resolved.
#[derive(Clone, Debug)]
pub struct PressSession {
    channel: Channel,
    button: Button,
    pressed_at: Instant,
    last_sample: Instant,
    window: ReleaseWindow,
}

impl PressSession {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn button(&self) -> Button {
        self.button
    }
}

/// Turns raw edges plus level samples into [`ButtonEvent`]s.
pub struct ButtonClassifier {
    channels: LinearMap<Channel, Button, 4>,
    session: Option<PressSession>,
    /// Release time of the last resolved session, emitted or discarded.
    last_resolved: Option<Instant>,
}

impl ButtonClassifier {
    pub fn new(pins: &PinAssignment) -> Self {
        let mut classifier = Self {
            channels: LinearMap::new(),
            session: None,
            last_resolved: None,
        };
        classifier.remap(pins);
        classifier
    }

    /// Replace the channel set, keeping the press gate.
    ///
    /// An in-flight session on a channel that is no longer mapped is dropped.
    pub fn remap(&mut self, pins: &PinAssignment) {
        self.channels.clear();
        for (channel, button) in pins.assigned() {
            // PinAssignment has exactly four roles.
            let _ = self.channels.insert(channel, button);
        }
        if let Some(session) = &self.session {
            if !self.channels.contains_key(&session.channel) {
                self.session = None;
            }
        }
    }

    pub fn button_for(&self, channel: Channel) -> Option<Button> {
        self.channels.get(&channel).copied()
    }

    /// The session waiting for its release, if any.
    pub fn session(&self) -> Option<&PressSession> {
        self.session.as_ref()
    }

    pub fn last_resolved(&self) -> Option<Instant> {
        self.last_resolved
    }

    /// Drop any in-flight session without emitting.
    pub fn abandon(&mut self) {
        self.session = None;
    }

    /// A falling edge arrived on `channel` at `now`.
    pub fn on_edge(&mut self, channel: Channel, now: Instant) -> EdgeOutcome {
        let Some(button) = self.button_for(channel) else {
            return EdgeOutcome::Unmapped;
        };

        if let Some(last) = self.last_resolved {
            if now.saturating_duration_since(last) < PRESS_GATE {
                debug!("Button: {} pressed too soon", button);
                return EdgeOutcome::TooSoon;
            }
        }

        if self.session.is_some() {
            debug!("Button: {} ignored, another press in flight", button);
            return EdgeOutcome::Busy;
        }

        self.session = Some(PressSession {
            channel,
            button,
            pressed_at: now,
            last_sample: now,
            window: ReleaseWindow::new(),
        });
        EdgeOutcome::Accepted
    }

    /// Advance the in-flight session by at most one level sample.
    ///
    /// Returns the event once a session resolves into a real press.  A
    /// read failure abandons the session and is returned to the caller;
    /// the next edge starts over.
    pub fn tick<S>(&mut self, now: Instant, source: &mut S) -> Result<Option<ButtonEvent>, Error>
    where
        S: SignalSource + ?Sized,
    {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        if now.saturating_duration_since(session.last_sample) < SAMPLE_INTERVAL {
            return Ok(None);
        }
        session.last_sample = now;

        let level = match source.read_level(session.channel) {
            Ok(level) => level,
            Err(e) => {
                warn!("Button: {} release detection aborted: {}", session.button, e);
                self.session = None;
                return Err(e);
            }
        };

        let Some(window) = session.window.push(level.is_released()) else {
            return Ok(None);
        };
        if !window.is_release() {
            return Ok(None);
        }

        let pressed_at = session.pressed_at;
        let button = session.button;
        self.session = None;
        self.last_resolved = Some(now);

        let held = now.saturating_duration_since(pressed_at);
        info!(
            "Button: {} pressed for {:.3}s ({:.2}% sure)",
            button,
            held.as_secs_f32(),
            window.confidence_pct()
        );

        Ok(match classify_hold(held) {
            Hold::Noise => {
                info!("Button: ignoring noise on {}", button);
                None
            }
            Hold::Short => Some(ButtonEvent::short(button)),
            Hold::Long => Some(ButtonEvent::long(button)),
        })
    }

    /// Nominal time one release-detection window takes.
    pub fn window_duration() -> core::time::Duration {
        SAMPLE_INTERVAL * u32::from(SAMPLE_WINDOW)
    }
}

#[cfg(test)]
mod tests;
