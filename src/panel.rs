//! Panel device context - owns the input lines and the classifier.
//!
//! [`Panel::setup`] claims the configured lines, [`Panel::poll`] is
//! called every [`SAMPLE_INTERVAL`](crate::config::SAMPLE_INTERVAL) from
//! the input loop, and [`Panel::teardown`] gives the lines back.

use std::time::Instant;

use log::{debug, info, warn};

use crate::config::{PanelConfig, PinAssignment};
use crate::error::Error;
use crate::signal::{Edge, SignalSource};
use crate::ui::buttons::{ButtonClassifier, EdgeOutcome};
use crate::ui::{ButtonEvent, Channel};

/// Outcome of [`Panel::teardown`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Lines given back to the system.
    pub released: Vec<Channel>,
    /// Lines that could not be released, with the reason.
    pub failures: Vec<(Channel, Error)>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Four buttons on a [`SignalSource`].
pub struct Panel<S: SignalSource> {
    source: S,
    classifier: ButtonClassifier,
    live: Vec<Channel>,
    edges: Vec<Channel>,
}

impl<S: SignalSource> Panel<S> {
    /// Wrap `source`.  No line is claimed until [`setup`](Self::setup).
    pub fn new(source: S) -> Self {
        let unassigned = PinAssignment {
            cancel: None,
            mode: None,
            pause: None,
            play: None,
        };
        Self {
            source,
            classifier: ButtonClassifier::new(&unassigned),
            live: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Apply `config`: claim every assigned line, then release the lines
    /// the previous configuration used but this one does not.
    pub fn setup(&mut self, config: &PanelConfig) -> Result<(), Error> {
        config.validate()?;
        let pins = config.pins;

        for (channel, button) in pins.assigned() {
            self.source.configure_input(channel)?;
            if let Err(e) = self.source.unregister(channel) {
                debug!("Panel: no stale detection on GPIO {}: {}", channel.0, e);
            }
            self.source
                .register_edge(channel, Edge::Falling, config.debounce)?;
            if !self.live.contains(&channel) {
                self.live.push(channel);
            }
            info!("Panel: {} on GPIO {}", button, channel.0);
        }

        let assigned: heapless::Vec<Channel, 4> = pins.assigned().map(|(c, _)| c).collect();
        let stale: Vec<Channel> = self
            .live
            .iter()
            .copied()
            .filter(|c| !assigned.contains(c))
            .collect();
        for channel in stale {
            match self.release(channel) {
                Ok(()) => self.live.retain(|&c| c != channel),
                Err(e) => warn!("Panel: releasing GPIO {} failed: {}", channel.0, e),
            }
        }

        self.classifier.remap(&pins);
        Ok(())
    }

    /// Feed new edges to the classifier and advance it by one tick.
    pub fn poll(&mut self, now: Instant) -> Result<Option<ButtonEvent>, Error> {
        self.edges.clear();
        self.source.poll_edges(now, &mut self.edges);
        for &channel in &self.edges {
            if self.classifier.on_edge(channel, now) != EdgeOutcome::Accepted {
                continue;
            }
            if let Some(session) = self.classifier.session() {
                debug!(
                    "Panel: {} press started on GPIO {}",
                    session.button(),
                    session.channel().0
                );
            }
        }
        self.classifier.tick(now, &mut self.source)
    }

    /// Release every live line, continuing past failures.
    ///
    /// Lines that fail to release stay live so a later teardown can retry.
    pub fn teardown(&mut self) -> TeardownReport {
        self.classifier.abandon();
        let mut report = TeardownReport::default();
        for channel in core::mem::take(&mut self.live) {
            match self.release(channel) {
                Ok(()) => report.released.push(channel),
                Err(e) => {
                    warn!("Panel: releasing GPIO {} failed: {}", channel.0, e);
                    self.live.push(channel);
                    report.failures.push((channel, e));
                }
            }
        }
        info!(
            "Panel: teardown released {} line(s), {} failure(s)",
            report.released.len(),
            report.failures.len()
        );
        report
    }

    fn release(&mut self, channel: Channel) -> Result<(), Error> {
        if let Err(e) = self.source.unregister(channel) {
            warn!("Panel: unregistering GPIO {} failed: {}", channel.0, e);
        }
        self.source.cleanup(channel)
    }

    /// Lines currently claimed by the panel.
    pub fn live_channels(&self) -> &[Channel] {
        &self.live
    }

    pub fn classifier(&self) -> &ButtonClassifier {
        &self.classifier
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
