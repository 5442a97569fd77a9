//! Signal source - GPIO lines feeding the button classifier.
//!
//! The panel never talks to GPIO directly.  It goes through
//! [`SignalSource`], which offers level reads and falling-edge detection
//! with a minimum re-trigger spacing ("bounce time").  Edges are collected
//! by [`SignalSource::poll_edges`] and dispatched from a single thread, so
//! two release detections can never race on shared state.
//!
//! [`PinBank`] implements the trait over any `embedded-hal` input pins.
//! Buttons are active-low: a pressed button pulls its line low.
//!
//! Channel ids reach the line driver exactly as configured.  When they are
//! physical header pins, [`Numbered`] maps them onto kernel lines.

use core::time::Duration;
use std::time::Instant;

use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::config::PinNumbering;
use crate::error::Error;
use crate::ui::Channel;

/// Electrical level of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Pull-up wiring: an idle (released) button reads high.
    pub fn is_released(self) -> bool {
        self == Level::High
    }
}

/// Which transition an edge detector fires on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// High → low (button pressed).
    Falling,
    /// Low → high (button released).
    Rising,
}

impl Edge {
    fn matches(self, from: Level, to: Level) -> bool {
        match self {
            Edge::Falling => from == Level::High && to == Level::Low,
            Edge::Rising => from == Level::Low && to == Level::High,
        }
    }
}

/// Per-line level reads and edge detection.
pub trait SignalSource {
    /// Claim `channel` as an input line.
    fn configure_input(&mut self, channel: Channel) -> Result<(), Error>;

    /// Start reporting `edge` transitions on `channel`, at most one per `bounce`.
    fn register_edge(&mut self, channel: Channel, edge: Edge, bounce: Duration)
        -> Result<(), Error>;

    /// Stop reporting edges on `channel`.
    fn unregister(&mut self, channel: Channel) -> Result<(), Error>;

    /// Release `channel` back to the system.
    fn cleanup(&mut self, channel: Channel) -> Result<(), Error>;

    fn read_level(&mut self, channel: Channel) -> Result<Level, Error>;

    /// Append the channels whose registered edge fired since the last poll.
    fn poll_edges(&mut self, now: Instant, edges: &mut Vec<Channel>);
}

/// Opens and releases the physical lines behind a [`PinBank`].
pub trait LineDriver {
    type Line: InputPin;

    fn open(&mut self, channel: Channel) -> Result<Self::Line, Error>;

    fn release(&mut self, channel: Channel, line: Self::Line) -> Result<(), Error>;
}

struct Detection {
    edge: Edge,
    bounce: Duration,
    last_fired: Option<Instant>,
}

impl Detection {
    fn accepts(&self, now: Instant) -> bool {
        self.last_fired
            .map_or(true, |t| now.saturating_duration_since(t) >= self.bounce)
    }
}

struct LineState<L> {
    channel: Channel,
    line: L,
    detection: Option<Detection>,
    last_level: Option<Level>,
    /// Set while edge polling cannot read the line.
    failing: bool,
}

/// Signal source over `embedded-hal` input pins, edges found by sampling.
pub struct PinBank<D: LineDriver> {
    driver: D,
    lines: Vec<LineState<D::Line>>,
}

impl<D: LineDriver> PinBank<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            lines: Vec::new(),
        }
    }

    /// Channels currently configured as inputs.
    pub fn configured(&self) -> impl Iterator<Item = Channel> + '_ {
        self.lines.iter().map(|l| l.channel)
    }

    /// Whether edge detection is registered on `channel`.
    pub fn is_registered(&self, channel: Channel) -> bool {
        self.state(channel).is_some_and(|l| l.detection.is_some())
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn state(&self, channel: Channel) -> Option<&LineState<D::Line>> {
        self.lines.iter().find(|l| l.channel == channel)
    }

    fn state_mut(&mut self, channel: Channel) -> Result<&mut LineState<D::Line>, Error> {
        self.lines
            .iter_mut()
            .find(|l| l.channel == channel)
            .ok_or(Error::NotConfigured(channel))
    }
}

fn read<L: InputPin>(channel: Channel, line: &mut L) -> Result<Level, Error> {
    match line.is_low() {
        Ok(true) => Ok(Level::Low),
        Ok(false) => Ok(Level::High),
        Err(_) => Err(Error::Gpio(channel)),
    }
}

impl<D: LineDriver> SignalSource for PinBank<D> {
    fn configure_input(&mut self, channel: Channel) -> Result<(), Error> {
        if self.state(channel).is_some() {
            return Ok(());
        }
        let line = self.driver.open(channel)?;
        self.lines.push(LineState {
            channel,
            line,
            detection: None,
            last_level: None,
            failing: false,
        });
        debug!("GPIO: configured {} as input", channel.0);
        Ok(())
    }

    fn register_edge(
        &mut self,
        channel: Channel,
        edge: Edge,
        bounce: Duration,
    ) -> Result<(), Error> {
        let state = self.state_mut(channel)?;
        // Baseline so the current level does not count as a transition.
        state.last_level = Some(read(channel, &mut state.line)?);
        state.detection = Some(Detection {
            edge,
            bounce,
            last_fired: None,
        });
        Ok(())
    }

    fn unregister(&mut self, channel: Channel) -> Result<(), Error> {
        if let Ok(state) = self.state_mut(channel) {
            state.detection = None;
        }
        Ok(())
    }

    fn cleanup(&mut self, channel: Channel) -> Result<(), Error> {
        let Some(pos) = self.lines.iter().position(|l| l.channel == channel) else {
            return Ok(());
        };
        let state = self.lines.remove(pos);
        self.driver.release(channel, state.line)
    }

    fn read_level(&mut self, channel: Channel) -> Result<Level, Error> {
        let state = self.state_mut(channel)?;
        read(channel, &mut state.line)
    }

    fn poll_edges(&mut self, now: Instant, edges: &mut Vec<Channel>) {
        for state in &mut self.lines {
            let Some(detection) = state.detection.as_mut() else {
                continue;
            };
            let level = match read(state.channel, &mut state.line) {
                Ok(level) => level,
                Err(e) => {
                    if !state.failing {
                        warn!("GPIO: edge poll failed: {}", e);
                        state.failing = true;
                    }
                    continue;
                }
            };
            if state.failing {
                info!("GPIO: {} readable again", state.channel.0);
                state.failing = false;
            }
            let previous = state.last_level.replace(level);
            let Some(previous) = previous else {
                continue;
            };
            if detection.edge.matches(previous, level) && detection.accepts(now) {
                detection.last_fired = Some(now);
                edges.push(state.channel);
            }
        }
    }
}

/// Header pin for each BCM GPIO number (index = BCM number, 0 = none).
const BCM_TO_BOARD: [u8; 28] = [
    0, 0, 0, 0, 7, 29, 31, 0, 0, 0, 0, 0, 32, 33, 0, 0, 36, 11, 12, 35, 38, 40, 15, 16, 18, 22, 37,
    13,
];

/// BCM GPIO number wired to a physical header pin.
///
/// Only the lines usable as panel inputs are mapped.
pub fn board_to_bcm(pin: u32) -> Option<u32> {
    if pin == 0 {
        return None;
    }
    BCM_TO_BOARD
        .iter()
        .position(|&board| u32::from(board) == pin)
        .and_then(|bcm| u32::try_from(bcm).ok())
}

/// Line driver taking channel ids in a given numbering.
///
/// The kernel numbers lines by BCM GPIO.  With [`PinNumbering::Board`] every
/// channel is mapped from its header pin before it reaches `inner`; with
/// [`PinNumbering::Bcm`] channels pass through.
pub struct Numbered<D> {
    inner: D,
    numbering: PinNumbering,
}

impl<D: LineDriver> Numbered<D> {
    pub fn new(inner: D, numbering: PinNumbering) -> Self {
        Self { inner, numbering }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    /// Kernel line behind `channel`.
    pub fn kernel_line(&self, channel: Channel) -> Result<Channel, Error> {
        match self.numbering {
            PinNumbering::Bcm => Ok(channel),
            PinNumbering::Board => board_to_bcm(channel.0)
                .map(Channel)
                .ok_or(Error::UnmappedChannel(channel)),
        }
    }
}

impl<D: LineDriver> LineDriver for Numbered<D> {
    type Line = D::Line;

    fn open(&mut self, channel: Channel) -> Result<D::Line, Error> {
        let line = self.kernel_line(channel)?;
        if line != channel {
            debug!("GPIO: header pin {} is GPIO {}", channel.0, line.0);
        }
        self.inner.open(line)
    }

    fn release(&mut self, channel: Channel, line: D::Line) -> Result<(), Error> {
        let kernel = self.kernel_line(channel)?;
        self.inner.release(kernel, line)
    }
}
