//! Unit tests for the button classifier.
//!
//! Time is synthetic: every test picks a press instant and advances it in
//! 1 ms steps, so the window boundaries are exact.

use core::time::Duration;
use std::time::Instant;

use super::{ButtonClassifier, EdgeOutcome};
use crate::config::PinAssignment;
use crate::error::Error;
use crate::signal::{Edge, Level, SignalSource};
use crate::ui::{Button, ButtonEvent, Channel};

const CANCEL: Channel = Channel(16);
const MODE: Channel = Channel(17);
const PAUSE: Channel = Channel(18);

/// Lines that read low (pressed) until their release instant.
struct HeldLines {
    now: Instant,
    release_at: Vec<(Channel, Instant)>,
    fail_reads: bool,
    reads: usize,
}

impl HeldLines {
    fn new(now: Instant) -> Self {
        Self {
            now,
            release_at: Vec::new(),
            fail_reads: false,
            reads: 0,
        }
    }

    fn hold(&mut self, channel: Channel, until: Instant) {
        self.release_at.retain(|(c, _)| *c != channel);
        self.release_at.push((channel, until));
    }
}

impl SignalSource for HeldLines {
    fn configure_input(&mut self, _channel: Channel) -> Result<(), Error> {
        Ok(())
    }

    fn register_edge(&mut self, _: Channel, _: Edge, _: Duration) -> Result<(), Error> {
        Ok(())
    }

    fn unregister(&mut self, _channel: Channel) -> Result<(), Error> {
        Ok(())
    }

    fn cleanup(&mut self, _channel: Channel) -> Result<(), Error> {
        Ok(())
    }

    fn read_level(&mut self, channel: Channel) -> Result<Level, Error> {
        self.reads += 1;
        if self.fail_reads {
            return Err(Error::Gpio(channel));
        }
        let pressed = self
            .release_at
            .iter()
            .any(|&(c, until)| c == channel && self.now < until);
        Ok(if pressed { Level::Low } else { Level::High })
    }

    fn poll_edges(&mut self, _now: Instant, _edges: &mut Vec<Channel>) {}
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn classifier() -> ButtonClassifier {
    ButtonClassifier::new(&PinAssignment::default())
}

/// Tick once per millisecond for `span_ms`, collecting `(offset_ms, event)`.
fn drive(
    classifier: &mut ButtonClassifier,
    lines: &mut HeldLines,
    from: Instant,
    span_ms: u64,
) -> Vec<(u64, ButtonEvent)> {
    let mut events = Vec::new();
    for k in 1..=span_ms {
        let now = from + ms(k);
        lines.now = now;
        if let Some(event) = classifier.tick(now, lines).unwrap() {
            events.push((k, event));
        }
    }
    events
}

/// Press `channel` at `t0`, hold it for `hold_ms`, run for `span_ms`.
fn press(
    classifier: &mut ButtonClassifier,
    lines: &mut HeldLines,
    channel: Channel,
    t0: Instant,
    hold_ms: u64,
    span_ms: u64,
) -> Vec<(u64, ButtonEvent)> {
    lines.hold(channel, t0 + ms(hold_ms));
    assert_eq!(classifier.on_edge(channel, t0), EdgeOutcome::Accepted);
    drive(classifier, lines, t0, span_ms)
}

// ═══════════════════════════════════════════════════════════════════════════
// Channel mapping
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn unmapped_channel_has_no_effect() {
    let mut c = classifier();
    let t0 = Instant::now();
    assert_eq!(c.on_edge(Channel(5), t0), EdgeOutcome::Unmapped);
    assert!(c.session().is_none());
    assert!(c.last_resolved().is_none());

    let mut lines = HeldLines::new(t0);
    assert!(drive(&mut c, &mut lines, t0, 200).is_empty());
    assert_eq!(lines.reads, 0);
}

#[test]
fn remap_drops_session_on_removed_channel() {
    let mut c = classifier();
    let t0 = Instant::now();
    assert_eq!(c.on_edge(MODE, t0), EdgeOutcome::Accepted);

    let pins = PinAssignment {
        mode: None,
        ..PinAssignment::default()
    };
    c.remap(&pins);
    assert!(c.session().is_none());
    assert_eq!(c.button_for(MODE), None);
    assert_eq!(c.button_for(CANCEL), Some(Button::Cancel));
}

// ═══════════════════════════════════════════════════════════════════════════
// Hold duration classification
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn short_press_emits_base_label() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    // Released at 300 ms; window 4 (301..=400 ms) is fully released.
    let events = press(&mut c, &mut lines, MODE, t0, 300, 1000);
    assert_eq!(events, vec![(400, ButtonEvent::short(Button::Mode))]);
    assert_eq!(events[0].1.label(), "mode");
}

#[test]
fn long_press_emits_suffixed_label() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    let events = press(&mut c, &mut lines, CANCEL, t0, 5000, 6000);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, 5100);
    assert_eq!(events[0].1.label(), "cancel_long");
}

#[test]
fn hold_resolving_at_exactly_five_seconds_is_long() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    // Window ending at 4900 ms reads 51 % released (not enough); the
    // window ending at 5000 ms resolves the press at exactly 5.0 s.
    let events = press(&mut c, &mut lines, CANCEL, t0, 4850, 6000);
    assert_eq!(events, vec![(5000, ButtonEvent::long(Button::Cancel))]);
}

#[test]
fn hold_just_under_five_seconds_is_short() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    let events = press(&mut c, &mut lines, CANCEL, t0, 4700, 6000);
    assert_eq!(events, vec![(4800, ButtonEvent::short(Button::Cancel))]);
}

#[test]
fn noise_is_discarded() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    let events = press(&mut c, &mut lines, MODE, t0, 10, 500);
    assert!(events.is_empty());
    assert!(c.session().is_none());
    assert_eq!(c.last_resolved(), Some(t0 + ms(100)));
}

// ═══════════════════════════════════════════════════════════════════════════
// Release detection
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn release_needs_strictly_more_than_fifty_one_percent() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    // Released at 50 ms: window 1 has samples 50..=100 released, 51 %.
    let events = press(&mut c, &mut lines, MODE, t0, 50, 1000);
    assert_eq!(events, vec![(200, ButtonEvent::short(Button::Mode))]);
}

#[test]
fn release_is_recognized_at_window_end_not_earlier() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    lines.hold(PAUSE, t0 + ms(1_000));
    assert_eq!(c.on_edge(PAUSE, t0), EdgeOutcome::Accepted);

    // Released at 1000 ms but the window in progress only closes at 1100 ms.
    assert!(drive(&mut c, &mut lines, t0, 1_099).is_empty());
    let session = c.session().unwrap();
    assert_eq!(session.button(), Button::Pause);
    assert_eq!(session.channel(), PAUSE);
    let events = drive(&mut c, &mut lines, t0 + ms(1_099), 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1, ButtonEvent::short(Button::Pause));
}

#[test]
fn at_most_one_sample_per_interval() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    lines.hold(MODE, t0 + ms(1_000));
    c.on_edge(MODE, t0);

    // Same instant as the press: too early for the first sample.
    assert_eq!(c.tick(t0, &mut lines), Ok(None));
    assert_eq!(lines.reads, 0);

    let t1 = t0 + ms(1);
    lines.now = t1;
    assert_eq!(c.tick(t1, &mut lines), Ok(None));
    assert_eq!(c.tick(t1, &mut lines), Ok(None));
    assert_eq!(lines.reads, 1);
}

#[test]
fn read_failure_abandons_session() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    lines.fail_reads = true;
    c.on_edge(MODE, t0);

    let t1 = t0 + ms(1);
    assert_eq!(c.tick(t1, &mut lines), Err(Error::Gpio(MODE)));
    assert!(c.session().is_none());
    assert!(c.last_resolved().is_none());

    // The next edge is processed normally.
    lines.fail_reads = false;
    let t2 = t0 + ms(2);
    let events = press(&mut c, &mut lines, MODE, t2, 300, 1000);
    assert_eq!(events, vec![(400, ButtonEvent::short(Button::Mode))]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Press gate and single flight
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn gate_is_measured_from_resolution() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    let events = press(&mut c, &mut lines, MODE, t0, 300, 500);
    assert_eq!(events.len(), 1);
    // Resolved at 400 ms: edges before 900 ms are dropped.
    assert_eq!(c.on_edge(MODE, t0 + ms(850)), EdgeOutcome::TooSoon);
    assert!(c.session().is_none());
    assert_eq!(c.on_edge(MODE, t0 + ms(900)), EdgeOutcome::Accepted);
}

#[test]
fn discarded_noise_still_gates_next_press() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    assert!(press(&mut c, &mut lines, CANCEL, t0, 10, 150).is_empty());
    // Noise resolved at 100 ms.
    assert_eq!(c.on_edge(CANCEL, t0 + ms(400)), EdgeOutcome::TooSoon);
    assert_eq!(c.on_edge(MODE, t0 + ms(599)), EdgeOutcome::TooSoon);
    assert_eq!(c.on_edge(MODE, t0 + ms(600)), EdgeOutcome::Accepted);
}

#[test]
fn second_button_is_dropped_while_first_in_flight() {
    let mut c = classifier();
    let t0 = Instant::now();
    let mut lines = HeldLines::new(t0);
    lines.hold(CANCEL, t0 + ms(300));
    lines.hold(MODE, t0 + ms(300));
    assert_eq!(c.on_edge(CANCEL, t0), EdgeOutcome::Accepted);
    assert_eq!(c.on_edge(MODE, t0 + ms(20)), EdgeOutcome::Busy);

    let events = drive(&mut c, &mut lines, t0, 1000);
    assert_eq!(events, vec![(400, ButtonEvent::short(Button::Cancel))]);
}

#[test]
fn window_duration_is_nominal() {
    assert_eq!(ButtonClassifier::window_duration(), ms(100));
}
