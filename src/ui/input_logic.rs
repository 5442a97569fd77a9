//! Pure decision helpers for button presses.
//!
//! Kept free of I/O and clocks so the thresholds can be tested on the
//! host with synthetic sample sequences and durations.

use core::time::Duration;

use crate::config::{LONG_PRESS_THRESHOLD, NOISE_THRESHOLD, RELEASE_CONFIDENCE_PCT, SAMPLE_WINDOW};

/// Outcome of one full sampling window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowResult {
    pub released: u16,
    pub samples: u16,
}

impl WindowResult {
    /// Percentage of samples that read the released level.
    pub fn confidence_pct(&self) -> f32 {
        f32::from(self.released) * 100.0 / f32::from(self.samples.max(1))
    }

    /// Strictly more than [`RELEASE_CONFIDENCE_PCT`] of the window read released.
    pub fn is_release(&self) -> bool {
        u32::from(self.released) * 100 > u32::from(RELEASE_CONFIDENCE_PCT) * u32::from(self.samples)
    }
}

/// Running count over one release-detection window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseWindow {
    size: u16,
    samples: u16,
    released: u16,
}

impl ReleaseWindow {
    pub const fn new() -> Self {
        Self::with_size(SAMPLE_WINDOW)
    }

    pub const fn with_size(size: u16) -> Self {
        Self {
            size: if size == 0 { 1 } else { size },
            samples: 0,
            released: 0,
        }
    }

    /// Record one sample.
    ///
    /// Returns the window's result once `size` samples are in, and starts
    /// a fresh window.
    pub fn push(&mut self, released: bool) -> Option<WindowResult> {
        self.samples += 1;
        if released {
            self.released += 1;
        }
        if self.samples < self.size {
            return None;
        }
        let result = WindowResult {
            released: self.released,
            samples: self.samples,
        };
        self.samples = 0;
        self.released = 0;
        Some(result)
    }

    /// Samples taken in the current window so far.
    pub fn pending(&self) -> u16 {
        self.samples
    }
}

impl Default for ReleaseWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// How a resolved hold is classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hold {
    /// Too short to be a real press.
    Noise,
    Short,
    Long,
}

/// Classify a press by how long it was held.
pub fn classify_hold(held: Duration) -> Hold {
    if held < NOISE_THRESHOLD {
        Hold::Noise
    } else if held >= LONG_PRESS_THRESHOLD {
        Hold::Long
    } else {
        Hold::Short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `seq` into a window, returning the index of the sample that
    /// completed the first releasing window.
    fn first_release(window: &mut ReleaseWindow, seq: impl IntoIterator<Item = bool>) -> Option<usize> {
        for (i, released) in seq.into_iter().enumerate() {
            if let Some(result) = window.push(released) {
                if result.is_release() {
                    return Some(i);
                }
            }
        }
        None
    }

    #[test]
    fn hold_thresholds() {
        assert_eq!(classify_hold(Duration::ZERO), Hold::Noise);
        assert_eq!(classify_hold(Duration::from_millis(199)), Hold::Noise);
        assert_eq!(classify_hold(Duration::from_millis(200)), Hold::Short);
        assert_eq!(classify_hold(Duration::from_millis(4999)), Hold::Short);
        assert_eq!(classify_hold(Duration::from_secs(5)), Hold::Long);
        assert_eq!(classify_hold(Duration::from_secs(60)), Hold::Long);
    }

    #[test]
    fn exactly_fifty_one_percent_is_not_a_release() {
        let mut window = ReleaseWindow::new();
        let seq = (0..100).map(|i| i < 51);
        assert_eq!(first_release(&mut window, seq), None);
    }

    #[test]
    fn fifty_two_percent_is_a_release() {
        let mut window = ReleaseWindow::new();
        let seq = (0..100).map(|i| i < 52);
        assert_eq!(first_release(&mut window, seq), Some(99));
    }

    #[test]
    fn release_waits_for_the_end_of_the_window() {
        // Fully released from the first sample, but the verdict only
        // comes with the 100th sample.
        let mut window = ReleaseWindow::new();
        for _ in 0..99 {
            assert_eq!(window.push(true), None);
        }
        let result = window.push(true).unwrap();
        assert!(result.is_release());
        assert_eq!(result.confidence_pct(), 100.0);
    }

    #[test]
    fn detection_stops_at_first_qualifying_window() {
        // Window 1: 30 % released, window 2: 51 %, window 3: 80 %.
        let w1 = (0..100).map(|i| i < 30);
        let w2 = (0..100).map(|i| i < 51);
        let w3 = (0..100).map(|i| i < 80);
        let mut window = ReleaseWindow::new();
        let at = first_release(&mut window, w1.chain(w2).chain(w3));
        assert_eq!(at, Some(299));
    }

    #[test]
    fn window_resets_after_each_verdict() {
        let mut window = ReleaseWindow::with_size(4);
        assert_eq!(window.push(false), None);
        assert_eq!(window.push(false), None);
        assert_eq!(window.pending(), 2);
        assert_eq!(window.push(true), None);
        let held = window.push(true).unwrap();
        assert_eq!(held, WindowResult { released: 2, samples: 4 });
        assert!(!held.is_release());
        assert_eq!(window.pending(), 0);
    }
}
