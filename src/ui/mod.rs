//! User interface subsystem - OLED display + physical buttons.
//!
//! Button edges are turned into [`ButtonEvent`]s by the classifier in
//! [`buttons`]; the [`controller`] routes those events to the active
//! [`Screen`] and tells the caller when a redraw is owed.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C
//! - **Buttons**: 4 tactile switches (CANCEL, MODE, PAUSE, PLAY),
//!   active-low with pull-up, noise filtered by release confidence

pub mod buttons;
pub mod controller;
pub mod display;
pub mod input_logic;
pub mod screen;
pub mod shutdown;
pub mod status;

use core::fmt;

use crate::config::LONG_SUFFIX;

pub use screen::{Directives, OverlaySlot, Screen, ScreenKind};

/// Opaque input-line identifier (a GPIO number in the host's numbering).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(pub u32);

/// The four panel roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Cancel,
    Mode,
    Pause,
    Play,
}

impl Button {
    /// Base label used in events.
    pub const fn label(self) -> &'static str {
        match self {
            Button::Cancel => "cancel",
            Button::Mode => "mode",
            Button::Pause => "pause",
            Button::Play => "play",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "cancel" => Some(Button::Cancel),
            "mode" => Some(Button::Mode),
            "pause" => Some(Button::Pause),
            "play" => Some(Button::Play),
            _ => None,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Longest label: `"cancel_long"`.
pub type Label = heapless::String<16>;

/// A classified button press.
///
/// The label is the button's base label, with [`LONG_SUFFIX`] appended
/// when the button was held past the long-press threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonEvent {
    button: Button,
    long: bool,
    label: Label,
}

impl ButtonEvent {
    /// Short-press event for `button`.
    pub fn short(button: Button) -> Self {
        Self::new(button, false)
    }

    /// Long-press event for `button`.
    pub fn long(button: Button) -> Self {
        Self::new(button, true)
    }

    fn new(button: Button, long: bool) -> Self {
        let mut label = Label::new();
        // Both parts are ASCII and fit in 16 bytes.
        let _ = label.push_str(button.label());
        if long {
            let _ = label.push_str(LONG_SUFFIX);
        }
        Self { button, long, label }
    }

    /// Parse a label such as `"mode"` or `"cancel_long"`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.strip_suffix(LONG_SUFFIX) {
            Some(base) => Button::from_label(base).map(Self::long),
            None => Button::from_label(label).map(Self::short),
        }
    }

    pub fn button(&self) -> Button {
        self.button
    }

    pub fn is_long(&self) -> bool {
        self.long
    }

    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
