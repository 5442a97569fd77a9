//! Screen capability set and the directive vocabulary screens answer with.

use core::ops::BitOr;
use std::time::Instant;

use embedded_graphics::geometry::Size;

use super::display::Frame;
use super::ButtonEvent;

/// What a screen asks of the controller after handling a button.
///
/// A small bitset over exactly two members.  The empty set and
/// [`Directives::IGNORE`] both mean "no immediate redraw owed".
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Directives(u8);

impl Directives {
    /// Render now, do not wait for the next periodic tick.
    pub const DRAW: Self = Self(1 << 0);
    /// The event was absorbed on purpose.
    pub const IGNORE: Self = Self(1 << 1);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when the event owes an immediate redraw.
    pub const fn redraw_now(self) -> bool {
        self.contains(Self::DRAW)
    }
}

impl BitOr for Directives {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::fmt::Debug for Directives {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut set = f.debug_set();
        if self.contains(Self::DRAW) {
            set.entry(&"DRAW");
        }
        if self.contains(Self::IGNORE) {
            set.entry(&"IGNORE");
        }
        set.finish()
    }
}

/// The closed set of screen variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenKind {
    Status,
    Shutdown,
}

/// Slot a screen fills to install an overlay on top of itself.
///
/// Handed to [`Screen::handle_button`]; the controller moves whatever was
/// placed here into its overlay position once the handler returns.
#[derive(Default)]
pub struct OverlaySlot {
    screen: Option<Box<dyn Screen>>,
}

impl OverlaySlot {
    /// Install `screen` as the overlay.
    pub fn set_subscreen(&mut self, screen: Box<dyn Screen>) {
        self.screen = Some(screen);
    }

    pub(crate) fn take(&mut self) -> Option<Box<dyn Screen>> {
        self.screen.take()
    }
}

/// Something the panel can show and route buttons to.
pub trait Screen: Send {
    fn kind(&self) -> ScreenKind;

    /// Fixed dimensions of the frames this screen produces.
    fn size(&self) -> Size;

    /// Produce the current frame.  Slow sources are expected to cache.
    fn render(&mut self, now: Instant) -> Frame;

    /// React to a classified button press.
    fn handle_button(&mut self, _event: &ButtonEvent, _overlay: &mut OverlaySlot) -> Directives {
        Directives::empty()
    }
}
