//! Shutdown screen.
//!
//! Installed by the status screen when CANCEL is held for 5+ seconds.
//! Constructing it starts the shutdown command; from then on it absorbs
//! every button and stays on top until the host goes down.

use std::time::Instant;

use embedded_graphics::geometry::Size;
use log::{error, info};

use crate::config::TEXT_ROW_HEIGHT;
use crate::system::ShutdownTrigger;
use crate::ui::display::Frame;
use crate::ui::{ButtonEvent, Directives, OverlaySlot, Screen, ScreenKind};

pub struct ShutdownScreen {
    size: Size,
    message: String,
    message_y: i32,
}

impl ShutdownScreen {
    /// Trigger `command` and build the screen reporting the outcome.
    pub fn new(size: Size, trigger: &dyn ShutdownTrigger, command: &str) -> Self {
        match trigger.trigger(command) {
            Ok(()) => {
                info!("Screen: shutdown started");
                Self {
                    size,
                    message: "Shutting down".into(),
                    message_y: (size.height as i32 - TEXT_ROW_HEIGHT) / 2,
                }
            }
            Err(e) => {
                error!("Screen: shutdown failed: {}", e);
                Self {
                    size,
                    message: format!("** Error **\n{e}"),
                    message_y: 0,
                }
            }
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Top row of the message.
    pub fn message_y(&self) -> i32 {
        self.message_y
    }
}

impl Screen for ShutdownScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Shutdown
    }

    fn size(&self) -> Size {
        self.size
    }

    fn render(&mut self, _now: Instant) -> Frame {
        let mut frame = Frame::new(self.size);
        frame.text_centered(self.message_y, &self.message);
        frame
    }

    fn handle_button(&mut self, _event: &ButtonEvent, _overlay: &mut OverlaySlot) -> Directives {
        Directives::IGNORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ui::Button;

    struct Refuses;

    impl ShutdownTrigger for Refuses {
        fn trigger(&self, _command: &str) -> Result<(), Error> {
            Err(Error::Shutdown("permission denied".into()))
        }
    }

    struct Accepts;

    impl ShutdownTrigger for Accepts {
        fn trigger(&self, _command: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    const PANEL: Size = Size::new(128, 64);

    #[test]
    fn success_message_is_vertically_centered() {
        let mut screen = ShutdownScreen::new(PANEL, &Accepts, "poweroff");
        assert_eq!(screen.message(), "Shutting down");
        assert_eq!(screen.message_y(), 27);

        let frame = screen.render(Instant::now());
        assert!(frame.has_ink_in_rows(27..36));
        assert!(!frame.has_ink_in_rows(0..27));
        assert!(!frame.has_ink_in_rows(36..64));
    }

    #[test]
    fn failure_message_moves_to_top() {
        let mut screen = ShutdownScreen::new(PANEL, &Refuses, "poweroff");
        assert_eq!(screen.message(), "** Error **\npermission denied");
        assert_eq!(screen.message_y(), 0);

        let frame = screen.render(Instant::now());
        assert!(frame.has_ink_in_rows(0..9));
        assert!(frame.has_ink_in_rows(9..18));
        assert!(!frame.has_ink_in_rows(18..64));
    }

    #[test]
    fn every_button_is_ignored() {
        let mut screen = ShutdownScreen::new(PANEL, &Accepts, "poweroff");
        for label in ["cancel", "cancel_long", "mode", "pause_long", "play"] {
            let event = ButtonEvent::parse(label).unwrap();
            let mut slot = OverlaySlot::default();
            assert_eq!(screen.handle_button(&event, &mut slot), Directives::IGNORE);
            assert!(slot.take().is_none());
        }
        let mut slot = OverlaySlot::default();
        let event = ButtonEvent::long(Button::Cancel);
        assert!(!screen.handle_button(&event, &mut slot).redraw_now());
    }
}
