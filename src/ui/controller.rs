//! Screen stack - a primary screen plus at most one overlay.
//!
//! Button events go to the top-most screen.  The primary screen can
//! install an overlay while handling an event; the overlay then stays on
//! top for good and cannot be replaced.

use log::{debug, info};

use crate::ui::{ButtonEvent, Directives, OverlaySlot, Screen};

pub struct ScreenStack {
    primary: Box<dyn Screen>,
    overlay: Option<Box<dyn Screen>>,
}

impl ScreenStack {
    /// Start with `primary` and no overlay.
    pub fn install(primary: Box<dyn Screen>) -> Self {
        Self {
            primary,
            overlay: None,
        }
    }

    /// Route `event` to the top-most screen.
    pub fn handle_event(&mut self, event: &ButtonEvent) -> Directives {
        let mut slot = OverlaySlot::default();
        let directives = self.current_screen_mut().handle_button(event, &mut slot);

        if let Some(screen) = slot.take() {
            if self.overlay.is_some() {
                debug!("Screen: {:?} overlay dropped, overlay is terminal", screen.kind());
            } else {
                info!("Screen: {:?} overlay installed", screen.kind());
                self.overlay = Some(screen);
            }
        }
        directives
    }

    /// Overlay if present, otherwise the primary screen.
    pub fn current_screen(&self) -> &dyn Screen {
        match &self.overlay {
            Some(overlay) => overlay.as_ref(),
            None => self.primary.as_ref(),
        }
    }

    pub fn current_screen_mut(&mut self) -> &mut dyn Screen {
        match &mut self.overlay {
            Some(overlay) => overlay.as_mut(),
            None => self.primary.as_mut(),
        }
    }

    pub fn is_overlaid(&self) -> bool {
        self.overlay.is_some()
    }
}
