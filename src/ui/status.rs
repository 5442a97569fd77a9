//! Host status screen - address, load, memory and filesystem usage.
//!
//! Layout (one 9 px text row each):
//! ```text
//! Row 0: network address, centered
//! Row 1: CPU: 0.42, 0.35, 0.30
//! Row 2: Mem: 312/3794 MB 8.2%
//! Row 3+: one row per configured filesystem
//! ```

use std::sync::Arc;
use std::time::Instant;

use embedded_graphics::geometry::Size;
use log::info;

use crate::config::TEXT_ROW_HEIGHT;
use crate::system::{LoadAverage, ShutdownTrigger, StatsCache, Usage};
use crate::ui::display::Frame;
use crate::ui::shutdown::ShutdownScreen;
use crate::ui::{Button, ButtonEvent, Directives, OverlaySlot, Screen, ScreenKind};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Format a usage row as `prefix: used/total unit pct%`.
///
/// The unit is the largest of bytes, kB, MB and GB that `total` reaches;
/// both figures are truncated to whole units.
pub fn resource_usage(prefix: &str, usage: Option<Usage>) -> String {
    let Some(Usage { used, total }) = usage else {
        return format!("{prefix}: unavailable");
    };

    let percent = if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    };
    let (unit, unit_str) = match total {
        t if t >= GB => (GB, "GB"),
        t if t >= MB => (MB, "MB"),
        t if t >= KB => (KB, "kB"),
        _ => (1, "bytes"),
    };
    format!(
        "{prefix}: {}/{} {unit_str} {percent:.1}%",
        used / unit,
        total / unit
    )
}

/// Format the load-average row.
pub fn load_line(load: LoadAverage) -> String {
    format!("CPU: {:.2}, {:.2}, {:.2}", load.one, load.five, load.fifteen)
}

pub struct StatusScreen {
    size: Size,
    stats: StatsCache,
    shutdown: Arc<dyn ShutdownTrigger>,
    shutdown_command: String,
}

impl StatusScreen {
    pub fn new(
        size: Size,
        stats: StatsCache,
        shutdown: Arc<dyn ShutdownTrigger>,
        shutdown_command: &str,
    ) -> Self {
        Self {
            size,
            stats,
            shutdown,
            shutdown_command: shutdown_command.into(),
        }
    }

    /// Text rows in display order, the address first.
    pub fn lines(&mut self, now: Instant) -> Vec<String> {
        let snapshot = self.stats.snapshot(now);
        let mut lines = Vec::with_capacity(3 + snapshot.filesystems.len());
        lines.push(snapshot.address.clone());
        lines.push(load_line(snapshot.load));
        lines.push(resource_usage("Mem", snapshot.memory));
        for (prefix, usage) in &snapshot.filesystems {
            lines.push(resource_usage(prefix, *usage));
        }
        lines
    }
}

impl Screen for StatusScreen {
    fn kind(&self) -> ScreenKind {
        ScreenKind::Status
    }

    fn size(&self) -> Size {
        self.size
    }

    fn render(&mut self, now: Instant) -> Frame {
        let lines = self.lines(now);
        let mut frame = Frame::new(self.size);
        let mut rows = lines.iter();
        if let Some(address) = rows.next() {
            frame.text_centered(0, address);
        }
        for (row, line) in rows.enumerate() {
            frame.text(0, (row as i32 + 1) * TEXT_ROW_HEIGHT, line);
        }
        frame
    }

    fn handle_button(&mut self, event: &ButtonEvent, overlay: &mut OverlaySlot) -> Directives {
        if event.button() == Button::Cancel && event.is_long() {
            info!("Screen: cancel held, shutting down");
            let screen =
                ShutdownScreen::new(self.size, self.shutdown.as_ref(), &self.shutdown_command);
            overlay.set_subscreen(Box::new(screen));
            return Directives::DRAW;
        }
        Directives::empty()
    }
}
