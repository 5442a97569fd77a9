//! Panel-wide constants and runtime configuration.
//!
//! Timing parameters of the button classifier and the screens live here
//! as constants so they can be tuned in one place.  Settings that come
//! from the host (bus address, pin assignment, debounce, shutdown
//! command) are carried by [`PanelConfig`].

use core::time::Duration;

use crate::error::{ConfigError, Error};
use crate::ui::{Button, Channel};

// Display

/// Display width in pixels (SSD1306 128×64).
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels.
pub const DISPLAY_HEIGHT: u32 = 64;

/// Vertical pitch of one text row (pixels).
pub const TEXT_ROW_HEIGHT: i32 = 9;

/// Interval between periodic redraws.
pub const RENDER_PERIOD: Duration = Duration::from_secs(1);

// Buttons

/// Minimum spacing between the resolution of one press and the next press.
pub const PRESS_GATE: Duration = Duration::from_millis(500);

/// Presses held for less than this are treated as electrical noise.
pub const NOISE_THRESHOLD: Duration = Duration::from_millis(200);

/// Presses held at least this long produce the long-form event.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_secs(5);

/// Suffix appended to a button's label for a long press.
pub const LONG_SUFFIX: &str = "_long";

/// Interval between two level samples during release detection.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Number of samples in one release-detection window (~100 ms).
pub const SAMPLE_WINDOW: u16 = 100;

/// A window counts as "released" when strictly more than this percentage
/// of its samples read the released level.
pub const RELEASE_CONFIDENCE_PCT: u16 = 51;

// Host status

/// Lifetime of a cached statistics snapshot.
pub const STATS_TTL: Duration = Duration::from_secs(5);

/// Shown in place of the address when the host has no route out.
pub const ADDRESS_UNAVAILABLE: &str = "IP unavailable";

// Defaults (match the stock panel wiring)

/// Default I²C address of the SSD1306.
pub const DEFAULT_BUS_ADDRESS: u8 = 0x3c;

/// Default edge re-trigger spacing (ms).
pub const DEFAULT_DEBOUNCE_MS: u32 = 250;

/// Default command run by the shutdown screen.
pub const DEFAULT_SHUTDOWN_COMMAND: &str = "sudo shutdown -h now";

/// Default inactivity timeout before the display powers off (minutes).
pub const DEFAULT_DISPLAY_TIMEOUT_MINS: u64 = 5;

/// Highest valid 7-bit I²C address.
const MAX_BUS_ADDRESS: u32 = 0x7f;

/// How the configured channel ids are written.
///
/// The panel works with the configured ids unchanged; the line driver
/// is the one that maps them onto kernel lines (see
/// [`Numbered`](crate::signal::Numbered)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinNumbering {
    /// Broadcom SoC numbering, the same numbers the kernel uses.
    #[default]
    Bcm,
    /// Physical header pin numbers.
    Board,
}

/// Physical channel for each of the four panel roles.
///
/// `None` leaves the role unassigned; it is skipped during setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinAssignment {
    pub cancel: Option<Channel>,
    pub mode: Option<Channel>,
    pub pause: Option<Channel>,
    pub play: Option<Channel>,
}

impl PinAssignment {
    /// Iterate over `(channel, role)` pairs for the assigned roles.
    pub fn assigned(&self) -> impl Iterator<Item = (Channel, Button)> + '_ {
        [
            (self.cancel, Button::Cancel),
            (self.mode, Button::Mode),
            (self.pause, Button::Pause),
            (self.play, Button::Play),
        ]
        .into_iter()
        .filter_map(|(channel, button)| channel.map(|c| (c, button)))
    }
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            cancel: Some(Channel(16)),
            mode: Some(Channel(17)),
            pause: Some(Channel(18)),
            play: Some(Channel(27)),
        }
    }
}

/// One filesystem row on the status screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilesystemRow {
    /// Three-character row prefix, e.g. `"Dsk"`.
    pub prefix: String,
    /// Mount point whose usage is shown.
    pub mount_point: String,
}

impl FilesystemRow {
    pub fn new(prefix: &str, mount_point: &str) -> Self {
        Self {
            prefix: prefix.into(),
            mount_point: mount_point.into(),
        }
    }
}

/// Display auto-off policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayTimeout {
    pub enabled: bool,
    pub after: Duration,
}

impl Default for DisplayTimeout {
    fn default() -> Self {
        Self {
            enabled: true,
            after: Duration::from_secs(DEFAULT_DISPLAY_TIMEOUT_MINS * 60),
        }
    }
}

/// Host-provided settings applied when the panel is set up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    /// I²C address of the display controller.
    pub bus_address: u8,
    pub pins: PinAssignment,
    pub numbering: PinNumbering,
    /// Minimum spacing between two reported edges on one line.
    pub debounce: Duration,
    pub shutdown_command: String,
    pub filesystems: Vec<FilesystemRow>,
    pub display_timeout: DisplayTimeout,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            bus_address: DEFAULT_BUS_ADDRESS,
            pins: PinAssignment::default(),
            numbering: PinNumbering::default(),
            debounce: Duration::from_millis(u64::from(DEFAULT_DEBOUNCE_MS)),
            shutdown_command: DEFAULT_SHUTDOWN_COMMAND.into(),
            filesystems: vec![
                FilesystemRow::new("Dsk", "/"),
                FilesystemRow::new("SD ", "/media/data"),
            ],
            display_timeout: DisplayTimeout::default(),
        }
    }
}

impl PanelConfig {
    /// Reject settings the panel cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen: heapless::Vec<Channel, 4> = heapless::Vec::new();
        for (channel, _) in self.pins.assigned() {
            if seen.contains(&channel) {
                return Err(ConfigError::DuplicateChannel(channel).into());
            }
            // At most four roles, so the push cannot overflow.
            let _ = seen.push(channel);
        }

        if u32::from(self.bus_address) > MAX_BUS_ADDRESS {
            return Err(ConfigError::BusAddress.into());
        }
        if self.debounce.is_zero() {
            return Err(ConfigError::Debounce.into());
        }
        if self.shutdown_command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(())
    }
}

/// Parse a bus address written as an integer literal.
///
/// Accepts decimal as well as `0x`, `0o` and `0b` prefixed values, so
/// settings such as `"0x3c"` and `"60"` both work.
pub fn parse_bus_address(text: &str) -> Result<u8, Error> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u32::from_str_radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else {
        lower.parse::<u32>()
    };

    match parsed {
        Ok(value) if value <= MAX_BUS_ADDRESS => Ok(value as u8),
        _ => Err(ConfigError::BusAddress.into()),
    }
}
