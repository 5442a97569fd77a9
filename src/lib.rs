//! micropanel - button and OLED control panel for single-board computers.
//!
//! Four GPIO buttons (CANCEL, MODE, PAUSE, PLAY) and an SSD1306 128×64
//! OLED.  The library holds all of the logic and runs on any host, so
//! `cargo test` needs no hardware; the `micropanel` binary (feature
//! `hardware`) wires it to a Linux board.
//!
//! Data flow:
//!
//! ```text
//! SignalSource ──edges/levels──▶ Panel (ButtonClassifier) ──ButtonEvent──▶
//!     App (ScreenStack ─▶ Screen) ──Frame──▶ FrameSink
//! ```

// ═══════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════

pub mod app;
pub mod config;
pub mod error;
pub mod panel;
pub mod power;
pub mod power_logic;
pub mod signal;
pub mod system;
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use app::{App, RedrawSignal};
pub use config::{PanelConfig, PinAssignment, PinNumbering};
pub use error::{ConfigError, Error};
pub use panel::{Panel, TeardownReport};
pub use signal::{Edge, Level, LineDriver, Numbered, PinBank, SignalSource};
pub use ui::buttons::{ButtonClassifier, EdgeOutcome};
pub use ui::controller::ScreenStack;
pub use ui::display::{Frame, FrameSink, Ssd1306Sink};
pub use ui::shutdown::ShutdownScreen;
pub use ui::status::StatusScreen;
pub use ui::{Button, ButtonEvent, Channel, Directives, OverlaySlot, Screen, ScreenKind};
