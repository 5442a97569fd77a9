//! micropanel - runs the button and OLED panel on a Linux board.
//!
//! Two threads:
//! - input: polls the buttons every millisecond and sends classified
//!   presses over a channel
//! - main: routes presses to the screens and redraws once per second
//!
//! Ctrl-C (or SIGTERM) stops both; the display is blanked and the GPIO
//! lines are released before exit.

mod logging;
mod sysfs;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use crossbeam_channel::{bounded, select, tick, Sender};
use embedded_graphics::geometry::Size;
use linux_embedded_hal::I2cdev;
use log::{error, info, warn};

use micropanel::config::{
    parse_bus_address, DisplayTimeout, FilesystemRow, DEFAULT_DEBOUNCE_MS,
    DEFAULT_DISPLAY_TIMEOUT_MINS, DEFAULT_SHUTDOWN_COMMAND, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    RENDER_PERIOD, SAMPLE_INTERVAL,
};
use micropanel::system::{CommandShutdown, ShutdownTrigger, StatsCache, SysinfoStats};
use micropanel::{
    App, ButtonEvent, Channel, Numbered, Panel, PanelConfig, PinAssignment, PinBank,
    PinNumbering, Ssd1306Sink, StatusScreen, TeardownReport,
};

use crate::sysfs::SysfsLines;

type Buttons = Panel<PinBank<Numbered<SysfsLines>>>;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Numbering {
    Bcm,
    Board,
}

impl From<Numbering> for PinNumbering {
    fn from(n: Numbering) -> Self {
        match n {
            Numbering::Bcm => PinNumbering::Bcm,
            Numbering::Board => PinNumbering::Board,
        }
    }
}

/// Button and OLED control panel.
#[derive(Parser, Debug)]
#[command(name = "micropanel", version, about)]
struct Args {
    /// I²C bus device the display is attached to.
    #[arg(long, env = "MICROPANEL_I2C_BUS", default_value = "/dev/i2c-1")]
    i2c_bus: String,

    /// Display address (decimal, 0x, 0o or 0b literal).
    #[arg(long, env = "MICROPANEL_ADDRESS", default_value = "0x3c")]
    address: String,

    /// GPIO of the CANCEL button, -1 to leave it unassigned.
    #[arg(long, env = "MICROPANEL_CANCEL", default_value_t = 16, allow_negative_numbers = true)]
    cancel: i64,

    #[arg(long, env = "MICROPANEL_MODE", default_value_t = 17, allow_negative_numbers = true)]
    mode: i64,

    #[arg(long, env = "MICROPANEL_PAUSE", default_value_t = 18, allow_negative_numbers = true)]
    pause: i64,

    #[arg(long, env = "MICROPANEL_PLAY", default_value_t = 27, allow_negative_numbers = true)]
    play: i64,

    /// How the button pins are numbered: BCM GPIO or physical header pin.
    #[arg(long, env = "MICROPANEL_NUMBERING", value_enum, default_value_t = Numbering::Bcm)]
    numbering: Numbering,

    /// Minimum spacing between two edges on one line (ms).
    #[arg(long, env = "MICROPANEL_DEBOUNCE_MS", default_value_t = DEFAULT_DEBOUNCE_MS)]
    debounce_ms: u32,

    #[arg(long, env = "MICROPANEL_SHUTDOWN_COMMAND", default_value = DEFAULT_SHUTDOWN_COMMAND)]
    shutdown_command: String,

    /// Filesystem row as PREFIX=MOUNT, e.g. "Dsk=/".  Repeatable.
    #[arg(long = "filesystem", value_parser = parse_filesystem)]
    filesystems: Vec<FilesystemRow>,

    /// Minutes without input before the display turns off, 0 to never.
    #[arg(long, env = "MICROPANEL_DISPLAY_TIMEOUT", default_value_t = DEFAULT_DISPLAY_TIMEOUT_MINS)]
    display_timeout_mins: u64,

    /// Enable debug logging (RUST_LOG may then override the level).
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn panel_config(&self) -> Result<PanelConfig> {
        let defaults = PanelConfig::default();
        let bus_address = parse_bus_address(&self.address)
            .with_context(|| format!("bus address {:?}", self.address))?;
        let filesystems = if self.filesystems.is_empty() {
            defaults.filesystems
        } else {
            self.filesystems.clone()
        };

        Ok(PanelConfig {
            bus_address,
            pins: PinAssignment {
                cancel: channel(self.cancel)?,
                mode: channel(self.mode)?,
                pause: channel(self.pause)?,
                play: channel(self.play)?,
            },
            numbering: self.numbering.into(),
            debounce: Duration::from_millis(u64::from(self.debounce_ms)),
            shutdown_command: self.shutdown_command.clone(),
            filesystems,
            display_timeout: DisplayTimeout {
                enabled: self.display_timeout_mins > 0,
                after: Duration::from_secs(self.display_timeout_mins * 60),
            },
        })
    }
}

fn channel(pin: i64) -> Result<Option<Channel>> {
    if pin < 0 {
        return Ok(None);
    }
    let Ok(pin) = u32::try_from(pin) else {
        bail!("GPIO {pin} out of range");
    };
    Ok(Some(Channel(pin)))
}

fn parse_filesystem(text: &str) -> Result<FilesystemRow, String> {
    match text.split_once('=') {
        Some((prefix, mount)) if !mount.is_empty() => Ok(FilesystemRow::new(prefix, mount)),
        _ => Err(format!("expected PREFIX=MOUNT, got {text:?}")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    let config = args.panel_config()?;
    config.validate().context("invalid configuration")?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing signal handler")?;
    }

    let i2c = I2cdev::new(&args.i2c_bus).with_context(|| format!("opening {}", args.i2c_bus))?;
    let mut sink = Ssd1306Sink::init(i2c, config.bus_address)
        .with_context(|| format!("initialising display at {:#04x}", config.bus_address))?;

    let mut buttons = Panel::new(PinBank::new(Numbered::new(SysfsLines, config.numbering)));
    if let Err(e) = buttons.setup(&config) {
        log_teardown(&buttons.teardown());
        return Err(e).context("claiming button lines");
    }

    let (events_tx, events_rx) = bounded::<ButtonEvent>(16);
    let input = spawn_input(buttons, events_tx, running.clone())?;

    let stats = StatsCache::new(Box::new(SysinfoStats::new()), config.filesystems.clone());
    let shutdown: Arc<dyn ShutdownTrigger> = Arc::new(CommandShutdown);
    let status = StatusScreen::new(
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        stats,
        shutdown,
        &config.shutdown_command,
    );
    let mut app = App::new(Box::new(status), config.display_timeout, Instant::now());
    app.tick(Instant::now(), &mut sink);

    info!("micropanel running");
    let render = tick(RENDER_PERIOD);
    while running.load(Ordering::SeqCst) {
        select! {
            recv(events_rx) -> event => match event {
                Ok(event) => {
                    app.handle_event(&event, Instant::now(), &mut sink);
                }
                Err(_) => {
                    error!("Button: input thread stopped");
                    break;
                }
            },
            recv(render) -> _ => app.tick(Instant::now(), &mut sink),
        }
    }

    running.store(false, Ordering::SeqCst);
    // Unblocks an input thread stuck on a full channel.
    drop(events_rx);
    app.shutdown(&mut sink);
    match input.join() {
        Ok(report) => log_teardown(&report),
        Err(_) => error!("Button: input thread panicked"),
    }
    info!("micropanel stopped");
    Ok(())
}

/// Poll the buttons every sample interval until `running` clears.
fn spawn_input(
    mut buttons: Buttons,
    events: Sender<ButtonEvent>,
    running: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<TeardownReport>> {
    thread::Builder::new()
        .name("panel-input".into())
        .spawn(move || {
            while running.load(Ordering::SeqCst) {
                match buttons.poll(Instant::now()) {
                    Ok(Some(event)) => {
                        if events.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Button: {}", e),
                }
                thread::sleep(SAMPLE_INTERVAL);
            }
            buttons.teardown()
        })
        .context("spawning input thread")
}

fn log_teardown(report: &TeardownReport) {
    for (channel, e) in &report.failures {
        warn!("Panel: GPIO {} left claimed: {}", channel.0, e);
    }
}
