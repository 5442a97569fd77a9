//! GPIO lines through the sysfs interface.
//!
//! Sysfs cannot set line bias, so the pull-ups the buttons rely on must
//! come from the board (device tree overlay or external resistors).
//! Channels are kernel GPIO numbers; header pins go through
//! [`Numbered`](micropanel::Numbered) first.

use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::SysfsPin;
use log::debug;

use micropanel::{Channel, Error, LineDriver};

/// Exports a line on open and unexports it on release.
pub struct SysfsLines;

impl LineDriver for SysfsLines {
    type Line = SysfsPin;

    fn open(&mut self, channel: Channel) -> Result<SysfsPin, Error> {
        let pin = SysfsPin::new(u64::from(channel.0));
        pin.export().map_err(|_| Error::Gpio(channel))?;
        pin.set_direction(Direction::In)
            .map_err(|_| Error::Gpio(channel))?;
        debug!("GPIO: exported {}", channel.0);
        Ok(pin)
    }

    fn release(&mut self, channel: Channel, line: SysfsPin) -> Result<(), Error> {
        line.unexport().map_err(|_| Error::Gpio(channel))
    }
}
