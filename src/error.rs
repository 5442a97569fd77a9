//! Unified error type for micropanel.
//!
//! Every expected failure of the panel (a GPIO line that cannot be read,
//! a display that does not answer, a shutdown command that cannot be
//! started) is a value of [`Error`].  None of them is allowed to panic.

use core::fmt;

use crate::ui::Channel;

/// Top-level error type used across the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Signal lines
    /// Reading, configuring or releasing a GPIO line failed.
    Gpio(Channel),

    /// The channel is not part of the configured channel set.
    UnmappedChannel(Channel),

    /// The line has not been configured as an input yet.
    NotConfigured(Channel),

    // Display
    /// I²C transaction to the display failed.
    Display,

    // Host collaborators
    /// The shutdown command could not be started.
    Shutdown(String),

    /// The shutdown command is empty.
    EmptyCommand,

    /// A host statistic could not be collected.
    Stats,

    // Configuration
    Config(ConfigError),
}

/// Settings the panel refuses to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Two roles were assigned the same channel.
    DuplicateChannel(Channel),
    /// Bus address is not a 7-bit integer literal.
    BusAddress,
    /// Debounce window must be non-zero.
    Debounce,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Gpio(channel) => write!(f, "GPIO {} failed", channel.0),
            Error::UnmappedChannel(channel) => write!(f, "GPIO {} is not mapped", channel.0),
            Error::NotConfigured(channel) => write!(f, "GPIO {} is not configured", channel.0),
            Error::Display => f.write_str("display not responding"),
            Error::Shutdown(reason) => f.write_str(reason),
            Error::EmptyCommand => f.write_str("empty shutdown command"),
            Error::Stats => f.write_str("statistics unavailable"),
            Error::Config(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicateChannel(channel) => {
                write!(f, "GPIO {} assigned to more than one button", channel.0)
            }
            ConfigError::BusAddress => f.write_str("bus address must be a 7-bit integer"),
            ConfigError::Debounce => f.write_str("debounce must be non-zero"),
        }
    }
}

impl std::error::Error for Error {}

// Convenience conversions

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}
