//! Local shutdown command.

use std::process::{Command, Stdio};
use std::thread;

use log::{info, warn};

use crate::error::Error;

/// Starts the host's shutdown sequence without waiting for it.
pub trait ShutdownTrigger: Send + Sync {
    fn trigger(&self, command: &str) -> Result<(), Error>;
}

/// Runs the command through `sh -c`, fire-and-forget.
///
/// The child is reaped on a detached thread so it never lingers as a
/// zombie.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandShutdown;

impl ShutdownTrigger for CommandShutdown {
    fn trigger(&self, command: &str) -> Result<(), Error> {
        if command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        info!("Shutdown: running `{}`", command);
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Shutdown(e.to_string()))?;

        let command = command.to_string();
        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                warn!("Shutdown: `{}` exited with {}", command, status)
            }
            Ok(_) => {}
            Err(e) => warn!("Shutdown: waiting for `{}` failed: {}", command, e),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_refused() {
        assert_eq!(CommandShutdown.trigger(""), Err(Error::EmptyCommand));
        assert_eq!(CommandShutdown.trigger("  \t"), Err(Error::EmptyCommand));
    }

    #[cfg(unix)]
    #[test]
    fn harmless_command_starts() {
        assert_eq!(CommandShutdown.trigger("true"), Ok(()));
    }
}
