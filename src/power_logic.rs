use core::time::Duration;

use crate::config::DisplayTimeout;

/// Decide whether the display should be lit after `idle` without input.
pub fn screen_should_be_on(timeout: DisplayTimeout, idle: Duration) -> bool {
    if timeout.enabled && idle >= timeout.after {
        return false;
    }

    true
}
