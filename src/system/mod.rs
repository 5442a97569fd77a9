//! Host collaborators - statistics gathering and the shutdown command.

pub mod shutdown;
pub mod stats;

pub use shutdown::{CommandShutdown, ShutdownTrigger};
pub use stats::{LoadAverage, StatsCache, StatsSnapshot, StatsSource, SysinfoStats, Usage};
