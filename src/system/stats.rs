//! Host statistics for the status screen.
//!
//! Gathering stats is slow compared to a redraw, so the status screen
//! reads them through [`StatsCache`], which refetches at most once per
//! [`STATS_TTL`].  Failures never reach the screen as errors: they turn
//! into sentinel values ([`ADDRESS_UNAVAILABLE`], [`LoadAverage::UNAVAILABLE`],
//! a missing [`Usage`]).

#[cfg(unix)]
use std::ffi::CString;
use std::net::{SocketAddr, UdpSocket};
use std::time::Instant;

use log::debug;
use sysinfo::System;

use crate::config::{FilesystemRow, ADDRESS_UNAVAILABLE, STATS_TTL};
use crate::error::Error;

/// 1, 5 and 15 minute load averages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl LoadAverage {
    /// Shown when the host cannot report its load.
    pub const UNAVAILABLE: Self = Self {
        one: -1.0,
        five: 0.0,
        fifteen: 0.0,
    };
}

/// Used/total pair in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Usage {
    pub used: u64,
    pub total: u64,
}

/// Source of raw host statistics.
pub trait StatsSource: Send {
    /// Externally visible address of the host.
    fn network_address(&mut self) -> Result<String, Error>;

    fn load_average(&mut self) -> Result<LoadAverage, Error>;

    fn memory(&mut self) -> Result<Usage, Error>;

    /// Usage of the filesystem mounted at `mount_point`.
    fn filesystem(&mut self, mount_point: &str) -> Result<Usage, Error>;
}

/// One aggregated reading, sentinels already applied.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsSnapshot {
    pub address: String,
    pub load: LoadAverage,
    pub memory: Option<Usage>,
    /// `(row prefix, usage)` in display order.
    pub filesystems: Vec<(String, Option<Usage>)>,
}

impl StatsSnapshot {
    pub fn collect<S>(source: &mut S, rows: &[FilesystemRow]) -> Self
    where
        S: StatsSource + ?Sized,
    {
        let address = source
            .network_address()
            .unwrap_or_else(|_| ADDRESS_UNAVAILABLE.into());
        let load = source.load_average().unwrap_or(LoadAverage::UNAVAILABLE);
        let memory = source.memory().ok();
        let filesystems = rows
            .iter()
            .map(|row| (row.prefix.clone(), source.filesystem(&row.mount_point).ok()))
            .collect();
        Self {
            address,
            load,
            memory,
            filesystems,
        }
    }
}

/// Rate-limited view over a [`StatsSource`].
pub struct StatsCache {
    source: Box<dyn StatsSource>,
    rows: Vec<FilesystemRow>,
    current: Option<(Instant, StatsSnapshot)>,
}

impl StatsCache {
    pub fn new(source: Box<dyn StatsSource>, rows: Vec<FilesystemRow>) -> Self {
        Self {
            source,
            rows,
            current: None,
        }
    }

    /// Whether the next [`snapshot`](Self::snapshot) call at `now` refetches.
    pub fn is_stale(&self, now: Instant) -> bool {
        match &self.current {
            Some((fetched_at, _)) => now.saturating_duration_since(*fetched_at) >= STATS_TTL,
            None => true,
        }
    }

    /// Current snapshot, refetched if older than [`STATS_TTL`].
    pub fn snapshot(&mut self, now: Instant) -> &StatsSnapshot {
        if self.is_stale(now) {
            debug!("Stats: refreshing snapshot");
            self.current = None;
        }
        let (_, snapshot) = self
            .current
            .get_or_insert_with(|| (now, StatsSnapshot::collect(self.source.as_mut(), &self.rows)));
        snapshot
    }
}

/// [`StatsSource`] backed by `sysinfo` and a UDP route probe.
pub struct SysinfoStats {
    system: System,
    probe: SocketAddr,
}

impl SysinfoStats {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            probe: SocketAddr::from(([8, 8, 8, 8], 80)),
        }
    }
}

impl Default for SysinfoStats {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSource for SysinfoStats {
    fn network_address(&mut self) -> Result<String, Error> {
        // Connecting a UDP socket sends nothing; it only selects the
        // interface the default route would use.
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(|_| Error::Stats)?;
        socket.connect(self.probe).map_err(|_| Error::Stats)?;
        let local = socket.local_addr().map_err(|_| Error::Stats)?;
        Ok(local.ip().to_string())
    }

    fn load_average(&mut self) -> Result<LoadAverage, Error> {
        if !cfg!(unix) {
            return Err(Error::Stats);
        }
        let load = System::load_average();
        Ok(LoadAverage {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        })
    }

    fn memory(&mut self) -> Result<Usage, Error> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(Error::Stats);
        }
        Ok(Usage {
            used: self.system.used_memory(),
            total,
        })
    }

    fn filesystem(&mut self, mount_point: &str) -> Result<Usage, Error> {
        filesystem_usage(mount_point)
    }
}

/// Usage of the filesystem holding `path`.
///
/// Used space is everything that is not free, so blocks reserved for
/// root count as free.
#[cfg(unix)]
fn filesystem_usage(path: &str) -> Result<Usage, Error> {
    let path = CString::new(path).map_err(|_| Error::Stats)?;
    let mut st: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(path.as_ptr(), &mut st) };
    if rc != 0 {
        return Err(Error::Stats);
    }
    let usage = usage_from_blocks(st.f_frsize as u64, st.f_blocks as u64, st.f_bfree as u64);
    if usage.total == 0 {
        return Err(Error::Stats);
    }
    Ok(usage)
}

#[cfg(not(unix))]
fn filesystem_usage(_path: &str) -> Result<Usage, Error> {
    Err(Error::Stats)
}

#[cfg_attr(not(unix), allow(dead_code))]
fn usage_from_blocks(fragment: u64, blocks: u64, free: u64) -> Usage {
    let total = blocks.saturating_mul(fragment);
    let free = free.saturating_mul(fragment);
    Usage {
        used: total.saturating_sub(free),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fixed readings; counts how often the address is asked for.
    struct CountingSource {
        fetches: Arc<AtomicUsize>,
        online: bool,
    }

    impl StatsSource for CountingSource {
        fn network_address(&mut self) -> Result<String, Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.online {
                Ok("192.168.1.20".into())
            } else {
                Err(Error::Stats)
            }
        }

        fn load_average(&mut self) -> Result<LoadAverage, Error> {
            if self.online {
                Ok(LoadAverage {
                    one: 0.5,
                    five: 0.25,
                    fifteen: 0.125,
                })
            } else {
                Err(Error::Stats)
            }
        }

        fn memory(&mut self) -> Result<Usage, Error> {
            Ok(Usage {
                used: 512,
                total: 1024,
            })
        }

        fn filesystem(&mut self, mount_point: &str) -> Result<Usage, Error> {
            match mount_point {
                "/" => Ok(Usage { used: 1, total: 2 }),
                _ => Err(Error::Stats),
            }
        }
    }

    fn cache(online: bool) -> (StatsCache, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            fetches: fetches.clone(),
            online,
        };
        let rows = vec![
            FilesystemRow::new("Dsk", "/"),
            FilesystemRow::new("SD ", "/media/data"),
        ];
        (StatsCache::new(Box::new(source), rows), fetches)
    }

    #[test]
    fn snapshot_is_reused_within_ttl() {
        let (mut cache, fetches) = cache(true);
        let t0 = Instant::now();

        cache.snapshot(t0);
        cache.snapshot(t0 + Duration::from_secs(2));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        cache.snapshot(t0 + Duration::from_secs(6));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn refetch_happens_at_exactly_ttl() {
        let (mut cache, fetches) = cache(true);
        let t0 = Instant::now();
        cache.snapshot(t0);
        assert!(!cache.is_stale(t0 + Duration::from_millis(4999)));
        assert!(cache.is_stale(t0 + STATS_TTL));
        cache.snapshot(t0 + STATS_TTL);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_become_sentinels() {
        let (mut cache, _) = cache(false);
        let snapshot = cache.snapshot(Instant::now());
        assert_eq!(snapshot.address, ADDRESS_UNAVAILABLE);
        assert_eq!(snapshot.load, LoadAverage::UNAVAILABLE);
        assert_eq!(snapshot.memory, Some(Usage { used: 512, total: 1024 }));
        assert_eq!(
            snapshot.filesystems,
            vec![
                ("Dsk".to_string(), Some(Usage { used: 1, total: 2 })),
                ("SD ".to_string(), None),
            ]
        );
    }

    #[test]
    fn reserved_blocks_do_not_count_as_used() {
        // 1000 blocks of 4 KiB, 300 free of which 50 are reserved for root.
        let usage = usage_from_blocks(4096, 1000, 300);
        assert_eq!(usage.total, 4096 * 1000);
        assert_eq!(usage.used, 4096 * 700);
    }

    #[test]
    fn block_counts_saturate() {
        let usage = usage_from_blocks(u64::MAX, 2, 5);
        assert_eq!(usage.total, u64::MAX);
        assert_eq!(usage.used, 0);
    }

    #[cfg(unix)]
    #[test]
    fn root_filesystem_reports_usage() {
        let usage = filesystem_usage("/").unwrap();
        assert!(usage.total > 0);
        assert!(usage.used <= usage.total);
    }

    #[cfg(unix)]
    #[test]
    fn missing_path_is_a_stats_error() {
        assert_eq!(
            filesystem_usage("/nonexistent/micropanel"),
            Err(Error::Stats)
        );
    }
}
