//! Watchlist scan engine: per-account scanning, paced tenant sweeps and the
//! daily scan schedule.

pub mod scanner;
pub mod scheduler;
pub mod sweep;

#[cfg(test)]
pub(crate) mod fakes;

pub use scanner::{AccountScanner, DEFAULT_BASE_URL, FETCH_TIMEOUT};
pub use scheduler::{
    next_trigger, parse_scan_times, Clock, RunSummary, ScanScheduler, ScheduleConfig,
};
pub use sweep::{SweepEntry, TenantSweep, SWEEP_PACING};
