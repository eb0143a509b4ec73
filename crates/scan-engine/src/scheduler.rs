//! Daily scan schedule.
//!
//! The scheduler keeps no state between runs: after every trigger (and after
//! a restart) the next instant is recomputed from the wall clock, so missed
//! triggers are never caught up.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use shadowban_core::{TenantId, WatchlistStore};
use tokio::sync::Semaphore;

use crate::sweep::TenantSweep;

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Local trigger times, sorted and deduplicated.
    pub times: Vec<NaiveTime>,
    pub timezone: Tz,
    /// Tenant sweeps allowed to run at once during a scheduled run.
    pub max_concurrent_sweeps: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            times: vec![hm(9, 0), hm(15, 0), hm(21, 0)],
            timezone: chrono_tz::UTC,
            max_concurrent_sweeps: 1,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse a comma-separated list of `HH:MM` times.
pub fn parse_scan_times(raw: &str) -> Result<Vec<NaiveTime>, String> {
    let mut times = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("invalid scan time {s:?}: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if times.is_empty() {
        return Err("at least one scan time is required".to_string());
    }

    times.sort();
    times.dedup();
    Ok(times)
}

/// First configured trigger strictly after `now`.
///
/// Local times that do not exist on a given day (DST gap) are skipped for
/// that day; ambiguous ones fire at their earliest instant.
pub fn next_trigger(now: DateTime<Utc>, times: &[NaiveTime], timezone: Tz) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(&timezone).date_naive();

    (0..=2)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .flat_map(|date| times.iter().map(move |time| date.and_time(*time)))
        .filter_map(|local| timezone.from_local_datetime(&local).earliest())
        .map(|at| at.with_timezone(&Utc))
        .filter(|at| *at > now)
        .min()
}

/// Source of wall-clock time for trigger computation.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Tallies for one scheduled run, used for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tenants: usize,
    pub accounts_scanned: usize,
    pub fetch_failures: usize,
    pub store_errors: usize,
}

pub struct ScanScheduler {
    store: Arc<dyn WatchlistStore>,
    sweep: Arc<TenantSweep>,
    config: ScheduleConfig,
    clock: Clock,
}

impl ScanScheduler {
    pub fn new(
        store: Arc<dyn WatchlistStore>,
        sweep: Arc<TenantSweep>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            store,
            sweep,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Sweep every auto-enabled tenant once. Errors are logged and counted,
    /// never returned.
    pub async fn run_scheduled(&self) -> RunSummary {
        let tenants = match self.store.list_auto_scan_tenants().await {
            Ok(tenants) => tenants,
            Err(e) => {
                tracing::error!("Scheduled scan aborted, cannot list chats: {}", e);
                return RunSummary {
                    store_errors: 1,
                    ..RunSummary::default()
                };
            }
        };

        tracing::info!("Scheduled scan starting for {} chats", tenants.len());

        let mut summary = RunSummary {
            tenants: tenants.len(),
            ..RunSummary::default()
        };

        if self.config.max_concurrent_sweeps <= 1 {
            for tenant in tenants {
                tally(&mut summary, sweep_tenant(&self.sweep, tenant).await);
            }
        } else {
            let sem = Arc::new(Semaphore::new(self.config.max_concurrent_sweeps));
            let mut handles = Vec::with_capacity(tenants.len());

            for tenant in tenants {
                let sem = Arc::clone(&sem);
                let sweep = Arc::clone(&self.sweep);
                handles.push(tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await.ok();
                    sweep_tenant(&sweep, tenant).await
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok(outcome) => tally(&mut summary, outcome),
                    Err(e) => tracing::error!("Tenant sweep task failed: {}", e),
                }
            }
        }

        tracing::info!(
            "Scheduled scan complete: {} chats, {} accounts, {} fetch failures, {} store errors",
            summary.tenants,
            summary.accounts_scanned,
            summary.fetch_failures,
            summary.store_errors
        );
        summary
    }

    /// Fire [`Self::run_scheduled`] at every configured time until `shutdown`
    /// resolves. Each run is spawned so a long sweep never delays the next
    /// trigger; runs in flight are left to finish on shutdown.
    pub async fn run_until<F>(self: Arc<Self>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let now = (self.clock)();
            let Some(next) = next_trigger(now, &self.config.times, self.config.timezone) else {
                tracing::warn!("No scan times configured, scheduler idle");
                (&mut shutdown).await;
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            tracing::info!(
                "Next scheduled scan at {} ({}s from now)",
                next.with_timezone(&self.config.timezone),
                wait.as_secs()
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    // The monotonic timer can run ahead of the wall clock.
                    if (self.clock)() < next {
                        continue;
                    }
                    let scheduler = Arc::clone(&self);
                    tokio::spawn(async move {
                        scheduler.run_scheduled().await;
                    });
                }
                _ = &mut shutdown => {
                    tracing::info!("Scan scheduler stopping");
                    return;
                }
            }
        }
    }
}

async fn sweep_tenant(sweep: &TenantSweep, tenant: TenantId) -> Option<(usize, usize)> {
    match sweep.sweep(tenant).await {
        Ok(entries) => {
            let failures = entries.iter().filter(|(_, o)| o.is_failure()).count();
            Some((entries.len(), failures))
        }
        Err(e) => {
            tracing::error!("Skipping chat {}: cannot read watchlist: {}", tenant, e);
            None
        }
    }
}

fn tally(summary: &mut RunSummary, outcome: Option<(usize, usize)>) {
    match outcome {
        Some((scanned, failures)) => {
            summary.accounts_scanned += scanned;
            summary.fetch_failures += failures;
        }
        None => summary.store_errors += 1,
    }
}
