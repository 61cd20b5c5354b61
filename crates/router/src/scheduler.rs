//! Background jobs for directory refresh and trending decay.
//!
//! Each job runs on its own timer, independent of request traffic. A job whose
//! previous run is still in flight skips the tick instead of overlapping it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::router::SymbolRouter;

/// Result of one run of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job ran to completion.
    Completed,
    /// Another run of the same job was in flight, so this one did nothing.
    Skipped,
}

/// Reentrancy guard for one job.
#[derive(Debug, Default)]
pub(crate) struct JobGuard {
    running: AtomicBool,
}

impl JobGuard {
    /// Claims the job, or returns `None` if a run is already in flight.
    pub(crate) fn try_acquire(&self) -> Option<JobPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| JobPermit { guard: self })
    }
}

/// Held for the duration of a run; releases the guard when dropped.
#[derive(Debug)]
pub(crate) struct JobPermit<'a> {
    guard: &'a JobGuard,
}

impl Drop for JobPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Periodic timers driving a shared [`SymbolRouter`].
///
/// - every `refresh_period`: reload both directories, then clear the series cache
/// - every `decay_period`: decay trending weights
///
/// The first tick of each job fires one full period after [`start`](Self::start),
/// since [`SymbolRouter::start`] has just loaded the directories. Dropping the
/// scheduler stops both jobs.
#[derive(Debug)]
pub struct Scheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns the periodic jobs on the current tokio runtime.
    #[must_use]
    pub fn start(router: Arc<SymbolRouter>) -> Self {
        let refresh_period = router.config().refresh_period;
        let decay_period = router.config().decay_period;

        let tasks = vec![
            spawn_job(
                "directory refresh",
                refresh_period,
                Arc::clone(&router),
                |router| async move { router.refresh_directories().await },
            ),
            spawn_job("trending decay", decay_period, router, |router| async move {
                router.decay_trending().await
            }),
        ];

        Self { tasks }
    }

    /// Returns true while any job task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.is_finished())
    }

    /// Stops every job. A run in progress is abandoned at its next await point.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_job<F, Fut>(
    name: &'static str,
    period: Duration,
    router: Arc<SymbolRouter>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn(Arc<SymbolRouter>) -> Fut + Send + 'static,
    Fut: Future<Output = JobOutcome> + Send + 'static,
{
    tokio::spawn(async move {
        info!(job = name, period_secs = period.as_secs(), "Scheduled job started");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match job(Arc::clone(&router)).await {
                JobOutcome::Completed => debug!(job = name, "Scheduled run finished"),
                JobOutcome::Skipped => debug!(job = name, "Previous run still in flight"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::mock::{MockCrypto, MockDirectory, MockEquity};
    use router_core::{AssetClass, DirectoryRecord};

    #[test]
    fn test_guard_is_exclusive_until_dropped() {
        let guard = JobGuard::default();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(guard.try_acquire().is_some());
    }

    fn router(config: RouterConfig, equities: Arc<MockDirectory>) -> Arc<SymbolRouter> {
        Arc::new(
            SymbolRouter::builder()
                .config(config)
                .equity_provider(Arc::new(MockEquity::new()))
                .crypto_provider(Arc::new(MockCrypto::new()))
                .directory_source(equities)
                .build()
                .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_decay_runs_each_period() {
        let config = RouterConfig {
            decay_period: Duration::from_secs(3600),
            ..Default::default()
        };
        let router = router(config, Arc::new(MockDirectory::equities(vec![])));
        router.trending_tracker().record("$TSLA", 8.0).await;

        let scheduler = Scheduler::start(Arc::clone(&router));
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(3599)).await;
        assert_eq!(router.trending_tracker().weight("$TSLA").await, Some(8.0));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(router.trending_tracker().weight("$TSLA").await, Some(4.0));

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(router.trending_tracker().weight("$TSLA").await, Some(2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_runs_each_period_and_stops_on_shutdown() {
        let config = RouterConfig {
            refresh_period: Duration::from_secs(60),
            ..Default::default()
        };
        let source = Arc::new(MockDirectory::equities(vec![DirectoryRecord::new(
            "TSLA",
            "TSLA",
            "Tesla, Inc.",
        )]));
        let router = router(config, Arc::clone(&source));

        let mut scheduler = Scheduler::start(Arc::clone(&router));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(source.fetches(), 1);
        assert!(router.directories().is_loaded(AssetClass::Equity));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetches(), 2);

        scheduler.shutdown();
        assert!(!scheduler.is_running());
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refresh_is_skipped() {
        let source = Arc::new(
            MockDirectory::equities(vec![DirectoryRecord::new("TSLA", "TSLA", "Tesla, Inc.")])
                .with_delay(Duration::from_secs(30)),
        );
        let router = router(RouterConfig::default(), Arc::clone(&source));

        let first = tokio::spawn({
            let router = Arc::clone(&router);
            async move { router.refresh_directories().await }
        });
        tokio::task::yield_now().await;

        assert_eq!(router.refresh_directories().await, JobOutcome::Skipped);
        assert_eq!(first.await.unwrap(), JobOutcome::Completed);
        assert_eq!(source.fetches(), 1);

        assert_eq!(router.refresh_directories().await, JobOutcome::Completed);
        assert_eq!(source.fetches(), 2);
    }
}
