//! Periodic batch scheduler.
//!
//! Each cycle selects up to `max_batch_size` pending wallets, oldest-linked
//! first, and drains them through a pool of `max_concurrent` workers. Every
//! worker pauses `chunk_delay` after each wallet while work remains. At most
//! one cycle runs at a time; a trigger that arrives mid-cycle is dropped.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::Instrument;

use chaingate_store::{EngineStore, PendingWallet};
use chaingate_types::{ContractId, Timestamp};

use crate::tracing_spans::{cycle_span, wallet_span};
use crate::{EngineMetrics, UserOutcome, UserVerifier};

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub max_batch_size: usize,
    pub max_concurrent: usize,
    pub chunk_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            max_batch_size: 10,
            max_concurrent: 10,
            chunk_delay: Duration::from_millis(100),
        }
    }
}

/// Process-lifetime aggregate; reset only by a restart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub total_runs: u64,
    pub total_checked: u64,
    pub total_verified: u64,
    pub last_run: Option<Timestamp>,
    pub currently_running: bool,
}

/// Summary of one executed cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    pub run: u64,
    pub checked: usize,
    pub verified: usize,
    /// Users whose routine ended in an error (still pending).
    pub failed: usize,
    pub duration: Duration,
}

#[derive(Default)]
struct Tally {
    checked: AtomicUsize,
    verified: AtomicUsize,
    failed: AtomicUsize,
}

/// Clears the running flag however the cycle ends, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct BatchScheduler {
    store: Arc<dyn EngineStore>,
    verifier: Arc<UserVerifier>,
    contract_ids: Vec<ContractId>,
    config: SchedulerConfig,
    metrics: Arc<EngineMetrics>,
    running: AtomicBool,
    total_runs: AtomicU64,
    total_checked: AtomicU64,
    total_verified: AtomicU64,
    /// Unix seconds of the last cycle start; 0 = never.
    last_run: AtomicU64,
}

impl BatchScheduler {
    pub fn new(
        store: Arc<dyn EngineStore>,
        verifier: Arc<UserVerifier>,
        contract_ids: Vec<ContractId>,
        config: SchedulerConfig,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            verifier,
            contract_ids,
            config,
            metrics,
            running: AtomicBool::new(false),
            total_runs: AtomicU64::new(0),
            total_checked: AtomicU64::new(0),
            total_verified: AtomicU64::new(0),
            last_run: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CycleStats {
        let last_run = self.last_run.load(Ordering::Relaxed);
        CycleStats {
            total_runs: self.total_runs.load(Ordering::Relaxed),
            total_checked: self.total_checked.load(Ordering::Relaxed),
            total_verified: self.total_verified.load(Ordering::Relaxed),
            last_run: (last_run > 0).then(|| Timestamp::new(last_run)),
            currently_running: self.is_running(),
        }
    }

    /// Run one cycle now. Returns `None` if another cycle is in progress.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.metrics.cycles_skipped.inc();
            tracing::debug!("cycle already running, dropping trigger");
            return None;
        }
        let _guard = RunningGuard(&self.running);

        let run = self.total_runs.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_run.store(Timestamp::now().as_secs(), Ordering::Relaxed);
        self.metrics.cycles_run.inc();

        let started = Instant::now();
        let tally = self.execute().instrument(cycle_span(run)).await;
        let duration = started.elapsed();

        let report = CycleReport {
            run,
            checked: tally.checked.load(Ordering::Relaxed),
            verified: tally.verified.load(Ordering::Relaxed),
            failed: tally.failed.load(Ordering::Relaxed),
            duration,
        };
        self.total_checked
            .fetch_add(report.checked as u64, Ordering::Relaxed);
        self.total_verified
            .fetch_add(report.verified as u64, Ordering::Relaxed);
        self.metrics
            .cycle_duration_seconds
            .observe(duration.as_secs_f64());

        tracing::info!(
            run,
            checked = report.checked,
            verified = report.verified,
            failed = report.failed,
            duration_ms = duration.as_millis() as u64,
            "cycle complete"
        );
        Some(report)
    }

    async fn execute(&self) -> Tally {
        let tally = Tally::default();
        let pending = match self
            .store
            .pending_wallets(&self.contract_ids, self.config.max_batch_size)
        {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "failed to load pending wallets, skipping cycle");
                return tally;
            }
        };
        self.metrics.pending_wallets.set(pending.len() as i64);
        if pending.is_empty() {
            tracing::debug!("no pending wallets");
            return tally;
        }

        let workers = self.config.max_concurrent.max(1).min(pending.len());
        tracing::debug!(wallets = pending.len(), workers, "cycle starting");
        let queue = Mutex::new(VecDeque::from(pending));
        join_all((0..workers).map(|_| self.worker(&queue, &tally))).await;
        tally
    }

    async fn worker(&self, queue: &Mutex<VecDeque<PendingWallet>>, tally: &Tally) {
        loop {
            let next = queue.lock().await.pop_front();
            let Some(pending) = next else {
                break;
            };

            let span = wallet_span(&pending.identity, &pending.wallet);
            let result = self.verifier.verify(&pending).instrument(span).await;
            tally.checked.fetch_add(1, Ordering::Relaxed);
            self.metrics.wallets_checked.inc();
            match result {
                Ok(UserOutcome::Verified(_)) => {
                    tally.verified.fetch_add(1, Ordering::Relaxed);
                }
                Ok(UserOutcome::NothingNew) => {}
                Err(e) => {
                    tally.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(identity = %pending.identity, error = %e, "user left pending");
                }
            }

            if !self.config.chunk_delay.is_zero() && !queue.lock().await.is_empty() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
        }
    }

    /// Tick every `interval`, first tick immediately, until shutdown.
    ///
    /// Each tick spawns its cycle, so a long cycle never delays the timer;
    /// overlapping ticks are dropped by the running guard.
    pub fn start(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!(
                interval_secs = scheduler.config.interval.as_secs(),
                max_batch_size = scheduler.config.max_batch_size,
                max_concurrent = scheduler.config.max_concurrent,
                "scheduler started"
            );
            let mut interval = tokio::time::interval(scheduler.config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => {
                        tracing::info!("scheduler shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let cycle = Arc::clone(&scheduler);
                        tokio::spawn(async move {
                            cycle.run_cycle().await;
                        });
                    }
                }
            }
        })
    }
}
