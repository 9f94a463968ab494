// One target, one cycle: load, then reconcile, under a deadline.
//
//     Idle → Loading → LoadFailed
//                    → Reconciling → ReconcileFatal
//                                  → Idle
//
// Nothing but the checkpoint carries over between cycles. When the deadline
// fires the in-flight remote call is dropped; checkpoint writes that already
// happened stay.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use crate::db::Checkpoint;
use crate::feed::{Amplifier, FeedSource, FetchError};
use crate::filter::FilterList;

use super::loader::FeedLoader;
use super::reconcile::{reconcile, ReconcileReport};

/// A monitored account with its filters.
#[derive(Debug, Clone)]
pub struct Target {
    pub handle: String,
    pub account_id: u64,
    pub filters: FilterList,
}

/// How a cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed {
        matched: usize,
        report: ReconcileReport,
    },
    LoadFailed(FetchError),
    ReconcileFatal(ReconcileReport),
    TimedOut,
}

impl CycleOutcome {
    /// Minimum wait before the next cycle, when the API asked for one.
    pub fn resume_hint(&self) -> Option<Duration> {
        match self {
            CycleOutcome::LoadFailed(e) => e.retry_after(),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed { .. })
    }
}

/// Everything needed to run cycles for one target.
pub struct TargetRunner {
    target: Target,
    loader: FeedLoader,
    source: Arc<dyn FeedSource>,
    amplifier: Arc<dyn Amplifier>,
    checkpoint: Checkpoint,
    timeout: Duration,
}

impl TargetRunner {
    pub fn new(
        target: Target,
        loader: FeedLoader,
        source: Arc<dyn FeedSource>,
        amplifier: Arc<dyn Amplifier>,
        checkpoint: Checkpoint,
        timeout: Duration,
    ) -> Self {
        Self {
            target,
            loader,
            source,
            amplifier,
            checkpoint,
            timeout,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn checkpoint(&self) -> u64 {
        self.checkpoint.value()
    }

    /// Run one load + reconcile, bounded by the per-cycle timeout.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();
        let Self {
            target,
            loader,
            source,
            amplifier,
            checkpoint,
            timeout,
        } = self;

        info!(
            account = %target.handle,
            checkpoint = checkpoint.value(),
            "Starting cycle"
        );

        let work = async {
            let loaded = match loader
                .load(
                    source.as_ref(),
                    target.account_id,
                    checkpoint.value(),
                    &target.filters,
                    Utc::now,
                )
                .await
            {
                Ok(loaded) => loaded,
                Err(e) => return CycleOutcome::LoadFailed(e),
            };

            let matched = loaded.matches.len();
            info!(
                account = %target.handle,
                matched,
                pages = loaded.pages_fetched,
                "Loaded feed"
            );

            let report = reconcile(
                amplifier.as_ref(),
                &loaded.matches,
                loaded.latest_seen.as_ref(),
                checkpoint,
            )
            .await;

            if report.interrupted {
                CycleOutcome::ReconcileFatal(report)
            } else {
                CycleOutcome::Completed { matched, report }
            }
        };

        let outcome = tokio::time::timeout(*timeout, work)
            .await
            .unwrap_or(CycleOutcome::TimedOut);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            CycleOutcome::Completed { matched, report } => info!(
                account = %target.handle,
                matched,
                amplified = report.amplified(),
                skipped = report.skipped(),
                checkpoint = checkpoint.value(),
                elapsed_ms,
                "Cycle complete"
            ),
            CycleOutcome::LoadFailed(e) => warn!(
                account = %target.handle,
                error = %e,
                elapsed_ms,
                "Failed to load feed"
            ),
            CycleOutcome::ReconcileFatal(report) => warn!(
                account = %target.handle,
                cause = report.fatal_cause().unwrap_or("unknown"),
                amplified = report.amplified(),
                checkpoint = checkpoint.value(),
                "Cycle stopped on a hard failure"
            ),
            CycleOutcome::TimedOut => warn!(
                account = %target.handle,
                timeout_secs = timeout.as_secs(),
                checkpoint = checkpoint.value(),
                "Cycle timed out"
            ),
        }

        outcome
    }
}
