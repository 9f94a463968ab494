// Scheduler — one independent loop per target.
//
// Each target runs cycle → sleep → cycle until shutdown. Targets never wait
// on each other: a slow or failing account only delays itself. Shutdown is a
// watch channel flipped to `true` (or dropped); it interrupts both the sleep
// and an in-flight cycle.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{error, info};

use crate::db::{checkpoint_key, Checkpoint, CheckpointStore};
use crate::feed::{Amplifier, FeedSource};
use crate::pipeline::{CycleOutcome, FeedLoader, LoaderConfig, Target, TargetRunner};

/// Read each target's checkpoint and build its runner. A target whose
/// checkpoint can't be read is logged and left out; the others still run.
pub async fn prepare_runners(
    targets: Vec<Target>,
    store: &Arc<dyn CheckpointStore>,
    loader: &LoaderConfig,
    timeout: Duration,
    source: Arc<dyn FeedSource>,
    amplifier: Arc<dyn Amplifier>,
) -> Vec<TargetRunner> {
    let mut runners = Vec::with_capacity(targets.len());

    for target in targets {
        let key = checkpoint_key(target.account_id);
        let checkpoint = match Checkpoint::load(store.clone(), key).await {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                error!(
                    account = %target.handle,
                    error = %e,
                    "Skipping target, checkpoint unreadable"
                );
                continue;
            }
        };

        info!(
            account = %target.handle,
            account_id = target.account_id,
            checkpoint = checkpoint.value(),
            filter = %target.filters,
            "Target ready"
        );

        runners.push(TargetRunner::new(
            target,
            FeedLoader::new(loader.clone()),
            source.clone(),
            amplifier.clone(),
            checkpoint,
            timeout,
        ));
    }

    runners
}

/// Wait before the next cycle: the interval, stretched to honor a rate-limit
/// reset when the last cycle hit one.
pub fn next_delay(interval: Duration, outcome: &CycleOutcome) -> Duration {
    match outcome.resume_hint() {
        Some(hint) if hint > interval => hint,
        _ => interval,
    }
}

/// Loop cycles for one target until shutdown. Returns the number of cycles
/// that started.
pub async fn run_target(
    mut runner: TargetRunner,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let account = runner.target().handle.clone();
    let mut cycles = 0u64;

    info!(
        account = %account,
        interval_secs = interval.as_secs(),
        "Watching target"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        cycles += 1;
        let delay = tokio::select! {
            outcome = runner.run_cycle() => next_delay(interval, &outcome),
            _ = stopped(&mut shutdown) => break,
        };

        if delay > interval {
            info!(
                account = %account,
                delay_secs = delay.as_secs(),
                "Backing off until rate limit resets"
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = stopped(&mut shutdown) => break,
        }
    }

    info!(
        account = %account,
        cycles,
        checkpoint = runner.checkpoint(),
        "Stopped watching target"
    );
    cycles
}

/// Spawn one loop per target and wait for all of them to stop.
pub async fn run_all(
    runners: Vec<TargetRunner>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
) {
    let handles: Vec<_> = runners
        .into_iter()
        .map(|runner| tokio::spawn(run_target(runner, interval, shutdown.clone())))
        .collect();

    for result in join_all(handles).await {
        if let Err(e) = result {
            error!(error = %e, "Target task panicked");
        }
    }
}

/// Run a single cycle for every target, concurrently.
pub async fn run_once(runners: &mut [TargetRunner]) -> Vec<CycleOutcome> {
    join_all(runners.iter_mut().map(|runner| runner.run_cycle())).await
}

/// Resolves once shutdown is requested or the sender is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // wait_for checks the current value first, then waits for changes.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FetchError;
    use crate::pipeline::ReconcileReport;

    #[test]
    fn test_next_delay_defaults_to_interval() {
        let interval = Duration::from_secs(600);
        let outcome = CycleOutcome::Completed {
            matched: 0,
            report: ReconcileReport::default(),
        };
        assert_eq!(next_delay(interval, &outcome), interval);
        assert_eq!(next_delay(interval, &CycleOutcome::TimedOut), interval);
    }

    #[test]
    fn test_next_delay_honors_longer_rate_limit() {
        let interval = Duration::from_secs(600);
        let limited = CycleOutcome::LoadFailed(FetchError::RateLimited {
            status: 429,
            retry_after: Duration::from_secs(900),
        });
        assert_eq!(next_delay(interval, &limited), Duration::from_secs(900));

        let short = CycleOutcome::LoadFailed(FetchError::RateLimited {
            status: 429,
            retry_after: Duration::from_secs(30),
        });
        assert_eq!(next_delay(interval, &short), interval);
    }
}
