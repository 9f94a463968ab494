// Acting on matched items.
//
// Matches arrive newest first and are processed oldest first, so reposts
// show up in the feed in their original order. Per item:
//
// 1. If we had already amplified it, undo that first so the repost
//    resurfaces. A hard undo failure stops the batch.
// 2. Amplify. Success → Done. Already-amplified / not-permitted are soft:
//    the item is skipped and the batch continues. Anything else stops it.
// 3. After Done or a skip, the checkpoint moves to the item's id.
//
// When the batch finishes without a hard failure the checkpoint also moves
// to the newest item seen during the load, so unmatched newer items don't
// drag a target back into the cold-start horizon next cycle.

use tracing::{error, info, warn};

use crate::db::Checkpoint;
use crate::feed::{ActionError, Amplifier, FeedItem};

/// Result of acting on one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    SkippedAlreadyDone,
    SkippedNotPermitted,
    Fatal { cause: String },
}

impl ActionOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ActionOutcome::Fatal { .. })
    }
}

/// Outcomes in processing order (oldest first), paired with item ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub outcomes: Vec<(u64, ActionOutcome)>,
    /// Set when a hard failure stopped the batch early.
    pub interrupted: bool,
}

impl ReconcileReport {
    pub fn amplified(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == ActionOutcome::Done)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    ActionOutcome::SkippedAlreadyDone | ActionOutcome::SkippedNotPermitted
                )
            })
            .count()
    }

    /// Cause of the hard failure that stopped the batch, if any.
    pub fn fatal_cause(&self) -> Option<&str> {
        self.outcomes.iter().find_map(|(_, o)| match o {
            ActionOutcome::Fatal { cause } => Some(cause.as_str()),
            _ => None,
        })
    }
}

/// Amplify `matches` (newest first) oldest to newest, advancing `checkpoint`.
pub async fn reconcile<A>(
    amplifier: &A,
    matches: &[FeedItem],
    latest_seen: Option<&FeedItem>,
    checkpoint: &mut Checkpoint,
) -> ReconcileReport
where
    A: Amplifier + ?Sized,
{
    let mut report = ReconcileReport::default();

    for item in matches.iter().rev() {
        let outcome = act_on(amplifier, item).await;
        let fatal = outcome.is_fatal();
        report.outcomes.push((item.id, outcome));

        if fatal {
            report.interrupted = true;
            return report;
        }

        save_checkpoint(checkpoint, item.id).await;
    }

    if let Some(latest) = latest_seen {
        save_checkpoint(checkpoint, latest.id).await;
    }

    report
}

async fn act_on<A>(amplifier: &A, item: &FeedItem) -> ActionOutcome
where
    A: Amplifier + ?Sized,
{
    if item.amplified_by_us {
        info!(item_id = item.id, "Item already amplified, undoing first");
        match amplifier.unamplify(item.id).await {
            Ok(()) => {}
            Err(e) if e.is_soft() => {
                warn!(item_id = item.id, error = %e, "Undo refused, amplifying anyway");
            }
            Err(e) => {
                error!(item_id = item.id, error = %e, "Failed to undo amplification");
                return ActionOutcome::Fatal {
                    cause: format!("undo failed for {}: {e}", item.id),
                };
            }
        }
    }

    match amplifier.amplify(item.id).await {
        Ok(()) => {
            info!(item_id = item.id, text = %preview(&item.text), "Amplified");
            ActionOutcome::Done
        }
        Err(ActionError::AlreadyDone) => {
            warn!(item_id = item.id, "Already amplified, skipping");
            ActionOutcome::SkippedAlreadyDone
        }
        Err(ActionError::NotPermitted) => {
            warn!(item_id = item.id, "Amplifying not permitted, skipping");
            ActionOutcome::SkippedNotPermitted
        }
        Err(e) => {
            error!(item_id = item.id, error = %e, "Failed to amplify");
            ActionOutcome::Fatal {
                cause: format!("amplify failed for {}: {e}", item.id),
            }
        }
    }
}

async fn save_checkpoint(checkpoint: &mut Checkpoint, id: u64) {
    if let Err(e) = checkpoint.advance(id).await {
        warn!(
            key = checkpoint.key(),
            checkpoint = id,
            error = %e,
            "Failed to save checkpoint"
        );
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 80;
    let mut out: String = text.chars().take(MAX_CHARS).collect();
    if text.chars().count() > MAX_CHARS {
        out.push('…');
    }
    out
}
