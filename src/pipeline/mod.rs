// The per-target pipeline: load matching items, act on them, advance the
// checkpoint.
//
// loader    — backward pagination from "now" to the checkpoint or the cold-start horizon
// reconcile — oldest-to-newest amplify with soft/hard error handling
// cycle     — one deadline-bounded load + reconcile for a target

pub mod cycle;
pub mod loader;
pub mod reconcile;

pub use cycle::{CycleOutcome, Target, TargetRunner};
pub use loader::{FeedLoader, LoadResult, LoaderConfig};
pub use reconcile::{reconcile, ActionOutcome, ReconcileReport};
