// Incremental feed loading.
//
// Walks the account's feed backward, newest first, one page at a time:
//
// 1. Fetch up to `page_size` items with `since_id < id <= upper_bound`.
// 2. The newest item of the first non-empty page becomes `latest_seen`,
//    whether or not it matches.
// 3. On a cold start (`since_id == 0`) the first item older than
//    `now - initial_backfill_horizon` ends the whole walk.
// 4. Matching items are collected in the order seen (newest first).
// 5. An empty or short page means the start of history; otherwise the next
//    upper bound is one below the oldest id on the page.
//
// At most `max_pages` pages are fetched. A fetch error aborts the load with
// no partial result; retrying is the scheduler's business.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::feed::{FeedItem, FeedSource, FetchError, MAX_PAGE_SIZE};
use crate::filter::FilterList;

pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

/// 16 pages of 200 covers the 3200 items the timeline API can reach.
pub const DEFAULT_MAX_PAGES: u32 = 16;

pub const DEFAULT_BACKFILL_HORIZON: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub page_size: u32,
    pub max_pages: u32,
    /// How far back a target without a checkpoint looks.
    pub initial_backfill_horizon: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            initial_backfill_horizon: DEFAULT_BACKFILL_HORIZON,
        }
    }
}

/// What one load produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadResult {
    /// Matching items, newest first.
    pub matches: Vec<FeedItem>,
    /// Newest item observed anywhere in the feed during this load.
    pub latest_seen: Option<FeedItem>,
    pub pages_fetched: u32,
}

pub struct FeedLoader {
    config: LoaderConfig,
}

impl FeedLoader {
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`: a short page ends the
    /// walk, so asking for more than a source can return would stop after
    /// one page and skip everything older.
    pub fn new(mut config: LoaderConfig) -> Self {
        config.page_size = config.page_size.clamp(1, MAX_PAGE_SIZE);
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load items newer than `since_id` that match `filters`.
    ///
    /// `now` is consulted for every cold-start horizon check.
    pub async fn load<S, N>(
        &self,
        source: &S,
        account_id: u64,
        since_id: u64,
        filters: &FilterList,
        now: N,
    ) -> Result<LoadResult, FetchError>
    where
        S: FeedSource + ?Sized,
        N: Fn() -> DateTime<Utc>,
    {
        let horizon = chrono::Duration::from_std(self.config.initial_backfill_horizon).ok();
        let mut result = LoadResult::default();
        let mut upper_bound: Option<u64> = None;

        'pages: for _ in 0..self.config.max_pages {
            let page = source
                .fetch_page(account_id, upper_bound, since_id, self.config.page_size)
                .await?;
            result.pages_fetched += 1;

            let page_len = page.len();
            let oldest_id = page.last().map(|item| item.id);

            debug!(
                account_id,
                ?upper_bound,
                page_len,
                matches = result.matches.len(),
                "Fetched feed page"
            );

            if result.latest_seen.is_none() {
                result.latest_seen = page.first().cloned();
            }

            for item in page {
                if since_id == 0 && is_before_horizon(&item, now(), horizon) {
                    debug!(
                        account_id,
                        item_id = item.id,
                        "Reached backfill horizon, stopping"
                    );
                    break 'pages;
                }
                if filters.matches(&item) {
                    result.matches.push(item);
                }
            }

            let Some(oldest_id) = oldest_id else {
                break;
            };
            if (page_len as u64) < u64::from(self.config.page_size) {
                break;
            }
            match oldest_id.checked_sub(1) {
                Some(next) if next > since_id => upper_bound = Some(next),
                _ => break,
            }
        }

        Ok(result)
    }
}

/// Whether the item was created before `now - horizon`. Items without a
/// timestamp are never cut off.
fn is_before_horizon(
    item: &FeedItem,
    now: DateTime<Utc>,
    horizon: Option<chrono::Duration>,
) -> bool {
    match (item.created_at, horizon) {
        (Some(created_at), Some(horizon)) => now
            .checked_sub_signed(horizon)
            .is_some_and(|cutoff| created_at < cutoff),
        _ => false,
    }
}
