// Remote collaborator traits consumed by the pipeline.
//
// Async so the reqwest client and in-process fakes fit behind the same
// interface, mirroring how the database layer is abstracted.

use async_trait::async_trait;

use super::error::{ActionError, FetchError};
use super::item::FeedItem;

/// Most items a single page can hold; larger requests are capped by the API.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Source of feed pages for one account.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch up to `count` items (at most `MAX_PAGE_SIZE`) with
    /// `since_id < id <= max_id`, newest first.
    /// `max_id = None` starts from the newest item; `since_id = 0` means no
    /// lower bound.
    async fn fetch_page(
        &self,
        account_id: u64,
        max_id: Option<u64>,
        since_id: u64,
        count: u32,
    ) -> Result<Vec<FeedItem>, FetchError>;
}

/// The repost action and its inverse.
#[async_trait]
pub trait Amplifier: Send + Sync {
    async fn amplify(&self, item_id: u64) -> Result<(), ActionError>;

    async fn unamplify(&self, item_id: u64) -> Result<(), ActionError>;
}
