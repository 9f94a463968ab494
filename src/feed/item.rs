// Feed item model — the subset of a timeline entry the filters and the
// reconciler look at.

use chrono::{DateTime, Utc};

/// Kind of a media attachment on a feed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
    Other,
}

impl MediaKind {
    /// Map the remote `type` string of a media entity.
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "photo" => MediaKind::Photo,
            "video" => MediaKind::Video,
            "animated_gif" => MediaKind::AnimatedGif,
            _ => MediaKind::Other,
        }
    }
}

/// One entry of the monitored account's feed, as seen at fetch time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedItem {
    /// Globally ordered id; newer items have larger ids.
    pub id: u64,
    /// Creation time. `None` when the remote timestamp could not be parsed.
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
    /// Id of the original item when this entry is a repost.
    pub reposted_id: Option<u64>,
    /// Id of the quoted item, if any. Zero is treated as absent.
    pub quoted_id: Option<u64>,
    /// Plain media list.
    pub media: Option<Vec<MediaKind>>,
    /// Extended media list. Preferred over `media` whenever present.
    pub extended_media: Option<Vec<MediaKind>>,
    /// Whether we had already amplified this item when it was fetched.
    pub amplified_by_us: bool,
}

impl FeedItem {
    /// A bare item with only an id and timestamp set.
    pub fn new(id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: Some(created_at),
            ..Self::default()
        }
    }

    /// The media list filters should look at: the extended list when the item
    /// carries one (even if empty), otherwise the plain list. Never merged.
    pub fn effective_media(&self) -> &[MediaKind] {
        match (&self.extended_media, &self.media) {
            (Some(extended), _) => extended,
            (None, Some(plain)) => plain,
            (None, None) => &[],
        }
    }

    pub fn has_photo(&self) -> bool {
        self.effective_media().contains(&MediaKind::Photo)
    }

    pub fn has_video(&self) -> bool {
        self.effective_media().contains(&MediaKind::Video)
    }

    pub fn is_repost(&self) -> bool {
        self.reposted_id.is_some()
    }

    pub fn is_quote(&self) -> bool {
        self.quoted_id.is_some_and(|id| id > 0)
    }
}
