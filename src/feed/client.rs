// Feed API client — signed REST calls over reqwest.
//
// Covers the four endpoints the service needs: account lookup, the user
// timeline, repost and un-repost. Reads and reposts are paced by separate
// sliding-window limiters, since the API budgets them separately. Failed
// responses are classified into the FetchError / ActionError taxonomy here
// so the pipeline never sees HTTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::auth::Credentials;
use super::error::{ActionError, FetchError};
use super::item::{FeedItem, MediaKind};
use super::rate_limit::{suggested_delay, RateLimitInfo, RateLimiter};
use super::traits::{Amplifier, FeedSource, MAX_PAGE_SIZE};

/// Default API root.
pub const DEFAULT_API_URL: &str = "https://api.twitter.com/1.1";

/// Remote error code: the item was already amplified by this account.
pub const CODE_ALREADY_AMPLIFIED: i64 = 327;

/// Remote error code: amplifying this item is not permitted.
pub const CODE_NOT_PERMITTED: i64 = 328;

/// Timestamp layout used by the API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Read budget (timeline, account lookup): 900 calls per 15 minutes.
const READS_PER_WINDOW: u32 = 900;
const READ_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Repost budget: 300 calls per 3 hours, shared by repost and un-repost.
const ACTIONS_PER_WINDOW: u32 = 300;
const ACTION_WINDOW: Duration = Duration::from_secs(3 * 60 * 60);

/// Upper bound on any single HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the feed API.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    read_limiter: RateLimiter,
    action_limiter: RateLimiter,
}

impl ApiClient {
    /// Create a client for the given API root.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        Self::with_timeout(base_url, credentials, REQUEST_TIMEOUT)
    }

    /// Same as `new`, with a custom per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("amplifier/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            read_limiter: RateLimiter::new(READS_PER_WINDOW, READ_WINDOW),
            action_limiter: RateLimiter::new(ACTIONS_PER_WINDOW, ACTION_WINDOW),
        })
    }

    /// Pace, sign and send one request. The signature covers `params`, so
    /// they are passed here rather than added to a builder afterwards.
    async fn send(
        &self,
        limiter: &RateLimiter,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> reqwest::Result<Response> {
        limiter.acquire().await;
        let authorization = self.credentials.authorization(&method, url, params);
        self.client
            .request(method, url)
            .query(params)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
    }

    /// Resolve an account handle (screen name) to its numeric id.
    pub async fn resolve_account(&self, handle: &str) -> Result<u64> {
        let url = format!("{}/users/show.json", self.base_url);
        let params = [
            ("screen_name", handle.to_string()),
            ("include_entities", "false".to_string()),
        ];

        let response = self
            .send(&self.read_limiter, Method::GET, &url, &params)
            .await
            .with_context(|| format!("Account lookup failed for @{handle}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Account lookup for @{handle} returned {status}: {body}");
        }

        let user: WireUser = response
            .json()
            .await
            .with_context(|| format!("Failed to decode account @{handle}"))?;
        Ok(user.id)
    }

    async fn post_action(&self, verb: &str, item_id: u64) -> Result<(), ActionError> {
        let url = format!("{}/statuses/{verb}/{item_id}.json", self.base_url);
        let params = [("trim_user", "true".to_string())];

        debug!(verb, item_id, "Action request");

        let response = self
            .send(&self.action_limiter, Method::POST, &url, &params)
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(classify_action_error(status, &body))
    }
}

#[async_trait]
impl FeedSource for ApiClient {
    async fn fetch_page(
        &self,
        account_id: u64,
        max_id: Option<u64>,
        since_id: u64,
        count: u32,
    ) -> Result<Vec<FeedItem>, FetchError> {
        let url = format!("{}/statuses/user_timeline.json", self.base_url);

        let mut params: Vec<(&str, String)> = vec![
            ("user_id", account_id.to_string()),
            ("count", count.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("trim_user", "true".to_string()),
            ("include_rts", "true".to_string()),
            ("exclude_replies", "false".to_string()),
            ("tweet_mode", "extended".to_string()),
        ];
        if since_id > 0 {
            params.push(("since_id", since_id.to_string()));
        }
        if let Some(max_id) = max_id {
            params.push(("max_id", max_id.to_string()));
        }

        debug!(account_id, ?max_id, since_id, count, "Timeline request");

        let response = self
            .send(&self.read_limiter, Method::GET, &url, &params)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let info = RateLimitInfo::from_headers(response.headers());
            if let Some(retry_after) = suggested_delay(status.as_u16(), &info, Utc::now()) {
                return Err(FetchError::RateLimited {
                    status: status.as_u16(),
                    retry_after,
                });
            }
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: Vec<WireItem> = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(page.into_iter().map(FeedItem::from).collect())
    }
}

#[async_trait]
impl Amplifier for ApiClient {
    async fn amplify(&self, item_id: u64) -> Result<(), ActionError> {
        self.post_action("retweet", item_id).await
    }

    async fn unamplify(&self, item_id: u64) -> Result<(), ActionError> {
        self.post_action("unretweet", item_id).await
    }
}

/// Map a failed action response onto the soft/hard taxonomy.
///
/// The status code alone is not reliable (both soft cases come back as 403),
/// so the error codes in the body decide. A body that is not the expected
/// error envelope is a hard failure carrying the raw text.
pub fn classify_action_error(status: u16, body: &str) -> ActionError {
    let errors = serde_json::from_str::<WireErrorBody>(body)
        .map(|b| b.errors)
        .unwrap_or_default();

    if errors.iter().any(|e| e.code == CODE_ALREADY_AMPLIFIED) {
        return ActionError::AlreadyDone;
    }
    if errors.iter().any(|e| e.code == CODE_NOT_PERMITTED) {
        return ActionError::NotPermitted;
    }

    let message = errors
        .into_iter()
        .next()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .unwrap_or_else(|| body.to_string());
    ActionError::Failed { status, message }
}

/// Parse an API timestamp, accepting RFC 3339 as well.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// -- Serde types for the timeline --

/// A timeline entry as returned by `statuses/user_timeline`.
#[derive(Debug, Deserialize)]
pub struct WireItem {
    pub id: u64,
    pub created_at: String,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub retweeted_status: Option<WireReference>,
    #[serde(default)]
    pub quoted_status_id: Option<u64>,
    /// Whether the authenticated account has reposted this entry.
    #[serde(default)]
    pub retweeted: bool,
    #[serde(default)]
    pub entities: Option<WireEntities>,
    #[serde(default)]
    pub extended_entities: Option<WireEntities>,
}

/// Reference to a reposted original. Only the id is kept.
#[derive(Debug, Deserialize)]
pub struct WireReference {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct WireEntities {
    #[serde(default)]
    pub media: Option<Vec<WireMedia>>,
}

#[derive(Debug, Deserialize)]
pub struct WireMedia {
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<WireItem> for FeedItem {
    fn from(wire: WireItem) -> Self {
        let kinds = |media: Vec<WireMedia>| {
            media
                .iter()
                .map(|m| MediaKind::from_api(&m.kind))
                .collect::<Vec<_>>()
        };

        // Plain entities only count when they actually carry media.
        let media = wire
            .entities
            .and_then(|e| e.media)
            .filter(|m| !m.is_empty())
            .map(kinds);
        let extended_media = wire
            .extended_entities
            .map(|e| kinds(e.media.unwrap_or_default()));

        FeedItem {
            id: wire.id,
            created_at: parse_timestamp(&wire.created_at),
            text: wire.full_text.or(wire.text).unwrap_or_default(),
            reposted_id: wire.retweeted_status.map(|r| r.id),
            quoted_id: wire.quoted_status_id,
            media,
            extended_media,
            amplified_by_us: wire.retweeted,
        }
    }
}

#[derive(Deserialize)]
struct WireUser {
    id: u64,
}

#[derive(Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    errors: Vec<WireError>,
}

#[derive(Deserialize)]
struct WireError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        // Accepts the connection and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let client = ApiClient::with_timeout(
            &format!("http://{addr}"),
            Credentials::Bearer("t".to_string()),
            Duration::from_millis(200),
        )
        .unwrap();

        let started = Instant::now();
        let result = client.resolve_account("someone").await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(10));

        server.abort();
    }

    #[tokio::test]
    async fn test_reads_do_not_spend_action_budget() {
        let client =
            ApiClient::new(DEFAULT_API_URL, Credentials::Bearer("t".to_string())).unwrap();
        for _ in 0..READS_PER_WINDOW {
            client.read_limiter.acquire().await;
        }

        // Read window is full; actions still go through right away.
        tokio::time::timeout(Duration::from_millis(500), client.action_limiter.acquire())
            .await
            .expect("action limiter should be independent of reads");
        assert!(
            tokio::time::timeout(Duration::from_millis(50), client.read_limiter.acquire())
                .await
                .is_err()
        );
    }

    #[test]
    fn test_default_timeout_is_bounded() {
        assert!(REQUEST_TIMEOUT > Duration::ZERO);
        assert!(REQUEST_TIMEOUT <= Duration::from_secs(60));
    }
}
