// Request authorization for the feed API.
//
// Reposting needs user context, so the normal setup is OAuth 1.0a
// (HMAC-SHA1) with consumer and access credentials. A bare bearer token is
// still accepted for read-only deployments and API-compatible services.
//
// Signing (RFC 5849 §3.4):
//   params  = query params + oauth_* params, each key and value
//             percent-encoded, sorted, joined as k=v with '&'
//   base    = METHOD & enc(url without query) & enc(params)
//   key     = enc(consumer_secret) & enc(token_secret)
//   sig     = base64(hmac_sha1(key, base))

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;
use reqwest::Method;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Everything but the RFC 3986 unreserved characters gets encoded.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// User-context OAuth 1.0a credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

/// How requests are authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// App-only token. Enough for reading timelines, not for reposting.
    Bearer(String),
    OAuth1(OAuth1Credentials),
}

impl Credentials {
    /// Whether these credentials can repost on behalf of a user.
    pub fn has_user_context(&self) -> bool {
        matches!(self, Credentials::OAuth1(_))
    }

    /// `Authorization` header value for one request. `params` are the query
    /// parameters the request will carry.
    pub fn authorization(&self, method: &Method, url: &str, params: &[(&str, String)]) -> String {
        match self {
            Credentials::Bearer(token) => format!("Bearer {token}"),
            Credentials::OAuth1(creds) => {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                let mut nonce_bytes = [0u8; 16];
                rand::rng().fill_bytes(&mut nonce_bytes);
                oauth1_header(
                    creds,
                    method,
                    url,
                    params,
                    &hex::encode(nonce_bytes),
                    timestamp,
                )
            }
        }
    }
}

/// Build a signed `OAuth ...` header with a fixed nonce and timestamp.
pub fn oauth1_header(
    creds: &OAuth1Credentials,
    method: &Method,
    url: &str,
    params: &[(&str, String)],
    nonce: &str,
    timestamp: u64,
) -> String {
    let timestamp = timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", creds.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", creds.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut all: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
    all.extend(oauth_params.iter().copied());
    let base = signature_base(method, url, &all);
    let signature = sign(&creds.consumer_secret, &creds.access_token_secret, &base);

    oauth_params.push(("oauth_signature", signature.as_str()));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {fields}")
}

/// The signature base string for a request.
pub fn signature_base(method: &Method, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str(),
        encode(url),
        encode(&param_string)
    )
}

/// HMAC-SHA1 over the base string, base64-encoded.
pub fn sign(consumer_secret: &str, token_secret: &str, base: &str) -> String {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC takes keys of any length");
    mac.update(base.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE).to_string()
}
