use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::feed::{Credentials, OAuth1Credentials};
use crate::pipeline::LoaderConfig;

/// Central configuration loaded from environment variables.
///
/// Credentials come from the environment only (never flags), so they stay
/// out of shell history. The .env file is loaded at startup via dotenvy.
pub struct Config {
    /// Feed API base URL (defaults to the v1.1 REST endpoint).
    pub api_url: String,
    /// App-only bearer token. Read-only; used when no OAuth keys are set.
    pub api_token: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub db_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only credentials lack defaults; `init`, `check` and `status` work
    /// without them.
    pub fn load() -> Result<Self> {
        let db_path = match env::var("AMPLIFIER_DB_PATH") {
            Ok(path) if !path.is_empty() => path,
            _ => default_db_path().to_string_lossy().into_owned(),
        };

        Ok(Self {
            api_url: env::var("FEED_API_URL")
                .unwrap_or_else(|_| crate::feed::client::DEFAULT_API_URL.to_string()),
            api_token: env::var("FEED_API_TOKEN").unwrap_or_default(),
            consumer_key: env::var("FEED_CONSUMER_KEY").unwrap_or_default(),
            consumer_secret: env::var("FEED_CONSUMER_SECRET").unwrap_or_default(),
            access_token: env::var("FEED_ACCESS_TOKEN").unwrap_or_default(),
            access_token_secret: env::var("FEED_ACCESS_TOKEN_SECRET").unwrap_or_default(),
            db_path,
        })
    }

    /// Pick the credentials to sign requests with.
    ///
    /// All four OAuth values → user context (needed for reposting). None of
    /// them → the bearer token, if set. A partial OAuth set is an error
    /// rather than a silent fallback.
    pub fn credentials(&self) -> Result<Credentials> {
        let oauth = [
            ("FEED_CONSUMER_KEY", &self.consumer_key),
            ("FEED_CONSUMER_SECRET", &self.consumer_secret),
            ("FEED_ACCESS_TOKEN", &self.access_token),
            ("FEED_ACCESS_TOKEN_SECRET", &self.access_token_secret),
        ];
        let missing: Vec<&str> = oauth
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            return Ok(Credentials::OAuth1(OAuth1Credentials {
                consumer_key: self.consumer_key.clone(),
                consumer_secret: self.consumer_secret.clone(),
                access_token: self.access_token.clone(),
                access_token_secret: self.access_token_secret.clone(),
            }));
        }
        if missing.len() < oauth.len() {
            anyhow::bail!(
                "Incomplete OAuth credentials, missing: {}.\n\
                 See .env.example for the required variables.",
                missing.join(", ")
            );
        }
        if !self.api_token.is_empty() {
            return Ok(Credentials::Bearer(self.api_token.clone()));
        }
        anyhow::bail!(
            "No feed API credentials. Set FEED_CONSUMER_KEY, FEED_CONSUMER_SECRET,\n\
             FEED_ACCESS_TOKEN and FEED_ACCESS_TOKEN_SECRET in your .env file.\n\
             See .env.example for the required variables."
        )
    }
}

/// Default checkpoint database location: `<data dir>/amplifier/checkpoints.db`,
/// falling back to the working directory when the platform has no data dir.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("amplifier"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("checkpoints.db")
}

/// Timing and paging knobs shared by every target.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Upper bound on a single cycle.
    pub timeout: Duration,
    pub loader: LoaderConfig,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10 * 60),
            timeout: Duration::from_secs(5 * 60),
            loader: LoaderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_db_path_file_name() {
        let path = default_db_path();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("checkpoints.db")
        );
        assert!(path
            .parent()
            .is_some_and(|p| p.ends_with("amplifier") || p == std::path::Path::new(".")));
    }

    fn empty_config() -> Config {
        Config {
            api_url: "http://localhost".to_string(),
            api_token: String::new(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            db_path: "./test.db".to_string(),
        }
    }

    #[test]
    fn test_no_credentials_is_an_error() {
        assert!(empty_config().credentials().is_err());
    }

    #[test]
    fn test_bearer_used_without_oauth_keys() {
        let config = Config {
            api_token: "secret".to_string(),
            ..empty_config()
        };
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::Bearer("secret".to_string())
        );
    }

    #[test]
    fn test_full_oauth_set_wins_over_bearer() {
        let config = Config {
            api_token: "secret".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            access_token: "at".to_string(),
            access_token_secret: "ats".to_string(),
            ..empty_config()
        };
        let creds = config.credentials().unwrap();
        assert!(creds.has_user_context());
    }

    #[test]
    fn test_partial_oauth_set_names_missing_values() {
        let config = Config {
            api_token: "secret".to_string(),
            consumer_key: "ck".to_string(),
            access_token: "at".to_string(),
            ..empty_config()
        };
        let err = config.credentials().unwrap_err().to_string();
        assert!(err.contains("FEED_CONSUMER_SECRET"));
        assert!(err.contains("FEED_ACCESS_TOKEN_SECRET"));
        assert!(!err.contains("FEED_CONSUMER_KEY"));
    }

    #[test]
    fn test_cycle_settings_defaults() {
        let settings = CycleSettings::default();
        assert_eq!(settings.interval, Duration::from_secs(600));
        assert_eq!(settings.timeout, Duration::from_secs(300));
        assert_eq!(settings.loader.page_size, 200);
        assert_eq!(settings.loader.max_pages, 16);
    }
}
