//! Client configuration: built-in defaults, overlaid by environment, overlaid by CLI flags.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://yumemi-frontend-engineer-codecheck-api.vercel.app/api/v1";

pub const ENV_API_KEY: &str = "PREFPOP_API_KEY";
pub const ENV_BASE_URL: &str = "PREFPOP_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "PREFPOP_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `X-API-KEY` when present.
    pub api_key: Option<String>,
    /// Total per-request timeout. A hung request ends as an error after this.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("prefpop/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `PREFPOP_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup. Blank or unparsable values are ignored.
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        match get(ENV_TIMEOUT_SECS).map(|s| s.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => self.timeout = Duration::from_secs(secs),
            Some(_) => log::warn!("ignoring invalid {ENV_TIMEOUT_SECS}"),
            None => {}
        }
        self
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = ClientConfig::default().with_lookup(lookup(&[
            (ENV_API_KEY, "secret"),
            (ENV_BASE_URL, "http://localhost:8080/api/"),
            (ENV_TIMEOUT_SECS, "5"),
        ]));
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.base(), "http://localhost:8080/api");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_and_invalid_values_keep_defaults() {
        let cfg = ClientConfig::default().with_lookup(lookup(&[
            (ENV_API_KEY, "  "),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert_eq!(cfg, ClientConfig::default());
    }
}
