//! Blocking client for the prefecture population API.
//!
//! Two endpoints are consumed:
//! - `GET /prefectures` for the reference list of selectable prefectures
//! - `GET /population/composition/perYear?prefCode=..&cityCode=-` for one prefecture's
//!   full population composition (one series per category label)
//!
//! Every request is a single attempt bounded by the configured timeouts; nothing is
//! retried.
//!
//! Typical usage:
//! ```no_run
//! # use prefpop::{Client, ClientConfig};
//! # use prefpop::api::PopulationSource;
//! let client = Client::new(ClientConfig::from_env())?;
//! let prefectures = client.prefectures()?;
//! let tokyo = client.composition(13)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::models::{ApiResponse, PopulationComposition, Prefecture};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;

/// Where prefecture lists and population compositions come from.
///
/// Implemented by [`Client`] for the live API; tests plug in in-memory sources.
/// `Sync` because category refreshes fetch from several threads at once.
pub trait PopulationSource: Sync {
    fn prefectures(&self) -> Result<Vec<Prefecture>, FetchError>;
    fn composition(&self, pref_code: u32) -> Result<PopulationComposition, FetchError>;
}

impl<S: PopulationSource + ?Sized> PopulationSource for &S {
    fn prefectures(&self) -> Result<Vec<Prefecture>, FetchError> {
        (**self).prefectures()
    }

    fn composition(&self, pref_code: u32) -> Result<PopulationComposition, FetchError> {
        (**self).composition(pref_code)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: HttpClient,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref() {
            let mut value = HeaderValue::from_str(key).map_err(FetchError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert("x-api-key", value);
        }
        let http = HttpClient::builder()
            .timeout(config.timeout) // total request timeout
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(5))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `path` and unwrap the `{ message, result }` envelope.
    fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.config.base(), path);
        log::debug!("GET {url} {query:?}");

        let resp = self.http.get(&url).query(query).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }
        let body = resp.bytes()?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
        match envelope {
            ApiResponse {
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { message, .. } => Err(FetchError::Api(
                message.unwrap_or_else(|| "response carried no result".into()),
            )),
        }
    }
}

impl PopulationSource for Client {
    fn prefectures(&self) -> Result<Vec<Prefecture>, FetchError> {
        self.get_result("/prefectures", &[])
    }

    fn composition(&self, pref_code: u32) -> Result<PopulationComposition, FetchError> {
        self.get_result(
            "/population/composition/perYear",
            &[("prefCode", pref_code.to_string()), ("cityCode", "-".into())],
        )
    }
}
